//! A small set of safe wrappers around the OpenGL API.
//!
//! Drawing even a single quad with raw OpenGL takes a pile of cryptic, unsafe, stateful calls.
//! This crate puts each kind of GPU object (buffers, vertex arrays, shader programs, offscreen
//! framebuffers) behind a type that creates it in its constructor and deletes it on drop, checks
//! the driver's error queue after every call, and routes every bind through one table of what's
//! currently bound, so "which program is current?" is a question with an answer.
//!
//! A frame looks like this:
//!
//! ```ignore
//! let gl = GlContext::new(unsafe { GlDriver::load_with(|s| context.get_proc_address(s))? });
//!
//! let vb = VertexBuffer::new(&gl, &positions)?;
//! let mut layout = VertexLayout::new();
//! layout.push::<f32>(3);
//! let mut va = VertexArray::new(&gl)?;
//! va.add_buffer(&vb, &layout);
//! let ib = IndexBuffer::new(&gl, &[0, 1, 2, 2, 3, 0])?;
//! let mut program = ShaderProgram::from_file(&gl, "res/shaders/basic.shader")?;
//!
//! let renderer = Renderer::new(&gl);
//! renderer.clear();
//! program.bind();
//! program.set_uniform_4f("u_Color", 0.2, 0.3, 0.8, 1.0)?;
//! renderer.draw(&va, &ib, &program);
//! ```
//!
//! Some resources I found helpful: [Learn OpenGL](https://learnopengl.com/) and
//! [docs.gl](http://docs.gl/) for the API reference.

#[macro_use]
pub mod error;

pub mod buffer;
pub mod context;
pub mod driver;
pub mod framebuffer;
pub mod layout;
pub mod renderer;
pub mod shader;
pub mod vertex_array;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use buffer::{BufferTarget, GpuBuffer, IndexBuffer, VertexBuffer};
pub use context::{BindingTable, GlContext, Target};
pub use driver::{GlApi, GlDriver};
pub use error::{DriverError, GraphicsError, ResourceKind, Result};
pub use framebuffer::Framebuffer;
pub use layout::{ElementType, VertexAttribute, VertexElement, VertexLayout};
pub use renderer::Renderer;
pub use shader::{compile, Shader, ShaderKind, ShaderProgram, ShaderProgramSource, Uniform};
pub use vertex_array::VertexArray;
