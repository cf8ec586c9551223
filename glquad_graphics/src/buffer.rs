use std::mem::size_of;

use bytemuck::Pod;
use gl;
use gl::types::*;
use log::debug;

use crate::context::{GlContext, Target};
use crate::error::{GraphicsError, ResourceKind, Result};

/// The binding point a buffer is created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Array = gl::ARRAY_BUFFER as isize,
    Element = gl::ELEMENT_ARRAY_BUFFER as isize,
}

impl From<BufferTarget> for Target {
    fn from(target: BufferTarget) -> Self {
        match target {
            BufferTarget::Array => Target::ArrayBuffer,
            BufferTarget::Element => Target::ElementArrayBuffer,
        }
    }
}

/// A block of memory on the graphics card. Which binding point it lives on is fixed at creation;
/// [`VertexBuffer`] and [`IndexBuffer`] are the two flavours this crate uses.
#[derive(Debug)]
pub struct GpuBuffer {
    gl: GlContext,
    id: GLuint,
    target: BufferTarget,
    len: usize,
}

impl GpuBuffer {
    /// Allocates a buffer on `target` and uploads `data` into it as static draw data. Leaves the
    /// new buffer bound.
    pub fn new<T: Pod>(gl: &GlContext, target: BufferTarget, data: &[T]) -> Result<Self> {
        let id = gl_call!(gl, gen_buffer());
        if id == 0 {
            return Err(GraphicsError::Creation(ResourceKind::Buffer));
        }

        let buffer = Self {
            gl: gl.clone(),
            id,
            target,
            len: data.len() * size_of::<T>(),
        };

        buffer.bind();
        gl_call!(gl, buffer_data(target as GLenum, bytemuck::cast_slice(data), gl::STATIC_DRAW));
        debug!("Uploaded {} bytes to buffer {} ({:?})", buffer.len, id, target);

        Ok(buffer)
    }

    pub fn id(&self) -> GLuint { self.id }

    pub fn target(&self) -> BufferTarget { self.target }

    /// Size of the uploaded data in bytes.
    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn bind(&self) {
        self.gl.bind(self.target.into(), self.id);
    }

    /// Clears this buffer's binding point, whichever buffer is on it.
    pub fn unbind(&self) {
        self.gl.unbind(self.target.into());
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.gl.forget(self.id, &[self.target.into()]);
        gl_call!(self.gl, delete_buffer(self.id));
    }
}

/// Vertex data, read through a [`VertexArray`](crate::VertexArray).
#[derive(Debug)]
pub struct VertexBuffer {
    buffer: GpuBuffer,
}

impl VertexBuffer {
    pub fn new<T: Pod>(gl: &GlContext, data: &[T]) -> Result<Self> {
        Ok(Self {
            buffer: GpuBuffer::new(gl, BufferTarget::Array, data)?,
        })
    }

    pub fn id(&self) -> GLuint { self.buffer.id() }

    pub fn len(&self) -> usize { self.buffer.len() }

    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }

    pub fn bind(&self) { self.buffer.bind() }

    pub fn unbind(&self) { self.buffer.unbind() }
}

/// A list of vertex indices. Lets a shape reuse vertices: a quad is four vertices and six indices
/// rather than six vertices.
#[derive(Debug)]
pub struct IndexBuffer {
    buffer: GpuBuffer,
    count: usize,
}

impl IndexBuffer {
    pub fn new(gl: &GlContext, indices: &[u32]) -> Result<Self> {
        Ok(Self {
            buffer: GpuBuffer::new(gl, BufferTarget::Element, indices)?,
            count: indices.len(),
        })
    }

    pub fn id(&self) -> GLuint { self.buffer.id() }

    /// Number of indices, which is what a draw call is sized by.
    pub fn count(&self) -> usize { self.count }

    pub fn bind(&self) { self.buffer.bind() }

    pub fn unbind(&self) { self.buffer.unbind() }
}
