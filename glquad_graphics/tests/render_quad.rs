//! Draws a quad for real and reads the pixels back. Needs a machine that can give out an OpenGL
//! 3.3 core context without a window; where it can't, the test says so and passes.

use glutin::dpi::PhysicalSize;
use glutin::event_loop::EventLoop;
use glutin::{Api, Context, ContextBuilder, GlProfile, GlRequest, PossiblyCurrent};

use graphics::{
    Framebuffer, GlContext, GlDriver, IndexBuffer, Renderer, ShaderProgram, ShaderProgramSource,
    VertexArray, VertexBuffer, VertexLayout,
};

const SIZE: u32 = 64;

const SHADER: &str = "#shader vertex
#version 330 core
layout(location = 0) in vec2 position;
void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}

#shader fragment
#version 330 core
layout(location = 0) out vec4 color;
uniform vec4 u_Color;
void main() {
    color = u_Color;
}
";

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

#[cfg(target_os = "linux")]
fn event_loop() -> EventLoop<()> {
    use winit::platform::unix::EventLoopExtUnix;
    EventLoop::new_any_thread()
}

#[cfg(not(target_os = "linux"))]
fn event_loop() -> EventLoop<()> {
    EventLoop::new()
}

fn headless_context() -> Option<(EventLoop<()>, Context<PossiblyCurrent>)> {
    // winit panics rather than erroring when there's no display server at all
    let event_loop = std::panic::catch_unwind(event_loop).ok()?;

    let context = ContextBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGl, (3, 3)))
        .with_gl_profile(GlProfile::Core)
        .build_headless(&event_loop, PhysicalSize::new(SIZE, SIZE))
        .map_err(|e| eprintln!("no headless context: {}", e))
        .ok()?;

    let context = unsafe { context.make_current() }
        .map_err(|(_, e)| eprintln!("could not make context current: {}", e))
        .ok()?;

    Some((event_loop, context))
}

#[test]
fn quad_is_drawn_inside_its_bounds_only() {
    let (_event_loop, context) = match headless_context() {
        Some(c) => c,
        None => {
            eprintln!("skipping: no OpenGL 3.3 context available");
            return;
        }
    };

    let driver = unsafe { GlDriver::load_with(|s| context.get_proc_address(s)) }.unwrap();
    let gl = GlContext::new(driver);

    let fb = Framebuffer::new(&gl, SIZE, SIZE).unwrap();

    let positions = [
        -0.5f32, -0.5,
         0.5, -0.5,
         0.5,  0.5,
        -0.5,  0.5,
    ];
    let vb = VertexBuffer::new(&gl, &positions).unwrap();
    let mut layout = VertexLayout::new();
    layout.push::<f32>(2);
    let mut va = VertexArray::new(&gl).unwrap();
    va.add_buffer(&vb, &layout);
    let ib = IndexBuffer::new(&gl, &[0, 1, 2, 2, 3, 0]).unwrap();

    let mut program = ShaderProgram::new(&gl, &ShaderProgramSource::parse(SHADER)).unwrap();
    program.bind();
    program.set_uniform_4f("u_Color", 1.0, 0.5, 0.0, 1.0).unwrap();

    let renderer = Renderer::new(&gl);
    renderer.set_clear_color([0.0, 0.0, 0.0, 1.0]);
    renderer.clear();
    renderer.draw(&va, &ib, &program);

    let centre = fb.pixel(SIZE / 2, SIZE / 2).unwrap();
    assert_ne!(centre, BACKGROUND);
    assert_eq!(centre[0], 255);

    // The quad covers the middle half in each direction
    let outside = [
        (2, 2),
        (SIZE - 3, 2),
        (2, SIZE - 3),
        (SIZE - 3, SIZE - 3),
        (SIZE / 2, 4),
        (4, SIZE / 2),
    ];
    for &(x, y) in outside.iter() {
        assert_eq!(fb.pixel(x, y), Some(BACKGROUND), "pixel ({}, {})", x, y);
    }
}
