use std::cell::Cell;

use gl;
use gl::types::*;
use log::debug;

use crate::context::{GlContext, Target};
use crate::error::{GraphicsError, ResourceKind, Result};

/// An offscreen render target with one RGBA8 colour attachment. Drawing into it instead of the
/// window lets the result be read back, which is how rendering gets checked without a display.
#[derive(Debug)]
pub struct Framebuffer {
    gl: GlContext,
    id: GLuint,
    color: GLuint,
    width: u32,
    height: u32,
    /// Viewport to put back on unbind, saved when this framebuffer gets bound.
    window_viewport: Cell<Option<[GLint; 4]>>,
}

impl Framebuffer {
    /// Creates the framebuffer and its colour renderbuffer. Leaves the framebuffer bound.
    pub fn new(gl: &GlContext, width: u32, height: u32) -> Result<Self> {
        let id = gl_call!(gl, gen_framebuffer());
        if id == 0 {
            return Err(GraphicsError::Creation(ResourceKind::Framebuffer));
        }
        let color = gl_call!(gl, gen_renderbuffer());
        if color == 0 {
            gl_call!(gl, delete_framebuffer(id));
            return Err(GraphicsError::Creation(ResourceKind::Renderbuffer));
        }

        let framebuffer = Self {
            gl: gl.clone(),
            id,
            color,
            width,
            height,
            window_viewport: Cell::new(None),
        };

        gl.bind(Target::Renderbuffer, color);
        gl_call!(
            gl,
            renderbuffer_storage(gl::RENDERBUFFER, gl::RGBA8, width as GLsizei, height as GLsizei)
        );
        gl.unbind(Target::Renderbuffer);

        framebuffer.bind();
        gl_call!(
            gl,
            framebuffer_renderbuffer(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::RENDERBUFFER,
                color
            )
        );

        let status = gl_call!(gl, check_framebuffer_status(gl::FRAMEBUFFER));
        if status != gl::FRAMEBUFFER_COMPLETE {
            return Err(GraphicsError::IncompleteFramebuffer(status));
        }

        debug!("Created {}x{} framebuffer {}", width, height, id);
        Ok(framebuffer)
    }

    pub fn id(&self) -> GLuint { self.id }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    /// Makes this the draw and read target, with the viewport covering all of it.
    pub fn bind(&self) {
        if self.gl.bound(Target::Framebuffer) != Some(self.id) {
            self.window_viewport.set(Some(gl_call!(self.gl, get_viewport())));
        }
        self.gl.bind(Target::Framebuffer, self.id);
        gl_call!(self.gl, viewport(0, 0, self.width as GLsizei, self.height as GLsizei));
    }

    /// Goes back to drawing to the window, with the viewport it had before [`bind`](Self::bind).
    pub fn unbind(&self) {
        self.gl.unbind(Target::Framebuffer);
        self.restore_viewport();
    }

    fn restore_viewport(&self) {
        if let Some([x, y, width, height]) = self.window_viewport.take() {
            gl_call!(self.gl, viewport(x, y, width, height));
        }
    }

    /// Every pixel as RGBA bytes, bottom row first.
    pub fn read_pixels(&self) -> Vec<u8> {
        self.bind();
        gl_call!(self.gl, read_pixels(0, 0, self.width as GLsizei, self.height as GLsizei))
    }

    /// The RGBA value at `(x, y)`, counting from the bottom left. `None` outside the framebuffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let pixels = self.read_pixels();
        let start = ((y * self.width + x) * 4) as usize;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(pixels.get(start..start + 4)?);
        Some(rgba)
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if self.gl.bound(Target::Framebuffer) == Some(self.id) {
            self.restore_viewport();
        }
        self.gl.forget(self.id, &[Target::Framebuffer]);
        gl_call!(self.gl, delete_framebuffer(self.id));
        gl_call!(self.gl, delete_renderbuffer(self.color));
    }
}
