//! The OpenGL function table.
//!
//! Everything above this module talks to the graphics driver through [`GlApi`], never through the
//! `gl` crate directly. [`GlDriver`] is the real implementation: it forwards each method to the
//! function pointers loaded by [`gl::load_with`]. The trait exists so the wrappers can be driven
//! by something other than a live context (see `MockDriver` behind the `mock` feature), which is
//! how the bind/draw/uniform bookkeeping gets tested without a GPU.
//!
//! Only the handful of entry points this crate needs are here. The methods are safe to call
//! because the `unsafe` obligation (a current context with loaded pointers) is discharged once,
//! in [`GlDriver::load_with`].

use std::ffi::{c_void, CStr, CString};

use gl;
use gl::types::*;

use crate::error::{GraphicsError, Result};

pub trait GlApi {
    // Errors
    fn get_error(&self) -> GLenum;
    fn get_string(&self, name: GLenum) -> String;

    // Buffers
    fn gen_buffer(&self) -> GLuint;
    fn delete_buffer(&self, id: GLuint);
    fn bind_buffer(&self, target: GLenum, id: GLuint);
    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);

    // Vertex arrays
    fn gen_vertex_array(&self) -> GLuint;
    fn delete_vertex_array(&self, id: GLuint);
    fn bind_vertex_array(&self, id: GLuint);
    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );

    // Shaders and programs
    fn create_shader(&self, kind: GLenum) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint;
    fn get_shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);
    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn validate_program(&self, program: GLuint);
    fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint;
    fn get_program_info_log(&self, program: GLuint) -> String;
    fn delete_program(&self, program: GLuint);
    fn use_program(&self, program: GLuint);

    // Uniforms
    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint;
    fn uniform_1i(&self, location: GLint, value: GLint);
    fn uniform_1f(&self, location: GLint, value: GLfloat);
    fn uniform_4f(&self, location: GLint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat);
    fn uniform_matrix_4fv(&self, location: GLint, transpose: bool, value: &[GLfloat; 16]);

    // Framebuffers
    fn gen_framebuffer(&self) -> GLuint;
    fn delete_framebuffer(&self, id: GLuint);
    fn bind_framebuffer(&self, target: GLenum, id: GLuint);
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    );
    fn gen_renderbuffer(&self) -> GLuint;
    fn delete_renderbuffer(&self, id: GLuint);
    fn bind_renderbuffer(&self, target: GLenum, id: GLuint);
    fn renderbuffer_storage(&self, target: GLenum, format: GLenum, width: GLsizei, height: GLsizei);
    fn read_pixels(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> Vec<u8>;

    // Pipeline state and drawing
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    /// `[x, y, width, height]` of the current viewport.
    fn get_viewport(&self) -> [GLint; 4];
    fn enable(&self, capability: GLenum);
    fn blend_func(&self, source: GLenum, destination: GLenum);
    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
    fn clear(&self, mask: GLbitfield);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize);
}

/// The live driver, backed by the `gl` crate's global function pointers.
pub struct GlDriver {
    _loaded: (),
}

impl GlDriver {
    /// Loads the OpenGL function table through `loader` (typically the windowing library's
    /// `get_proc_address`) and checks that every entry point this crate calls was found.
    ///
    /// # Safety
    ///
    /// The context the loader belongs to must be current on this thread, and must stay current
    /// for as long as the returned driver (or anything built from it) is used.
    pub unsafe fn load_with<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let required = [
            ("glGetError", gl::GetError::is_loaded()),
            ("glGenBuffers", gl::GenBuffers::is_loaded()),
            ("glBufferData", gl::BufferData::is_loaded()),
            ("glGenVertexArrays", gl::GenVertexArrays::is_loaded()),
            ("glVertexAttribPointer", gl::VertexAttribPointer::is_loaded()),
            ("glCreateShader", gl::CreateShader::is_loaded()),
            ("glCreateProgram", gl::CreateProgram::is_loaded()),
            ("glGetUniformLocation", gl::GetUniformLocation::is_loaded()),
            ("glUniformMatrix4fv", gl::UniformMatrix4fv::is_loaded()),
            ("glGenFramebuffers", gl::GenFramebuffers::is_loaded()),
            ("glGetIntegerv", gl::GetIntegerv::is_loaded()),
            ("glDrawElements", gl::DrawElements::is_loaded()),
        ];

        match required.iter().find(|(_, loaded)| !loaded) {
            Some((name, _)) => Err(GraphicsError::DriverLoad(*name)),
            None => Ok(Self { _loaded: () }),
        }
    }
}

fn gl_bool(b: bool) -> GLboolean {
    if b { gl::TRUE } else { gl::FALSE }
}

/// Turns an info log buffer written by the driver into a `String`, dropping the NUL terminator and
/// anything past what was actually written.
fn info_log_to_string(mut buf: Vec<u8>, written: GLsizei) -> String {
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

impl GlApi for GlDriver {
    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn get_string(&self, name: GLenum) -> String {
        unsafe {
            let ptr = gl::GetString(name);
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr as *const GLchar).to_string_lossy().into_owned()
        }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        id
    }

    fn delete_buffer(&self, id: GLuint) {
        unsafe { gl::DeleteBuffers(1, &id) }
    }

    fn bind_buffer(&self, target: GLenum, id: GLuint) {
        unsafe { gl::BindBuffer(target, id) }
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                usage,
            )
        }
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        id
    }

    fn delete_vertex_array(&self, id: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &id) }
    }

    fn bind_vertex_array(&self, id: GLuint) {
        unsafe { gl::BindVertexArray(id) }
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        unsafe {
            gl::VertexAttribPointer(
                index,
                size,
                kind,
                gl_bool(normalized),
                stride,
                offset as *const c_void,
            )
        }
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        unsafe { gl::CreateShader(kind) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        // Passing the length means the source doesn't need to be NUL-terminated
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader, 1, &ptr, &len) }
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { gl::GetShaderiv(shader, pname, &mut value) };
        value
    }

    fn get_shader_info_log(&self, shader: GLuint) -> String {
        let len = self.get_shader_iv(shader, gl::INFO_LOG_LENGTH);
        let mut buf = vec![0u8; len.max(1) as usize];
        let mut written = 0;
        unsafe {
            gl::GetShaderInfoLog(shader, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
        }
        info_log_to_string(buf, written)
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn validate_program(&self, program: GLuint) {
        unsafe { gl::ValidateProgram(program) }
    }

    fn get_program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { gl::GetProgramiv(program, pname, &mut value) };
        value
    }

    fn get_program_info_log(&self, program: GLuint) -> String {
        let len = self.get_program_iv(program, gl::INFO_LOG_LENGTH);
        let mut buf = vec![0u8; len.max(1) as usize];
        let mut written = 0;
        unsafe {
            gl::GetProgramInfoLog(program, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
        }
        info_log_to_string(buf, written)
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        // A name with an interior NUL can't name any uniform
        match CString::new(name) {
            Ok(name) => unsafe { gl::GetUniformLocation(program, name.as_ptr()) },
            Err(_) => -1,
        }
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        unsafe { gl::Uniform1i(location, value) }
    }

    fn uniform_1f(&self, location: GLint, value: GLfloat) {
        unsafe { gl::Uniform1f(location, value) }
    }

    fn uniform_4f(&self, location: GLint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat) {
        unsafe { gl::Uniform4f(location, x, y, z, w) }
    }

    fn uniform_matrix_4fv(&self, location: GLint, transpose: bool, value: &[GLfloat; 16]) {
        unsafe { gl::UniformMatrix4fv(location, 1, gl_bool(transpose), value.as_ptr()) }
    }

    fn gen_framebuffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenFramebuffers(1, &mut id) };
        id
    }

    fn delete_framebuffer(&self, id: GLuint) {
        unsafe { gl::DeleteFramebuffers(1, &id) }
    }

    fn bind_framebuffer(&self, target: GLenum, id: GLuint) {
        unsafe { gl::BindFramebuffer(target, id) }
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        unsafe { gl::CheckFramebufferStatus(target) }
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    ) {
        unsafe {
            gl::FramebufferRenderbuffer(target, attachment, renderbuffer_target, renderbuffer)
        }
    }

    fn gen_renderbuffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenRenderbuffers(1, &mut id) };
        id
    }

    fn delete_renderbuffer(&self, id: GLuint) {
        unsafe { gl::DeleteRenderbuffers(1, &id) }
    }

    fn bind_renderbuffer(&self, target: GLenum, id: GLuint) {
        unsafe { gl::BindRenderbuffer(target, id) }
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        unsafe { gl::RenderbufferStorage(target, format, width, height) }
    }

    fn read_pixels(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> Vec<u8> {
        let mut pixels = vec![0u8; (width.max(0) * height.max(0) * 4) as usize];
        unsafe {
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::ReadPixels(
                x,
                y,
                width,
                height,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.as_mut_ptr() as *mut c_void,
            );
        }
        pixels
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) }
    }

    fn get_viewport(&self) -> [GLint; 4] {
        let mut viewport = [0; 4];
        unsafe { gl::GetIntegerv(gl::VIEWPORT, viewport.as_mut_ptr()) };
        viewport
    }

    fn enable(&self, capability: GLenum) {
        unsafe { gl::Enable(capability) }
    }

    fn blend_func(&self, source: GLenum, destination: GLenum) {
        unsafe { gl::BlendFunc(source, destination) }
    }

    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) }
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        unsafe { gl::DrawElements(mode, count, kind, offset as *const c_void) }
    }
}

#[cfg(test)]
mod test {
    use super::info_log_to_string;

    #[test]
    fn info_log_is_cut_at_written_length() {
        let buf = b"0:1(1): error: syntax error\0\0\0".to_vec();
        assert_eq!(info_log_to_string(buf, 27), "0:1(1): error: syntax error");
    }

    #[test]
    fn negative_written_length_gives_empty_log() {
        assert_eq!(info_log_to_string(vec![b'x'; 4], -1), "");
    }
}
