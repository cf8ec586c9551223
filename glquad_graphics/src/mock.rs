//! A stand-in for the OpenGL function table that records what it's asked to do.
//!
//! `MockDriver` hands out increasing handles, remembers which shader is which kind, and answers
//! status queries according to a few switches (`fail_compile`, `fail_link`, ...). Clones share the
//! same state, so a test keeps one clone to inspect while the [`GlContext`](crate::GlContext) owns
//! the other.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use gl;
use gl::types::*;

use crate::driver::GlApi;

/// One recorded driver call. Pure queries (`get_error`, status and info-log reads) aren't recorded,
/// except for uniform lookups, which the uniform cache is supposed to keep rare.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GenBuffer(GLuint),
    DeleteBuffer(GLuint),
    BindBuffer { target: GLenum, id: GLuint },
    BufferData { target: GLenum, len: usize, usage: GLenum },
    GenVertexArray(GLuint),
    DeleteVertexArray(GLuint),
    BindVertexArray(GLuint),
    EnableVertexAttribArray(GLuint),
    VertexAttribPointer {
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    },
    CreateShader { kind: GLenum, id: GLuint },
    ShaderSource { shader: GLuint, source: String },
    CompileShader(GLuint),
    DeleteShader(GLuint),
    CreateProgram(GLuint),
    AttachShader { program: GLuint, shader: GLuint },
    LinkProgram(GLuint),
    ValidateProgram(GLuint),
    DeleteProgram(GLuint),
    UseProgram(GLuint),
    GetUniformLocation { program: GLuint, name: String },
    Uniform1i { location: GLint, value: GLint },
    Uniform1f { location: GLint, value: GLfloat },
    Uniform4f { location: GLint, values: [GLfloat; 4] },
    UniformMatrix4fv { location: GLint, transpose: bool, values: [GLfloat; 16] },
    GenFramebuffer(GLuint),
    DeleteFramebuffer(GLuint),
    BindFramebuffer { target: GLenum, id: GLuint },
    FramebufferRenderbuffer { attachment: GLenum, renderbuffer: GLuint },
    GenRenderbuffer(GLuint),
    DeleteRenderbuffer(GLuint),
    BindRenderbuffer { target: GLenum, id: GLuint },
    RenderbufferStorage { format: GLenum, width: GLsizei, height: GLsizei },
    ReadPixels { x: GLint, y: GLint, width: GLsizei, height: GLsizei },
    Viewport { x: GLint, y: GLint, width: GLsizei, height: GLsizei },
    Enable(GLenum),
    BlendFunc { source: GLenum, destination: GLenum },
    ClearColor([GLfloat; 4]),
    Clear(GLbitfield),
    DrawElements { mode: GLenum, count: GLsizei, kind: GLenum, offset: usize },
}

const COMPILE_LOG: &str = "0:1(1): error: syntax error, unexpected end of file";
const LINK_LOG: &str = "error: vertex shader output `v_Color` not read by fragment shader";

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    last_id: GLuint,
    errors: VecDeque<GLenum>,
    exhausted: bool,
    shader_kinds: HashMap<GLuint, GLenum>,
    failing_stage: Option<GLenum>,
    fail_link: bool,
    fail_validate: bool,
    uniforms: Vec<String>,
    incomplete_framebuffer: bool,
    viewport: [GLint; 4],
}

impl State {
    fn next_id(&mut self) -> GLuint {
        if self.exhausted {
            return 0;
        }
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Clone, Default)]
pub struct MockDriver {
    state: Rc<RefCell<State>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// How many recorded calls satisfy `predicate`.
    pub fn count<P: Fn(&Call) -> bool>(&self, predicate: P) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Queues an error code for `get_error` to return.
    pub fn push_error(&self, code: GLenum) {
        self.state.borrow_mut().errors.push_back(code);
    }

    /// From now on every object creation returns 0, like a driver that's out of names.
    pub fn exhaust_handles(&self) {
        self.state.borrow_mut().exhausted = true;
    }

    /// Shaders of `kind` (`gl::VERTEX_SHADER` or `gl::FRAGMENT_SHADER`) fail to compile.
    pub fn fail_compile(&self, kind: GLenum) {
        self.state.borrow_mut().failing_stage = Some(kind);
    }

    pub fn fail_link(&self) {
        self.state.borrow_mut().fail_link = true;
    }

    pub fn fail_validate(&self) {
        self.state.borrow_mut().fail_validate = true;
    }

    /// Makes `name` an active uniform of every program. Locations are handed out in declaration
    /// order; undeclared names resolve to -1.
    pub fn declare_uniform(&self, name: &str) {
        self.state.borrow_mut().uniforms.push(name.to_string());
    }

    pub fn incomplete_framebuffer(&self) {
        self.state.borrow_mut().incomplete_framebuffer = true;
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self, make: fn(GLuint) -> Call) -> GLuint {
        let id = self.state.borrow_mut().next_id();
        self.record(make(id));
        id
    }
}

impl GlApi for MockDriver {
    fn get_error(&self) -> GLenum {
        self.state.borrow_mut().errors.pop_front().unwrap_or(gl::NO_ERROR)
    }

    fn get_string(&self, name: GLenum) -> String {
        match name {
            gl::VERSION => "3.3.0 Mock".to_string(),
            _ => String::new(),
        }
    }

    fn gen_buffer(&self) -> GLuint {
        self.create(Call::GenBuffer)
    }

    fn delete_buffer(&self, id: GLuint) {
        self.record(Call::DeleteBuffer(id));
    }

    fn bind_buffer(&self, target: GLenum, id: GLuint) {
        self.record(Call::BindBuffer { target, id });
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.record(Call::BufferData { target, len: data.len(), usage });
    }

    fn gen_vertex_array(&self) -> GLuint {
        self.create(Call::GenVertexArray)
    }

    fn delete_vertex_array(&self, id: GLuint) {
        self.record(Call::DeleteVertexArray(id));
    }

    fn bind_vertex_array(&self, id: GLuint) {
        self.record(Call::BindVertexArray(id));
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.record(Call::EnableVertexAttribArray(index));
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
        self.record(Call::VertexAttribPointer { index, size, kind, normalized, stride, offset });
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        let id = self.state.borrow_mut().next_id();
        if id != 0 {
            self.state.borrow_mut().shader_kinds.insert(id, kind);
        }
        self.record(Call::CreateShader { kind, id });
        id
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        self.record(Call::ShaderSource { shader, source: source.to_string() });
    }

    fn compile_shader(&self, shader: GLuint) {
        self.record(Call::CompileShader(shader));
    }

    fn get_shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let state = self.state.borrow();
        let failed = state.failing_stage.is_some()
            && state.shader_kinds.get(&shader).copied() == state.failing_stage;
        match pname {
            gl::COMPILE_STATUS => !failed as GLint,
            gl::INFO_LOG_LENGTH if failed => COMPILE_LOG.len() as GLint + 1,
            _ => 0,
        }
    }

    fn get_shader_info_log(&self, shader: GLuint) -> String {
        if self.get_shader_iv(shader, gl::COMPILE_STATUS) == 0 {
            COMPILE_LOG.to_string()
        } else {
            String::new()
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> GLuint {
        self.create(Call::CreateProgram)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.record(Call::AttachShader { program, shader });
    }

    fn link_program(&self, program: GLuint) {
        self.record(Call::LinkProgram(program));
    }

    fn validate_program(&self, program: GLuint) {
        self.record(Call::ValidateProgram(program));
    }

    fn get_program_iv(&self, _program: GLuint, pname: GLenum) -> GLint {
        let state = self.state.borrow();
        match pname {
            gl::LINK_STATUS => !state.fail_link as GLint,
            gl::VALIDATE_STATUS => !state.fail_validate as GLint,
            gl::INFO_LOG_LENGTH if state.fail_link => LINK_LOG.len() as GLint + 1,
            _ => 0,
        }
    }

    fn get_program_info_log(&self, _program: GLuint) -> String {
        if self.state.borrow().fail_link {
            LINK_LOG.to_string()
        } else {
            String::new()
        }
    }

    fn delete_program(&self, program: GLuint) {
        self.record(Call::DeleteProgram(program));
    }

    fn use_program(&self, program: GLuint) {
        self.record(Call::UseProgram(program));
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        self.record(Call::GetUniformLocation { program, name: name.to_string() });
        self.state
            .borrow()
            .uniforms
            .iter()
            .position(|u| u == name)
            .map_or(-1, |i| i as GLint)
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        self.record(Call::Uniform1i { location, value });
    }

    fn uniform_1f(&self, location: GLint, value: GLfloat) {
        self.record(Call::Uniform1f { location, value });
    }

    fn uniform_4f(&self, location: GLint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat) {
        self.record(Call::Uniform4f { location, values: [x, y, z, w] });
    }

    fn uniform_matrix_4fv(&self, location: GLint, transpose: bool, value: &[GLfloat; 16]) {
        self.record(Call::UniformMatrix4fv { location, transpose, values: *value });
    }

    fn gen_framebuffer(&self) -> GLuint {
        self.create(Call::GenFramebuffer)
    }

    fn delete_framebuffer(&self, id: GLuint) {
        self.record(Call::DeleteFramebuffer(id));
    }

    fn bind_framebuffer(&self, target: GLenum, id: GLuint) {
        self.record(Call::BindFramebuffer { target, id });
    }

    fn check_framebuffer_status(&self, _target: GLenum) -> GLenum {
        if self.state.borrow().incomplete_framebuffer {
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
        } else {
            gl::FRAMEBUFFER_COMPLETE
        }
    }

    fn framebuffer_renderbuffer(
        &self,
        _target: GLenum,
        attachment: GLenum,
        _renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    ) {
        self.record(Call::FramebufferRenderbuffer { attachment, renderbuffer });
    }

    fn gen_renderbuffer(&self) -> GLuint {
        self.create(Call::GenRenderbuffer)
    }

    fn delete_renderbuffer(&self, id: GLuint) {
        self.record(Call::DeleteRenderbuffer(id));
    }

    fn bind_renderbuffer(&self, target: GLenum, id: GLuint) {
        self.record(Call::BindRenderbuffer { target, id });
    }

    fn renderbuffer_storage(
        &self,
        _target: GLenum,
        format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.record(Call::RenderbufferStorage { format, width, height });
    }

    fn read_pixels(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> Vec<u8> {
        self.record(Call::ReadPixels { x, y, width, height });
        vec![0; (width.max(0) * height.max(0) * 4) as usize]
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.state.borrow_mut().viewport = [x, y, width, height];
        self.record(Call::Viewport { x, y, width, height });
    }

    fn get_viewport(&self) -> [GLint; 4] {
        self.state.borrow().viewport
    }

    fn enable(&self, capability: GLenum) {
        self.record(Call::Enable(capability));
    }

    fn blend_func(&self, source: GLenum, destination: GLenum) {
        self.record(Call::BlendFunc { source, destination });
    }

    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        self.record(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: GLbitfield) {
        self.record(Call::Clear(mask));
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        self.record(Call::DrawElements { mode, count, kind, offset });
    }
}
