//! Shader programs.
//!
//! A program is written as one file holding both stages, each introduced by a `#shader` line:
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! layout(location = 0) in vec4 position;
//! void main() { gl_Position = position; }
//!
//! #shader fragment
//! #version 330 core
//! layout(location = 0) out vec4 color;
//! uniform vec4 u_Color;
//! void main() { color = u_Color; }
//! ```
//!
//! [`ShaderProgramSource`] splits such a file into its two stages, [`compile`] turns one stage into
//! a [`Shader`], and [`ShaderProgram`] links the pair and sets uniforms on the result.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use gl;
use gl::types::*;
use glam::{Mat4, Vec4};
use log::{debug, error, warn};

use crate::context::{GlContext, Target};
use crate::error::{GraphicsError, ResourceKind, Result};

/// Lines containing this start a new section.
const SECTION_MARKER: &str = "#shader";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex = gl::VERTEX_SHADER as isize,
    Fragment = gl::FRAGMENT_SHADER as isize,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// The two stages of a program, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgramSource {
    /// Splits `text` on `#shader vertex` / `#shader fragment` lines. Every other line goes, with a
    /// trailing newline, to the section selected by the last marker. Lines before the first marker
    /// and after a marker naming neither stage are dropped.
    pub fn parse(text: &str) -> Self {
        let mut source = Self::default();
        let mut section = None;

        for line in text.lines() {
            if line.contains(SECTION_MARKER) {
                section = if line.contains("vertex") {
                    Some(ShaderKind::Vertex)
                } else if line.contains("fragment") {
                    Some(ShaderKind::Fragment)
                } else {
                    warn!("Ignoring shader section with unknown kind: {}", line.trim());
                    None
                };
                continue;
            }

            let target = match section {
                Some(ShaderKind::Vertex) => &mut source.vertex,
                Some(ShaderKind::Fragment) => &mut source.fragment,
                None => continue,
            };
            target.push_str(line);
            target.push('\n');
        }

        source
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GraphicsError::ShaderFile {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loaded shader source from {}", path.display());
        Ok(Self::parse(&text))
    }

    pub fn stage(&self, kind: ShaderKind) -> &str {
        match kind {
            ShaderKind::Vertex => &self.vertex,
            ShaderKind::Fragment => &self.fragment,
        }
    }
}

/// One compiled stage. It only needs to live until it's been linked into a program.
#[derive(Debug)]
pub struct Shader {
    gl: GlContext,
    id: GLuint,
    kind: ShaderKind,
}

impl Shader {
    pub fn id(&self) -> GLuint { self.id }

    pub fn kind(&self) -> ShaderKind { self.kind }
}

impl Drop for Shader {
    fn drop(&mut self) {
        gl_call!(self.gl, delete_shader(self.id));
    }
}

/// Compiles one stage. On failure the driver's log is reported and the half-made shader object is
/// deleted before the error is returned.
pub fn compile(gl: &GlContext, kind: ShaderKind, source: &str) -> Result<Shader> {
    let id = gl_call!(gl, create_shader(kind as GLenum));
    if id == 0 {
        return Err(GraphicsError::Creation(ResourceKind::Shader));
    }
    let shader = Shader { gl: gl.clone(), id, kind };

    gl_call!(gl, shader_source(id, source));
    gl_call!(gl, compile_shader(id));

    if gl_call!(gl, get_shader_iv(id, gl::COMPILE_STATUS)) == 0 {
        let log = gl_call!(gl, get_shader_info_log(id));
        error!("Failed to compile {} shader:\n{}", kind, log);
        return Err(GraphicsError::Compile { kind, log });
    }

    Ok(shader)
}

/// A value that can be uploaded to a uniform, using whichever `glUniform*` call fits its shape.
pub trait Uniform {
    fn upload(&self, gl: &GlContext, location: GLint);
}

impl Uniform for i32 {
    fn upload(&self, gl: &GlContext, location: GLint) {
        gl_call!(gl, uniform_1i(location, *self));
    }
}

impl Uniform for f32 {
    fn upload(&self, gl: &GlContext, location: GLint) {
        gl_call!(gl, uniform_1f(location, *self));
    }
}

impl Uniform for [f32; 4] {
    fn upload(&self, gl: &GlContext, location: GLint) {
        let [x, y, z, w] = *self;
        gl_call!(gl, uniform_4f(location, x, y, z, w));
    }
}

impl Uniform for Vec4 {
    fn upload(&self, gl: &GlContext, location: GLint) {
        self.to_array().upload(gl, location);
    }
}

impl Uniform for Mat4 {
    // glam stores matrices column-major, which is what GL expects without transposing
    fn upload(&self, gl: &GlContext, location: GLint) {
        gl_call!(gl, uniform_matrix_4fv(location, false, &self.to_cols_array()));
    }
}

impl<U: Uniform + ?Sized> Uniform for &U {
    fn upload(&self, gl: &GlContext, location: GLint) {
        (**self).upload(gl, location);
    }
}

/// A linked vertex + fragment program.
#[derive(Debug)]
pub struct ShaderProgram {
    gl: GlContext,
    id: GLuint,
    /// `None` remembers that the driver has no such uniform.
    uniforms: HashMap<String, Option<GLint>>,
}

impl ShaderProgram {
    pub fn from_file<P: AsRef<Path>>(gl: &GlContext, path: P) -> Result<Self> {
        let source = ShaderProgramSource::load(path)?;
        Self::new(gl, &source)
    }

    pub fn new(gl: &GlContext, source: &ShaderProgramSource) -> Result<Self> {
        for &kind in [ShaderKind::Vertex, ShaderKind::Fragment].iter() {
            if source.stage(kind).trim().is_empty() {
                return Err(GraphicsError::MissingStage(kind));
            }
        }

        Self::link(gl, &source.vertex, &source.fragment)
    }

    /// Compiles both stages and links them. Any stage failing to compile aborts the whole program;
    /// so does a failed link. A program that links but doesn't validate is only warned about,
    /// since validation depends on whatever happens to be bound right now.
    pub fn link(gl: &GlContext, vertex: &str, fragment: &str) -> Result<Self> {
        let id = gl_call!(gl, create_program());
        if id == 0 {
            return Err(GraphicsError::Creation(ResourceKind::Program));
        }
        // Owned from here on, so any early return deletes the program
        let program = Self {
            gl: gl.clone(),
            id,
            uniforms: HashMap::new(),
        };

        let vs = compile(gl, ShaderKind::Vertex, vertex)?;
        let fs = compile(gl, ShaderKind::Fragment, fragment)?;

        gl_call!(gl, attach_shader(id, vs.id()));
        gl_call!(gl, attach_shader(id, fs.id()));
        gl_call!(gl, link_program(id));

        if gl_call!(gl, get_program_iv(id, gl::LINK_STATUS)) == 0 {
            let log = gl_call!(gl, get_program_info_log(id));
            error!("Failed to link shader program {}:\n{}", id, log);
            return Err(GraphicsError::Link { log });
        }

        gl_call!(gl, validate_program(id));
        if gl_call!(gl, get_program_iv(id, gl::VALIDATE_STATUS)) == 0 {
            let log = gl_call!(gl, get_program_info_log(id));
            warn!("Shader program {} did not validate: {}", id, log.trim());
        }

        debug!("Linked shader program {}", id);

        // The stages are dropped (and deleted) here; the linked program keeps what it needs
        Ok(program)
    }

    pub fn id(&self) -> GLuint { self.id }

    /// Makes this the current program. Uniforms can only be set while it is.
    pub fn bind(&self) {
        self.gl.bind(Target::Program, self.id);
    }

    pub fn unbind(&self) {
        self.gl.unbind(Target::Program);
    }

    pub fn is_bound(&self) -> bool {
        self.gl.bound(Target::Program) == Some(self.id)
    }

    /// Uploads `value` to the uniform called `name`. The location is looked up once and then
    /// cached. A name the program doesn't have is reported the first time and ignored after that.
    pub fn set_uniform<U: Uniform>(&mut self, name: &str, value: U) -> Result<()> {
        if !self.is_bound() {
            return Err(GraphicsError::ProgramNotBound {
                program: self.id,
                name: name.to_string(),
            });
        }

        if let Some(location) = self.uniform_location(name) {
            value.upload(&self.gl, location);
        }

        Ok(())
    }

    pub fn set_uniform_4f(&mut self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) -> Result<()> {
        self.set_uniform(name, [v0, v1, v2, v3])
    }

    pub fn set_uniform_mat4(&mut self, name: &str, matrix: &Mat4) -> Result<()> {
        self.set_uniform(name, matrix)
    }

    fn uniform_location(&mut self, name: &str) -> Option<GLint> {
        if let Some(&location) = self.uniforms.get(name) {
            return location;
        }

        let location = match gl_call!(self.gl, get_uniform_location(self.id, name)) {
            location if location < 0 => {
                warn!("Uniform `{}` doesn't exist in shader program {}", name, self.id);
                None
            }
            location => Some(location),
        };
        self.uniforms.insert(name.to_string(), location);

        location
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.gl.forget(self.id, &[Target::Program]);
        gl_call!(self.gl, delete_program(self.id));
    }
}
