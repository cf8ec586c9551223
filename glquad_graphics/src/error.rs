//! Errors, and the call-checking macro every driver call goes through.

use std::fmt;
use std::io;
use std::path::PathBuf;

use gl;
use gl::types::GLenum;
use thiserror::Error;

use crate::shader::ShaderKind;

pub type Result<T> = std::result::Result<T, GraphicsError>;

#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("could not load the OpenGL function `{0}`")]
    DriverLoad(&'static str),

    #[error("the driver returned no handle for a new {0}")]
    Creation(ResourceKind),

    #[error("could not read shader file {}: {source}", path.display())]
    ShaderFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shader source has no {0} section")]
    MissingStage(ShaderKind),

    #[error("failed to compile {kind} shader:\n{log}")]
    Compile { kind: ShaderKind, log: String },

    #[error("failed to link shader program:\n{log}")]
    Link { log: String },

    #[error("uniform `{name}` set on program {program} while it isn't the bound program")]
    ProgramNotBound { program: u32, name: String },

    #[error("framebuffer is incomplete (status 0x{0:04X})")]
    IncompleteFramebuffer(GLenum),
}

/// What kind of object a driver handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Buffer,
    VertexArray,
    Shader,
    Program,
    Framebuffer,
    Renderbuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::Shader => "shader",
            ResourceKind::Program => "program",
            ResourceKind::Framebuffer => "framebuffer",
            ResourceKind::Renderbuffer => "renderbuffer",
        };
        f.write_str(name)
    }
}

/// An error code taken off the driver's error queue with `glGetError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    StackOverflow,
    StackUnderflow,
    OutOfMemory,
    InvalidFramebufferOperation,
    Unknown(GLenum),
}

impl DriverError {
    /// `None` for `GL_NO_ERROR`.
    pub fn from_code(code: GLenum) -> Option<Self> {
        match code {
            gl::NO_ERROR => None,
            gl::INVALID_ENUM => Some(DriverError::InvalidEnum),
            gl::INVALID_VALUE => Some(DriverError::InvalidValue),
            gl::INVALID_OPERATION => Some(DriverError::InvalidOperation),
            gl::STACK_OVERFLOW => Some(DriverError::StackOverflow),
            gl::STACK_UNDERFLOW => Some(DriverError::StackUnderflow),
            gl::OUT_OF_MEMORY => Some(DriverError::OutOfMemory),
            gl::INVALID_FRAMEBUFFER_OPERATION => Some(DriverError::InvalidFramebufferOperation),
            other => Some(DriverError::Unknown(other)),
        }
    }

    pub fn code(&self) -> GLenum {
        match *self {
            DriverError::InvalidEnum => gl::INVALID_ENUM,
            DriverError::InvalidValue => gl::INVALID_VALUE,
            DriverError::InvalidOperation => gl::INVALID_OPERATION,
            DriverError::StackOverflow => gl::STACK_OVERFLOW,
            DriverError::StackUnderflow => gl::STACK_UNDERFLOW,
            DriverError::OutOfMemory => gl::OUT_OF_MEMORY,
            DriverError::InvalidFramebufferOperation => gl::INVALID_FRAMEBUFFER_OPERATION,
            DriverError::Unknown(code) => code,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverError::InvalidEnum => "GL_INVALID_ENUM",
            DriverError::InvalidValue => "GL_INVALID_VALUE",
            DriverError::InvalidOperation => "GL_INVALID_OPERATION",
            DriverError::StackOverflow => "GL_STACK_OVERFLOW",
            DriverError::StackUnderflow => "GL_STACK_UNDERFLOW",
            DriverError::OutOfMemory => "GL_OUT_OF_MEMORY",
            DriverError::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
            DriverError::Unknown(_) => "unknown error",
        };
        write!(f, "{} (0x{:04X})", name, self.code())
    }
}

/// Calls a [`GlApi`](crate::driver::GlApi) method on a [`GlContext`](crate::GlContext) and then
/// drains the driver's error queue, reporting anything found against the call text and the
/// caller's file and line. Evaluates to whatever the driver call returned.
///
/// ```ignore
/// let id = gl_call!(gl, gen_buffer());
/// gl_call!(gl, buffer_data(gl::ARRAY_BUFFER, bytes, gl::STATIC_DRAW));
/// ```
#[macro_export]
macro_rules! gl_call {
    ($gl:expr, $name:ident ( $($arg:expr),* $(,)? )) => {{
        let context: &$crate::GlContext = &$gl;
        let result = context.api().$name($($arg),*);
        context.check_errors(
            concat!(stringify!($name), "(", stringify!($($arg),*), ")"),
            file!(),
            line!(),
        );
        result
    }};
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn driver_error_codes_map_both_ways() {
        assert_eq!(DriverError::from_code(gl::NO_ERROR), None);
        assert_eq!(
            DriverError::from_code(gl::INVALID_OPERATION),
            Some(DriverError::InvalidOperation)
        );
        assert_eq!(DriverError::from_code(0x1234), Some(DriverError::Unknown(0x1234)));
        assert_eq!(DriverError::InvalidValue.code(), gl::INVALID_VALUE);
    }

    #[test]
    fn driver_error_display_names_the_code() {
        assert_eq!(DriverError::InvalidEnum.to_string(), "GL_INVALID_ENUM (0x0500)");
    }
}
