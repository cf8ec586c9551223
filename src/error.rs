use graphics::GraphicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("could not create a window: {0}")]
    Window(#[from] glutin::CreationError),

    #[error("OpenGL context error: {0}")]
    Context(#[from] glutin::ContextError),

    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

impl AppError {
    /// -1 when there's no usable OpenGL at all, 1 for anything else that stops startup.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Window(_) | AppError::Context(_) => -1,
            AppError::Graphics(GraphicsError::DriverLoad(_)) => -1,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use graphics::{ResourceKind, ShaderKind};

    #[test]
    fn missing_opengl_exits_with_minus_one() {
        assert_eq!(AppError::Graphics(GraphicsError::DriverLoad("glGenBuffers")).exit_code(), -1);
        assert_eq!(AppError::Context(glutin::ContextError::ContextLost).exit_code(), -1);
    }

    #[test]
    fn other_failures_exit_with_one() {
        let missing_stage = GraphicsError::MissingStage(ShaderKind::Vertex);
        assert_eq!(AppError::Graphics(missing_stage).exit_code(), 1);
        let creation = GraphicsError::Creation(ResourceKind::Buffer);
        assert_eq!(AppError::Graphics(creation).exit_code(), 1);
        assert_eq!(AppError::InvalidArgument("bad".to_string()).exit_code(), 1);
    }
}
