use std::f32::consts::PI;
use std::path::Path;

use glam::{Mat4, Vec4};
use graphics::{
    GlContext, IndexBuffer, Renderer, ShaderProgram, VertexArray, VertexBuffer, VertexLayout,
};
use log::debug;

/// A square in front of the camera, one `vec3` per corner.
#[rustfmt::skip]
const POSITIONS: [f32; 12] = [
    -0.5, -0.5, -5.0,
     0.5, -0.5, -5.0,
     0.5,  0.5, -5.0,
    -0.5,  0.5, -5.0,
];

const INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// The one thing the window draws: a coloured quad seen through a perspective camera.
pub struct QuadScene {
    va: VertexArray,
    _vb: VertexBuffer,
    ib: IndexBuffer,
    program: ShaderProgram,
    model: Mat4,
    projection: Mat4,
}

impl QuadScene {
    /// Uploads the quad, builds the program from `shader` and sets `u_Color`. Leaves nothing bound.
    pub fn new<P: AsRef<Path>>(
        gl: &GlContext,
        shader: P,
        color: [f32; 4],
        aspect: f32,
    ) -> graphics::Result<Self> {
        let vb = VertexBuffer::new(gl, &POSITIONS)?;
        let mut layout = VertexLayout::new();
        layout.push::<f32>(3);
        let mut va = VertexArray::new(gl)?;
        va.add_buffer(&vb, &layout);
        let ib = IndexBuffer::new(gl, &INDICES)?;

        let mut program = ShaderProgram::from_file(gl, shader)?;
        program.bind();
        program.set_uniform("u_Color", Vec4::from(color))?;

        program.unbind();
        va.unbind();
        vb.unbind();
        ib.unbind();
        debug!("Quad scene ready");

        Ok(Self {
            va,
            _vb: vb,
            ib,
            program,
            model: Mat4::IDENTITY,
            projection: projection(aspect),
        })
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.projection = projection(aspect);
    }

    pub fn render(&mut self, renderer: &Renderer) -> graphics::Result<()> {
        self.program.bind();
        self.program.set_uniform_mat4("u_Model", &self.model)?;
        self.program.set_uniform_mat4("u_Proj", &self.projection)?;
        renderer.draw(&self.va, &self.ib, &self.program);
        Ok(())
    }
}

fn projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh_gl(PI / 3.0, aspect, 1.0, 100.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use graphics::mock::{Call, MockDriver};
    use graphics::{GraphicsError, Target};

    const SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/res/shaders/basic.shader");

    fn driver() -> MockDriver {
        let driver = MockDriver::new();
        driver.declare_uniform("u_Color");
        driver.declare_uniform("u_Model");
        driver.declare_uniform("u_Proj");
        driver
    }

    #[test]
    fn setup_sets_the_colour_and_unbinds_everything() {
        let driver = driver();
        let gl = GlContext::new(driver.clone());

        let _scene = QuadScene::new(&gl, SHADER, [1.0, 0.5, 0.0, 1.0], 1.0).unwrap();

        assert!(driver
            .calls()
            .contains(&Call::Uniform4f { location: 0, values: [1.0, 0.5, 0.0, 1.0] }));
        for &target in [
            Target::ArrayBuffer,
            Target::ElementArrayBuffer,
            Target::VertexArray,
            Target::Program,
        ]
        .iter()
        {
            assert_eq!(gl.bound(target), None, "{:?}", target);
        }
    }

    #[test]
    fn each_frame_uploads_matrices_and_draws_six_indices() {
        let driver = driver();
        let gl = GlContext::new(driver.clone());
        let mut scene = QuadScene::new(&gl, SHADER, [1.0; 4], 4.0 / 3.0).unwrap();
        let renderer = Renderer::new(&gl);

        driver.clear_calls();
        scene.render(&renderer).unwrap();
        scene.render(&renderer).unwrap();

        assert_eq!(driver.count(|c| matches!(c, Call::UniformMatrix4fv { location: 1, .. })), 2);
        assert_eq!(driver.count(|c| matches!(c, Call::UniformMatrix4fv { location: 2, .. })), 2);
        assert_eq!(driver.count(|c| matches!(c, Call::DrawElements { count: 6, .. })), 2);
        // Looked up on the first frame only
        let lookups = driver.count(|c| {
            matches!(c, Call::GetUniformLocation { name, .. } if name == "u_Proj")
        });
        assert_eq!(lookups, 1);
    }

    #[test]
    fn resizing_changes_the_projection() {
        let driver = driver();
        let gl = GlContext::new(driver.clone());
        let mut scene = QuadScene::new(&gl, SHADER, [1.0; 4], 1.0).unwrap();
        let square = scene.projection;

        scene.set_aspect(2.0);

        assert_ne!(scene.projection, square);
        assert_eq!(scene.projection, projection(2.0));
    }

    #[test]
    fn missing_shader_file_fails_setup() {
        let gl = GlContext::new(driver());

        assert!(matches!(
            QuadScene::new(&gl, "no/such.shader", [1.0; 4], 1.0),
            Err(GraphicsError::ShaderFile { .. })
        ));
    }
}
