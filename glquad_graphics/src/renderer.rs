use gl;
use gl::types::*;

use crate::buffer::IndexBuffer;
use crate::context::GlContext;
use crate::shader::ShaderProgram;
use crate::vertex_array::VertexArray;

/// Clears the frame and issues draw calls. It holds no GPU objects of its own; everything it draws
/// is handed to it per call.
#[derive(Debug, Clone)]
pub struct Renderer {
    gl: GlContext,
}

impl Renderer {
    pub fn new(gl: &GlContext) -> Self {
        Self { gl: gl.clone() }
    }

    pub fn set_clear_color(&self, [r, g, b, a]: [f32; 4]) {
        gl_call!(self.gl, clear_color(r, g, b, a));
    }

    pub fn clear(&self) {
        gl_call!(self.gl, clear(gl::COLOR_BUFFER_BIT));
    }

    /// Draws `indices.count()` indices as a triangle list, reading vertices through `vertices` and
    /// shading with `program`. Binds all three first, program before vertex array before index
    /// buffer, so the index buffer lands in the vertex array's state. The three are assumed to fit
    /// together; a mismatch shows up as a driver error or as garbage on screen.
    pub fn draw(&self, vertices: &VertexArray, indices: &IndexBuffer, program: &ShaderProgram) {
        program.bind();
        vertices.bind();
        indices.bind();

        gl_call!(
            self.gl,
            draw_elements(gl::TRIANGLES, indices.count() as GLsizei, gl::UNSIGNED_INT, 0)
        );
    }

    /// Standard "over" blending, so fragments with alpha below 1 show what's behind them.
    pub fn enable_alpha_blending(&self) {
        gl_call!(self.gl, enable(gl::BLEND));
        gl_call!(self.gl, blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA));
    }

    pub fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        gl_call!(self.gl, viewport(x, y, width as GLsizei, height as GLsizei));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::VertexBuffer;
    use crate::context::Target;
    use crate::layout::VertexLayout;
    use crate::mock::{Call, MockDriver};
    use crate::shader::ShaderProgramSource;

    const SOURCE: &str = "#shader vertex\nvoid main() {}\n#shader fragment\nvoid main() {}\n";

    struct Quad {
        va: VertexArray,
        _vb: VertexBuffer,
        ib: IndexBuffer,
        program: ShaderProgram,
    }

    fn quad(gl: &GlContext) -> Quad {
        let vb = VertexBuffer::new(gl, &[-0.5f32, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, 0.5]).unwrap();
        let mut layout = VertexLayout::new();
        layout.push::<f32>(2);
        let mut va = VertexArray::new(gl).unwrap();
        va.add_buffer(&vb, &layout);
        let ib = IndexBuffer::new(gl, &[0, 1, 2, 2, 3, 0]).unwrap();
        let program = ShaderProgram::new(gl, &ShaderProgramSource::parse(SOURCE)).unwrap();

        Quad { va, _vb: vb, ib, program }
    }

    #[test]
    fn draw_issues_one_indexed_call_sized_by_the_index_buffer() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());
        let quad = quad(&gl);
        let renderer = Renderer::new(&gl);

        driver.clear_calls();
        renderer.draw(&quad.va, &quad.ib, &quad.program);

        let draws: Vec<Call> = driver
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DrawElements { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![Call::DrawElements {
                mode: gl::TRIANGLES,
                count: 6,
                kind: gl::UNSIGNED_INT,
                offset: 0
            }]
        );
    }

    #[test]
    fn draw_binds_program_then_vertex_array_then_indices() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());
        let quad = quad(&gl);
        quad.va.unbind();
        quad.ib.unbind();

        driver.clear_calls();
        Renderer::new(&gl).draw(&quad.va, &quad.ib, &quad.program);

        assert_eq!(
            &driver.calls()[..3],
            &[
                Call::UseProgram(quad.program.id()),
                Call::BindVertexArray(quad.va.id()),
                Call::BindBuffer { target: gl::ELEMENT_ARRAY_BUFFER, id: quad.ib.id() },
            ]
        );
        assert_eq!(gl.bound(Target::Program), Some(quad.program.id()));
        assert_eq!(gl.bound(Target::VertexArray), Some(quad.va.id()));
        assert_eq!(gl.bound(Target::ElementArrayBuffer), Some(quad.ib.id()));
    }

    #[test]
    fn clear_uses_the_clear_color() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());
        let renderer = Renderer::new(&gl);

        renderer.set_clear_color([0.1, 0.2, 0.3, 1.0]);
        renderer.clear();

        assert_eq!(
            driver.calls(),
            vec![
                Call::ClearColor([0.1, 0.2, 0.3, 1.0]),
                Call::Clear(gl::COLOR_BUFFER_BIT),
            ]
        );
    }

    #[test]
    fn alpha_blending_is_source_over() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());

        Renderer::new(&gl).enable_alpha_blending();

        assert_eq!(
            driver.calls(),
            vec![
                Call::Enable(gl::BLEND),
                Call::BlendFunc { source: gl::SRC_ALPHA, destination: gl::ONE_MINUS_SRC_ALPHA },
            ]
        );
    }
}
