use gl::types::*;
use log::debug;

use crate::buffer::VertexBuffer;
use crate::context::{GlContext, Target};
use crate::error::{GraphicsError, ResourceKind, Result};
use crate::layout::VertexLayout;

/// A vertex array object: remembers which buffer feeds which attribute slot and how to read it, so
/// a draw only needs to bind this one object.
#[derive(Debug)]
pub struct VertexArray {
    gl: GlContext,
    id: GLuint,
}

impl VertexArray {
    pub fn new(gl: &GlContext) -> Result<Self> {
        let id = gl_call!(gl, gen_vertex_array());
        if id == 0 {
            return Err(GraphicsError::Creation(ResourceKind::VertexArray));
        }

        Ok(Self { gl: gl.clone(), id })
    }

    pub fn id(&self) -> GLuint { self.id }

    /// Points attribute slots `0..layout.attributes().len()` at `buffer`, in layout order. Leaves
    /// this array and the buffer bound.
    pub fn add_buffer(&mut self, buffer: &VertexBuffer, layout: &VertexLayout) {
        self.bind();
        buffer.bind();

        let stride = layout.stride() as GLsizei;
        let attributes = layout.attributes().iter().zip(layout.offsets());
        for (index, (attribute, offset)) in attributes.enumerate() {
            let index = index as GLuint;
            gl_call!(self.gl, enable_vertex_attrib_array(index));
            gl_call!(
                self.gl,
                vertex_attrib_pointer(
                    index,
                    attribute.count,
                    attribute.kind.gl_enum(),
                    attribute.normalized,
                    stride,
                    offset
                )
            );
        }

        debug!(
            "Vertex array {} reads {} attribute(s) from buffer {} (stride {})",
            self.id,
            layout.attributes().len(),
            buffer.id(),
            stride
        );
    }

    pub fn bind(&self) {
        self.gl.bind(Target::VertexArray, self.id);
    }

    pub fn unbind(&self) {
        self.gl.unbind(Target::VertexArray);
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.gl.forget(self.id, &[Target::VertexArray]);
        gl_call!(self.gl, delete_vertex_array(self.id));
    }
}
