use std::mem::size_of;

use gl;
use gl::types::*;

/// The scalar type of one vertex attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float,
    UnsignedInt,
    UnsignedByte,
}

impl ElementType {
    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::Float => size_of::<f32>(),
            ElementType::UnsignedInt => size_of::<u32>(),
            ElementType::UnsignedByte => size_of::<u8>(),
        }
    }

    pub fn gl_enum(self) -> GLenum {
        match self {
            ElementType::Float => gl::FLOAT,
            ElementType::UnsignedInt => gl::UNSIGNED_INT,
            ElementType::UnsignedByte => gl::UNSIGNED_BYTE,
        }
    }

    /// Bytes are read as colour channels and mapped to `0.0..=1.0`; everything else is passed
    /// through as-is.
    pub fn normalized(self) -> bool {
        match self {
            ElementType::UnsignedByte => true,
            _ => false,
        }
    }
}

/// Rust types that can be a vertex attribute component.
pub trait VertexElement {
    const ELEMENT_TYPE: ElementType;
}

impl VertexElement for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float;
}

impl VertexElement for u32 {
    const ELEMENT_TYPE: ElementType = ElementType::UnsignedInt;
}

impl VertexElement for u8 {
    const ELEMENT_TYPE: ElementType = ElementType::UnsignedByte;
}

/// One field of a vertex, e.g. a `vec3` position is `{ count: 3, kind: Float }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub count: GLint,
    pub kind: ElementType,
    pub normalized: bool,
}

impl VertexAttribute {
    pub fn size(&self) -> usize {
        self.count as usize * self.kind.size()
    }
}

/// Describes how the bytes of one vertex buffer break down into attributes. Attribute `i` ends up
/// in shader slot `i`, so push them in the order the vertex shader declares its `location`s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: usize,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute of `count` components of type `T`.
    ///
    /// ```ignore
    /// let mut layout = VertexLayout::new();
    /// layout.push::<f32>(3).push::<u8>(4); // position, colour
    /// ```
    pub fn push<T: VertexElement>(&mut self, count: GLint) -> &mut Self {
        self.push_element(count, T::ELEMENT_TYPE)
    }

    pub fn push_element(&mut self, count: GLint, kind: ElementType) -> &mut Self {
        let attribute = VertexAttribute {
            count,
            kind,
            normalized: kind.normalized(),
        };
        self.stride += attribute.size();
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Size of one whole vertex in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The byte offset of each attribute within a vertex, in slot order.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.attributes.iter().scan(0, |offset, attribute| {
            let this = *offset;
            *offset += attribute.size();
            Some(this)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stride_is_the_sum_of_attribute_sizes() {
        let mut layout = VertexLayout::new();
        layout.push::<f32>(3).push::<f32>(2).push::<u8>(4).push::<u32>(1);

        assert_eq!(layout.stride(), 3 * 4 + 2 * 4 + 4 + 4);
        assert_eq!(layout.attributes().len(), 4);
    }

    #[test]
    fn offsets_accumulate_previous_attributes() {
        let mut layout = VertexLayout::new();
        layout.push::<f32>(3).push::<u8>(4).push::<f32>(2);

        let offsets: Vec<usize> = layout.offsets().collect();
        assert_eq!(offsets, vec![0, 12, 16]);
        assert_eq!(layout.stride(), 24);
    }

    #[test]
    fn stride_and_offsets_hold_for_arbitrary_sequences() {
        let kinds = [ElementType::Float, ElementType::UnsignedByte, ElementType::UnsignedInt];

        for n in 0..12 {
            let mut layout = VertexLayout::new();
            let mut expected_offsets = vec![];
            let mut sum = 0;

            for i in 0..n {
                let count = (i % 4 + 1) as GLint;
                let kind = kinds[(i * 7 + n) % kinds.len()];
                expected_offsets.push(sum);
                sum += count as usize * kind.size();
                layout.push_element(count, kind);
            }

            assert_eq!(layout.stride(), sum);
            assert_eq!(layout.offsets().collect::<Vec<_>>(), expected_offsets);
        }
    }

    #[test]
    fn only_bytes_are_normalized() {
        let mut layout = VertexLayout::new();
        layout.push::<f32>(2).push::<u8>(4).push::<u32>(1);

        let normalized: Vec<bool> = layout.attributes().iter().map(|a| a.normalized).collect();
        assert_eq!(normalized, vec![false, true, false]);
    }

    #[test]
    fn empty_layout_has_no_stride() {
        let layout = VertexLayout::new();
        assert_eq!(layout.stride(), 0);
        assert_eq!(layout.offsets().count(), 0);
    }
}
