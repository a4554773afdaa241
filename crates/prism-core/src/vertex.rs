//! Vertex element descriptors
//!
//! Host-side description of a vertex buffer's fields, matched against the
//! shader's expected vertex inputs when an input layout is built.

use serde::{Deserialize, Serialize};

/// Meaning of a vertex buffer field.
///
/// Each semantic binds to a fixed input name in the vertex shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexSemantic {
    Position,
    Normal,
    Tangent,
    Color,
    TexCoord,
}

impl VertexSemantic {
    /// Name of the vertex shader input this semantic binds to.
    pub fn input_name(self) -> &'static str {
        match self {
            VertexSemantic::Position => "position",
            VertexSemantic::Normal => "normal",
            VertexSemantic::Tangent => "tangent",
            VertexSemantic::Color => "color",
            VertexSemantic::TexCoord => "uv",
        }
    }
}

/// Data format of a vertex buffer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    /// Size of one element of this format in bytes.
    pub fn size(self) -> u64 {
        match self {
            VertexFormat::Float32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }

    /// Number of float components.
    pub fn components(self) -> u32 {
        match self {
            VertexFormat::Float32 => 1,
            VertexFormat::Float32x2 => 2,
            VertexFormat::Float32x3 => 3,
            VertexFormat::Float32x4 => 4,
        }
    }
}

/// One field of a vertex buffer: what it means, how it is stored, and
/// where it starts within the vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexElement {
    pub semantic: VertexSemantic,
    pub format: VertexFormat,
    pub offset: u64,
}

impl VertexElement {
    pub fn new(semantic: VertexSemantic, format: VertexFormat, offset: u64) -> Self {
        Self {
            semantic,
            format,
            offset,
        }
    }
}

/// Errors in a descriptor array itself, independent of any shader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VertexLayoutError {
    #[error("vertex elements must be sorted by offset (element {index} starts at {offset}, previous ends at {previous_end})")]
    Unsorted {
        index: usize,
        offset: u64,
        previous_end: u64,
    },

    #[error("duplicate vertex semantic '{0:?}'")]
    DuplicateSemantic(VertexSemantic),

    #[error("empty vertex element array")]
    Empty,
}

/// Validates a descriptor array and returns the packed stride.
///
/// Elements must be offset-sorted and non-overlapping, with each semantic
/// appearing at most once. The stride is the end of the last element.
pub fn validate_elements(elements: &[VertexElement]) -> Result<u64, VertexLayoutError> {
    if elements.is_empty() {
        return Err(VertexLayoutError::Empty);
    }

    let mut end = 0u64;
    for (index, element) in elements.iter().enumerate() {
        if element.offset < end {
            return Err(VertexLayoutError::Unsorted {
                index,
                offset: element.offset,
                previous_end: end,
            });
        }
        if elements[..index]
            .iter()
            .any(|e| e.semantic == element.semantic)
        {
            return Err(VertexLayoutError::DuplicateSemantic(element.semantic));
        }
        end = element.offset + element.format.size();
    }

    Ok(end)
}

/// Builds a packed element array from (semantic, format) pairs, assigning
/// consecutive offsets.
pub fn packed_elements(fields: &[(VertexSemantic, VertexFormat)]) -> Vec<VertexElement> {
    let mut offset = 0u64;
    fields
        .iter()
        .map(|&(semantic, format)| {
            let element = VertexElement::new(semantic, format, offset);
            offset += format.size();
            element
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_has_consecutive_offsets() {
        let elements = packed_elements(&[
            (VertexSemantic::Position, VertexFormat::Float32x3),
            (VertexSemantic::TexCoord, VertexFormat::Float32x2),
        ]);
        assert_eq!(elements[0].offset, 0);
        assert_eq!(elements[1].offset, 12);
        assert_eq!(validate_elements(&elements), Ok(20));
    }

    #[test]
    fn overlapping_elements_are_rejected() {
        let elements = [
            VertexElement::new(VertexSemantic::Position, VertexFormat::Float32x3, 0),
            VertexElement::new(VertexSemantic::TexCoord, VertexFormat::Float32x2, 8),
        ];
        assert!(matches!(
            validate_elements(&elements),
            Err(VertexLayoutError::Unsorted { index: 1, .. })
        ));
    }

    #[test]
    fn duplicate_semantics_are_rejected() {
        let elements = [
            VertexElement::new(VertexSemantic::Position, VertexFormat::Float32x3, 0),
            VertexElement::new(VertexSemantic::Position, VertexFormat::Float32x2, 12),
        ];
        assert_eq!(
            validate_elements(&elements),
            Err(VertexLayoutError::DuplicateSemantic(VertexSemantic::Position))
        );
    }

    #[test]
    fn empty_array_is_rejected() {
        assert_eq!(validate_elements(&[]), Err(VertexLayoutError::Empty));
    }

    #[test]
    fn format_sizes() {
        assert_eq!(VertexFormat::Float32.size(), 4);
        assert_eq!(VertexFormat::Float32x4.size(), 16);
        assert_eq!(VertexFormat::Float32x3.components(), 3);
    }
}
