//! Input layout matching
//!
//! Matches host-side vertex element descriptors against the vertex entry
//! point's reflected inputs and produces the wgpu attribute list used to
//! build the effect's render pipeline.

use prism_core::{VertexElement, VertexFormat, VertexLayoutError, VertexSemantic};

use crate::reflection::ShaderInfo;

/// A descriptor array successfully matched against the shader signature.
#[derive(Debug, Clone)]
pub struct MatchedLayout {
    pub attributes: Vec<wgpu::VertexAttribute>,
    pub stride: u64,
}

impl MatchedLayout {
    /// Borrows this layout as a wgpu vertex buffer layout.
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Input layout failure. Each variant carries a stable numeric code that is
/// included in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid vertex element array: {0}")]
    InvalidElements(#[from] VertexLayoutError),

    #[error("effect has no vertex entry point")]
    NoVertexEntry,

    #[error("shader vertex input '{name}' @location({location}) has no matching vertex element")]
    MissingInput { name: String, location: u32 },

    #[error("vertex element {semantic:?} ('{input}') does not match any shader vertex input")]
    UnexpectedElement {
        semantic: VertexSemantic,
        input: &'static str,
    },

    #[error(
        "vertex element {semantic:?} has format {provided:?} but shader input '{name}' expects {expected:?}"
    )]
    FormatMismatch {
        semantic: VertexSemantic,
        name: String,
        provided: VertexFormat,
        expected: VertexFormat,
    },

    #[error("shader vertex input '{name}' @location({location}) cannot be fed from a vertex buffer")]
    UnsupportedInput { name: String, location: u32 },
}

impl LayoutError {
    /// Stable numeric code for diagnostics.
    pub fn code(&self) -> u32 {
        match self {
            LayoutError::InvalidElements(_) => 0x101,
            LayoutError::NoVertexEntry => 0x102,
            LayoutError::MissingInput { .. } => 0x103,
            LayoutError::UnexpectedElement { .. } => 0x104,
            LayoutError::FormatMismatch { .. } => 0x105,
            LayoutError::UnsupportedInput { .. } => 0x106,
        }
    }
}

fn to_wgpu_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

/// Matches vertex elements against the shader's vertex input signature.
///
/// Every shader input must be covered by exactly one element of matching
/// format, and no element may be left over. Returns the attribute list and
/// packed stride on success.
pub fn match_vertex_layout(
    info: &ShaderInfo,
    elements: &[VertexElement],
) -> Result<MatchedLayout, LayoutError> {
    if info.vertex_entry.is_none() {
        return Err(LayoutError::NoVertexEntry);
    }

    let stride = prism_core::vertex::validate_elements(elements)?;

    let mut attributes = Vec::with_capacity(elements.len());
    for element in elements {
        let input_name = element.semantic.input_name();
        let input = info
            .vertex_input(input_name)
            .ok_or(LayoutError::UnexpectedElement {
                semantic: element.semantic,
                input: input_name,
            })?;
        let expected = input.format.ok_or_else(|| LayoutError::UnsupportedInput {
            name: input.name.clone(),
            location: input.location,
        })?;
        if expected != element.format {
            return Err(LayoutError::FormatMismatch {
                semantic: element.semantic,
                name: input.name.clone(),
                provided: element.format,
                expected,
            });
        }
        attributes.push(wgpu::VertexAttribute {
            format: to_wgpu_format(element.format),
            offset: element.offset,
            shader_location: input.location,
        });
    }

    for input in &info.vertex_inputs {
        let covered = elements
            .iter()
            .any(|e| e.semantic.input_name() == input.name);
        if !covered {
            return Err(LayoutError::MissingInput {
                name: input.name.clone(),
                location: input.location,
            });
        }
    }

    Ok(MatchedLayout { attributes, stride })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::reflect;
    use prism_core::vertex::packed_elements;

    const TEXTURED: &str = include_str!("shaders/textured.wgsl");

    fn textured_info() -> ShaderInfo {
        reflect(TEXTURED).unwrap()
    }

    fn matching_elements() -> Vec<VertexElement> {
        packed_elements(&[
            (VertexSemantic::Position, VertexFormat::Float32x3),
            (VertexSemantic::Normal, VertexFormat::Float32x3),
            (VertexSemantic::TexCoord, VertexFormat::Float32x2),
        ])
    }

    #[test]
    fn matching_descriptors_produce_attributes_and_stride() {
        let layout = match_vertex_layout(&textured_info(), &matching_elements()).unwrap();
        assert_eq!(layout.stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[2].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn missing_element_for_shader_input_fails() {
        let elements = packed_elements(&[
            (VertexSemantic::Position, VertexFormat::Float32x3),
            (VertexSemantic::Normal, VertexFormat::Float32x3),
        ]);
        let err = match_vertex_layout(&textured_info(), &elements).unwrap_err();
        assert!(matches!(err, LayoutError::MissingInput { ref name, .. } if name == "uv"));
        assert_eq!(err.code(), 0x103);
    }

    #[test]
    fn extra_element_fails() {
        let elements = packed_elements(&[
            (VertexSemantic::Position, VertexFormat::Float32x3),
            (VertexSemantic::Normal, VertexFormat::Float32x3),
            (VertexSemantic::TexCoord, VertexFormat::Float32x2),
            (VertexSemantic::Color, VertexFormat::Float32x4),
        ]);
        let err = match_vertex_layout(&textured_info(), &elements).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnexpectedElement {
                semantic: VertexSemantic::Color,
                input: "color",
            }
        );
        assert_eq!(err.code(), 0x104);
    }

    #[test]
    fn format_mismatch_fails_with_code() {
        let elements = packed_elements(&[
            (VertexSemantic::Position, VertexFormat::Float32x4),
            (VertexSemantic::Normal, VertexFormat::Float32x3),
            (VertexSemantic::TexCoord, VertexFormat::Float32x2),
        ]);
        let err = match_vertex_layout(&textured_info(), &elements).unwrap_err();
        assert!(matches!(err, LayoutError::FormatMismatch { .. }));
        assert_eq!(err.code(), 0x105);
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn shader_without_vertex_entry_fails() {
        let info = reflect(
            "@fragment fn fs() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();
        let err = match_vertex_layout(&info, &matching_elements()).unwrap_err();
        assert_eq!(err, LayoutError::NoVertexEntry);
        assert_eq!(err.code(), 0x102);
    }

    #[test]
    fn invalid_descriptor_array_fails_before_matching() {
        let err = match_vertex_layout(&textured_info(), &[]).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidElements(_)));
        assert_eq!(err.code(), 0x101);
    }

    #[test]
    fn error_codes_are_distinct() {
        let codes = [0x101, 0x102, 0x103, 0x104, 0x105, 0x106];
        let mut unique = codes.to_vec();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }
}
