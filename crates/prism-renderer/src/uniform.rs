//! GPU uniform data for the effect's transform parameter.

use glam::Mat4;

/// World-view-projection matrix as uploaded to the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub world_view_projection: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn new(matrix: Mat4) -> Self {
        Self {
            world_view_projection: matrix.to_cols_array_2d(),
        }
    }
}

impl Default for TransformUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

impl From<Mat4> for TransformUniform {
    fn from(matrix: Mat4) -> Self {
        Self::new(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let uniform = TransformUniform::default();
        assert_eq!(Mat4::from_cols_array_2d(&uniform.world_view_projection), Mat4::IDENTITY);
    }

    #[test]
    fn uniform_is_64_bytes() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
    }
}
