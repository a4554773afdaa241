//! Shader binding contract
//!
//! An effect source must declare a fixed set of named bindings to be fully
//! usable. The contract is expressed as a table of required names mapped to
//! required kinds and is validated once when the effect is loaded, instead
//! of scattering string lookups through the renderer.

use serde::{Deserialize, Serialize};

/// The kind of shader binding a contract entry requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    /// A uniform holding a 4x4 float matrix.
    UniformMatrix,
    /// A 2D float texture.
    Texture2d,
    /// A filtering sampler.
    Sampler,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BindingKind::UniformMatrix => "uniform mat4x4<f32>",
            BindingKind::Texture2d => "texture_2d<f32>",
            BindingKind::Sampler => "sampler",
        };
        f.write_str(name)
    }
}

/// A single entry in the shader binding contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredBinding {
    /// Global variable name the shader must declare.
    pub name: &'static str,
    /// Kind the declaration must have.
    pub kind: BindingKind,
}

/// Name of the world-view-projection matrix uniform.
pub const WORLD_VIEW_PROJECTION: &str = "g_WorldViewProjection";

/// Name of the diffuse texture binding.
pub const DIFFUSE_MAP: &str = "g_DiffuseMap";

/// Name of the filtering sampler binding.
pub const DIFFUSE_SAMPLER: &str = "g_Sampler";

/// The bindings every effect source is expected to declare.
pub const SHADER_CONTRACT: [RequiredBinding; 3] = [
    RequiredBinding {
        name: WORLD_VIEW_PROJECTION,
        kind: BindingKind::UniformMatrix,
    },
    RequiredBinding {
        name: DIFFUSE_MAP,
        kind: BindingKind::Texture2d,
    },
    RequiredBinding {
        name: DIFFUSE_SAMPLER,
        kind: BindingKind::Sampler,
    },
];

/// A contract entry the loaded shader failed to satisfy.
///
/// Violations are recorded at load time and do not abort loading; the
/// operations depending on the missing binding degrade to guarded no-ops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("shader does not declare required binding '{name}' ({kind})")]
    Missing {
        name: &'static str,
        kind: BindingKind,
    },

    #[error("shader binding '{name}' has the wrong type (expected {expected})")]
    WrongKind {
        name: &'static str,
        expected: BindingKind,
    },
}

impl ContractViolation {
    /// Name of the contract entry this violation refers to.
    pub fn binding_name(&self) -> &'static str {
        match self {
            ContractViolation::Missing { name, .. } => name,
            ContractViolation::WrongKind { name, .. } => name,
        }
    }
}
