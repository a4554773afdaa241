//! Core data model for prism effects
//!
//! CPU-side types shared between the renderer and its consumers: the
//! texture filtering modes and their technique names, the shader binding
//! contract an effect source must satisfy, and the vertex element
//! descriptors used to build input layouts.

pub mod contract;
pub mod filtering;
pub mod vertex;

pub use contract::{BindingKind, ContractViolation, RequiredBinding, SHADER_CONTRACT};
pub use filtering::FilteringMethod;
pub use vertex::{VertexElement, VertexFormat, VertexLayoutError, VertexSemantic};
