//! Prism effect renderer
//!
//! WGPU-based loading and management of shader effects: a validated WGSL
//! bundle with a fixed binding contract and cyclable texture-filtering
//! techniques.
//!
//! # Architecture
//!
//! - [`effect::CompiledEffect`] - CPU stage: parse, validate, resolve the
//!   binding contract
//! - [`effect::Effect`] - GPU stage: shader module, technique samplers,
//!   uniform buffer, bind groups, pipeline
//! - [`reflection`] - naga-based WGSL reflection
//! - [`layout`] - vertex element matching against the shader signature
//! - [`texture::Texture`] - diffuse map resources
//!
//! # Example
//!
//! ```ignore
//! use prism_core::vertex::packed_elements;
//! use prism_core::{VertexFormat, VertexSemantic};
//! use prism_renderer::Effect;
//!
//! let mut effect = Effect::load(&device, "assets/textured.wgsl", surface_format, None)?;
//! effect.build_input_layout(&device, &packed_elements(&[
//!     (VertexSemantic::Position, VertexFormat::Float32x3),
//!     (VertexSemantic::Normal, VertexFormat::Float32x3),
//!     (VertexSemantic::TexCoord, VertexFormat::Float32x2),
//! ]))?;
//!
//! effect.set_diffuse_map(&device, &texture);
//! effect.set_world_view_projection(&queue, world_view_projection);
//! effect.cycle_filtering_method(&device);
//!
//! // In the render pass:
//! effect.apply(&mut pass);
//! ```

pub mod effect;
pub mod layout;
pub mod pipeline;
pub mod reflection;
pub mod texture;
pub mod uniform;

pub use effect::{CompiledEffect, Effect, EffectError};
pub use layout::{LayoutError, MatchedLayout, match_vertex_layout};
pub use pipeline::PipelineConfig;
pub use reflection::{
    BindingInfo, ReflectedKind, ShaderCompileError, ShaderInfo, VertexInput, reflect,
};
pub use texture::{Texture, TextureError};
pub use uniform::TransformUniform;

/// Built-in effect source satisfying the full binding contract.
pub const TEXTURED_EFFECT: &str = include_str!("shaders/textured.wgsl");
