//! Contract behavior across the compile stage and the core data model.

use prism_core::vertex::packed_elements;
use prism_core::{FilteringMethod, VertexFormat, VertexSemantic};
use prism_renderer::{CompiledEffect, LayoutError, TEXTURED_EFFECT, match_vertex_layout};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[test]
fn builtin_effect_loads_fully_bound() {
    init_tracing();
    let compiled = CompiledEffect::from_source("textured", TEXTURED_EFFECT).unwrap();
    assert!(compiled.is_fully_bound());
    assert!(compiled.violations().is_empty());
}

#[test]
fn effect_missing_texture_binding_still_loads() {
    init_tracing();
    let source = "
        @group(0) @binding(0) var<uniform> g_WorldViewProjection: mat4x4<f32>;

        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return g_WorldViewProjection * vec4<f32>(position, 1.0);
        }
    ";
    let compiled = CompiledEffect::from_source("untextured", source).unwrap();
    assert!(!compiled.is_fully_bound());
    assert!(compiled.has_world_view_projection());
    assert!(!compiled.has_diffuse_map());
}

#[test]
fn layout_mismatch_is_reported_with_a_code() {
    init_tracing();
    let compiled = CompiledEffect::from_source("textured", TEXTURED_EFFECT).unwrap();
    let elements = packed_elements(&[(VertexSemantic::Position, VertexFormat::Float32x3)]);
    let err = match_vertex_layout(compiled.info(), &elements).unwrap_err();
    assert!(matches!(err, LayoutError::MissingInput { .. }));
    assert_ne!(err.code(), 0);
}

#[test]
fn filtering_cycle_is_closed_over_the_three_techniques() {
    let mut mode = FilteringMethod::Point;
    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(mode.technique_name());
        mode = mode.next();
    }
    assert_eq!(mode, FilteringMethod::Point);
    assert_eq!(
        seen,
        vec!["FilterPoint", "FilterLinear", "FilterAnisotropic"]
    );
}
