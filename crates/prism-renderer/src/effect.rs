//! Effect wrapper
//!
//! An effect is a validated WGSL shader bundle with a fixed binding
//! contract and three filtering techniques. Loading happens in two stages:
//! [`CompiledEffect`] parses, validates, and resolves the contract on the
//! CPU, and [`Effect`] turns it into GPU state (shader module, samplers,
//! bind group layouts, uniform buffer).
//!
//! Contract violations are recorded, not fatal: an effect with a missing
//! binding still loads, logs a warning, and the operations that depend on
//! the missing binding become guarded no-ops.

use std::path::{Path, PathBuf};

use glam::Mat4;
use wgpu::util::DeviceExt;

use prism_core::contract::{DIFFUSE_MAP, DIFFUSE_SAMPLER, WORLD_VIEW_PROJECTION};
use prism_core::{BindingKind, ContractViolation, FilteringMethod, SHADER_CONTRACT, VertexElement};

use crate::layout::{LayoutError, match_vertex_layout};
use crate::pipeline::PipelineConfig;
use crate::reflection::{ReflectedKind, ShaderCompileError, ShaderInfo, reflect};
use crate::texture::Texture;
use crate::uniform::TransformUniform;

/// Errors that abort effect loading.
///
/// Contract violations do not appear here; they are recorded on the loaded
/// effect so the caller can decide how severe a missing binding is.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("failed to read effect source '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] ShaderCompileError),
}

/// Resolved group/binding indices of a contract binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BindingSlot {
    group: u32,
    binding: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotRole {
    Transform,
    DiffuseMap,
    Sampler,
}

#[derive(Debug, Clone, Copy, Default)]
struct ResolvedBindings {
    world_view_projection: Option<BindingSlot>,
    diffuse_map: Option<BindingSlot>,
    sampler: Option<BindingSlot>,
}

impl ResolvedBindings {
    fn slots(&self) -> impl Iterator<Item = (SlotRole, BindingSlot)> + '_ {
        [
            (SlotRole::Transform, self.world_view_projection),
            (SlotRole::DiffuseMap, self.diffuse_map),
            (SlotRole::Sampler, self.sampler),
        ]
        .into_iter()
        .filter_map(|(role, slot)| slot.map(|s| (role, s)))
    }
}

fn kind_matches(reflected: ReflectedKind, required: BindingKind) -> bool {
    matches!(
        (reflected, required),
        (ReflectedKind::UniformMatrix, BindingKind::UniformMatrix)
            | (ReflectedKind::Texture2d, BindingKind::Texture2d)
            | (ReflectedKind::Sampler, BindingKind::Sampler)
    )
}

/// Checks the reflected bindings against the shader contract, once.
fn resolve(info: &ShaderInfo) -> (ResolvedBindings, Vec<ContractViolation>) {
    let mut resolved = ResolvedBindings::default();
    let mut violations = Vec::new();

    for required in SHADER_CONTRACT {
        let slot = match info.binding(required.name) {
            None => {
                violations.push(ContractViolation::Missing {
                    name: required.name,
                    kind: required.kind,
                });
                continue;
            }
            Some(found) if !kind_matches(found.kind, required.kind) => {
                violations.push(ContractViolation::WrongKind {
                    name: required.name,
                    expected: required.kind,
                });
                continue;
            }
            Some(found) => BindingSlot {
                group: found.group,
                binding: found.binding,
            },
        };

        match required.name {
            WORLD_VIEW_PROJECTION => resolved.world_view_projection = Some(slot),
            DIFFUSE_MAP => resolved.diffuse_map = Some(slot),
            DIFFUSE_SAMPLER => resolved.sampler = Some(slot),
            _ => {}
        }
    }

    (resolved, violations)
}

/// A parsed, validated effect source with its contract resolution.
///
/// This stage needs no GPU device and carries everything required to
/// create an [`Effect`].
#[derive(Debug)]
pub struct CompiledEffect {
    label: String,
    source: String,
    info: ShaderInfo,
    resolved: ResolvedBindings,
    violations: Vec<ContractViolation>,
}

impl CompiledEffect {
    /// Compiles effect source text.
    ///
    /// Compile and validation failures are returned (and logged with the
    /// full compiler diagnostic). Contract violations are recorded on the
    /// result instead.
    pub fn from_source(
        label: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, EffectError> {
        let label = label.into();
        let source = source.into();

        let info = match reflect(&source) {
            Ok(info) => info,
            Err(err) => {
                tracing::error!("failed to compile effect '{label}': {err}");
                return Err(err.into());
            }
        };

        let (resolved, violations) = resolve(&info);
        for violation in &violations {
            tracing::warn!("effect '{label}': {violation}");
        }
        if info.vertex_entry.is_none() {
            tracing::warn!("effect '{label}' has no vertex entry point, techniques are unusable");
        }

        Ok(Self {
            label,
            source,
            info,
            resolved,
            violations,
        })
    }

    /// Reads and compiles an effect source file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EffectError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!("failed to load effect from '{}': {e}", path.display());
            EffectError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "effect".to_owned());
        Self::from_source(label, source)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn info(&self) -> &ShaderInfo {
        &self.info
    }

    /// Contract violations recorded at compile time.
    pub fn violations(&self) -> &[ContractViolation] {
        &self.violations
    }

    /// True when every contract binding resolved.
    pub fn is_fully_bound(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_world_view_projection(&self) -> bool {
        self.resolved.world_view_projection.is_some()
    }

    pub fn has_diffuse_map(&self) -> bool {
        self.resolved.diffuse_map.is_some()
    }

    pub fn has_sampler(&self) -> bool {
        self.resolved.sampler.is_some()
    }
}

/// GPU-side effect state.
///
/// Owns the shader module, the per-technique samplers, the transform
/// uniform buffer, and the bind groups. The render pipeline is created by
/// [`Effect::build_input_layout`] once the host's vertex format is known.
pub struct Effect {
    label: String,
    module: wgpu::ShaderModule,
    info: ShaderInfo,
    resolved: ResolvedBindings,
    violations: Vec<ContractViolation>,
    filtering: FilteringMethod,
    technique_name: &'static str,
    samplers: [wgpu::Sampler; 3],
    uniform_buffer: Option<wgpu::Buffer>,
    group_layouts: Vec<wgpu::BindGroupLayout>,
    bind_groups: Vec<Option<wgpu::BindGroup>>,
    diffuse_view: Option<wgpu::TextureView>,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl Effect {
    /// Creates GPU state for a compiled effect.
    pub fn new(
        device: &wgpu::Device,
        compiled: &CompiledEffect,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&compiled.label),
            source: wgpu::ShaderSource::Wgsl(compiled.source.as_str().into()),
        });

        let samplers = FilteringMethod::ALL.map(|method| create_sampler(device, method));

        let uniform_buffer = compiled.resolved.world_view_projection.map(|_| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Transform Buffer", compiled.label)),
                contents: bytemuck::cast_slice(&[TransformUniform::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });

        let group_layouts = build_group_layouts(device, &compiled.label, &compiled.resolved);
        let bind_groups = (0..group_layouts.len()).map(|_| None).collect();

        let filtering = FilteringMethod::default();
        let mut effect = Self {
            label: compiled.label.clone(),
            module,
            info: compiled.info.clone(),
            resolved: compiled.resolved,
            violations: compiled.violations.clone(),
            filtering,
            technique_name: filtering.technique_name(),
            samplers,
            uniform_buffer,
            group_layouts,
            bind_groups,
            diffuse_view: None,
            color_format,
            depth_format,
            pipeline: None,
        };

        for group in 0..effect.group_layouts.len() as u32 {
            effect.rebuild_bind_group(device, group);
        }
        effect
    }

    /// Reads, compiles, and uploads an effect in one call.
    pub fn load(
        device: &wgpu::Device,
        path: impl AsRef<Path>,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Result<Self, EffectError> {
        let compiled = CompiledEffect::from_file(path)?;
        Ok(Self::new(device, &compiled, color_format, depth_format))
    }

    /// Matches the host vertex format against the shader signature and
    /// builds the render pipeline.
    ///
    /// On mismatch the error (with its numeric code) is logged and
    /// returned; the previously built pipeline, if any, is kept.
    pub fn build_input_layout(
        &mut self,
        device: &wgpu::Device,
        elements: &[VertexElement],
    ) -> Result<(), LayoutError> {
        let matched = match match_vertex_layout(&self.info, elements) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::error!(
                    code = err.code(),
                    "effect '{}': failed to build input layout: {err}",
                    self.label,
                );
                return Err(err);
            }
        };
        let Some(vertex_entry) = self.info.vertex_entry.as_deref() else {
            return Err(LayoutError::NoVertexEntry);
        };

        let layout_refs: Vec<&wgpu::BindGroupLayout> = self.group_layouts.iter().collect();
        let mut config = PipelineConfig::new(
            &self.label,
            &self.module,
            vertex_entry,
            self.color_format,
            &layout_refs,
        )
        .with_vertex_layouts(vec![matched.buffer_layout()]);
        if let Some(fragment_entry) = self.info.fragment_entry.as_deref() {
            config = config.with_fragment_entry(fragment_entry);
        }
        if let Some(depth_format) = self.depth_format {
            config = config.with_depth_format(depth_format);
        }

        let pipeline = config.build(device);
        self.pipeline = Some(pipeline);
        Ok(())
    }

    /// Uploads a world-view-projection matrix.
    ///
    /// No-op when the transform binding did not resolve.
    pub fn set_world_view_projection(&self, queue: &wgpu::Queue, matrix: Mat4) {
        let Some(buffer) = &self.uniform_buffer else {
            tracing::trace!(
                "effect '{}': transform binding unresolved, matrix update ignored",
                self.label,
            );
            return;
        };
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[TransformUniform::new(matrix)]));
    }

    /// Binds a texture as the diffuse map.
    ///
    /// No-op when the diffuse map binding did not resolve.
    pub fn set_diffuse_map(&mut self, device: &wgpu::Device, texture: &Texture) {
        if self.resolved.diffuse_map.is_none() {
            tracing::trace!(
                "effect '{}': diffuse map binding unresolved, texture ignored",
                self.label,
            );
            return;
        }
        self.diffuse_view = Some(texture.create_view());
        self.rebuild_groups_with_roles(device, &[SlotRole::DiffuseMap, SlotRole::Sampler]);
    }

    /// Advances the filtering mode Point -> Linear -> Anisotropic -> Point
    /// and re-resolves the active technique.
    ///
    /// Only the sampler state changes; the shader module, uniform buffer,
    /// and resolved bindings stay as they are.
    pub fn cycle_filtering_method(&mut self, device: &wgpu::Device) -> FilteringMethod {
        self.filtering = self.filtering.next();
        self.technique_name = self.filtering.technique_name();
        tracing::debug!(
            "effect '{}': switched to technique '{}'",
            self.label,
            self.technique_name,
        );
        self.rebuild_groups_with_roles(device, &[SlotRole::Sampler]);
        self.filtering
    }

    /// Sets the pipeline and bind groups on a render pass.
    ///
    /// Returns false when the effect is not ready to draw (no input layout
    /// built yet, or a bind group is incomplete because no texture is
    /// bound).
    pub fn apply<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) -> bool {
        let Some(pipeline) = &self.pipeline else {
            return false;
        };
        pass.set_pipeline(pipeline);

        let mut ready = true;
        for (index, bind_group) in self.bind_groups.iter().enumerate() {
            match bind_group {
                Some(bind_group) => pass.set_bind_group(index as u32, bind_group, &[]),
                None => ready = false,
            }
        }
        ready
    }

    pub fn filtering_method(&self) -> FilteringMethod {
        self.filtering
    }

    /// Name of the currently selected technique.
    pub fn technique_name(&self) -> &'static str {
        self.technique_name
    }

    pub fn violations(&self) -> &[ContractViolation] {
        &self.violations
    }

    pub fn has_input_layout(&self) -> bool {
        self.pipeline.is_some()
    }

    fn active_sampler(&self) -> &wgpu::Sampler {
        &self.samplers[self.filtering as usize]
    }

    fn rebuild_groups_with_roles(&mut self, device: &wgpu::Device, roles: &[SlotRole]) {
        let mut groups: Vec<u32> = self
            .resolved
            .slots()
            .filter(|(role, _)| roles.contains(role))
            .map(|(_, slot)| slot.group)
            .collect();
        groups.sort_unstable();
        groups.dedup();
        for group in groups {
            self.rebuild_bind_group(device, group);
        }
    }

    /// Recreates the bind group for one group index from current state.
    /// Groups whose texture slot has no bound view stay empty.
    fn rebuild_bind_group(&mut self, device: &wgpu::Device, group: u32) {
        let bind_group = {
            let mut entries = Vec::new();
            let mut complete = true;
            for (role, slot) in self.resolved.slots().filter(|(_, s)| s.group == group) {
                match role {
                    SlotRole::Transform => match &self.uniform_buffer {
                        Some(buffer) => entries.push(wgpu::BindGroupEntry {
                            binding: slot.binding,
                            resource: buffer.as_entire_binding(),
                        }),
                        None => complete = false,
                    },
                    SlotRole::DiffuseMap => match &self.diffuse_view {
                        Some(view) => entries.push(wgpu::BindGroupEntry {
                            binding: slot.binding,
                            resource: wgpu::BindingResource::TextureView(view),
                        }),
                        None => complete = false,
                    },
                    SlotRole::Sampler => entries.push(wgpu::BindGroupEntry {
                        binding: slot.binding,
                        resource: wgpu::BindingResource::Sampler(self.active_sampler()),
                    }),
                }
            }
            complete.then(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} Group {group}", self.label)),
                    layout: &self.group_layouts[group as usize],
                    entries: &entries,
                })
            })
        };
        self.bind_groups[group as usize] = bind_group;
    }
}

fn create_sampler(device: &wgpu::Device, method: FilteringMethod) -> wgpu::Sampler {
    let (filter, anisotropy) = match method {
        FilteringMethod::Point => (wgpu::FilterMode::Nearest, 1),
        FilteringMethod::Linear => (wgpu::FilterMode::Linear, 1),
        FilteringMethod::Anisotropic => (wgpu::FilterMode::Linear, 16),
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(method.technique_name()),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: filter,
        anisotropy_clamp: anisotropy,
        ..Default::default()
    })
}

fn build_group_layouts(
    device: &wgpu::Device,
    label: &str,
    resolved: &ResolvedBindings,
) -> Vec<wgpu::BindGroupLayout> {
    let group_count = resolved
        .slots()
        .map(|(_, slot)| slot.group + 1)
        .max()
        .unwrap_or(0);

    (0..group_count)
        .map(|group| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = resolved
                .slots()
                .filter(|(_, slot)| slot.group == group)
                .map(|(role, slot)| wgpu::BindGroupLayoutEntry {
                    binding: slot.binding,
                    visibility: match role {
                        SlotRole::Transform => wgpu::ShaderStages::VERTEX_FRAGMENT,
                        _ => wgpu::ShaderStages::FRAGMENT,
                    },
                    ty: match role {
                        SlotRole::Transform => wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        SlotRole::DiffuseMap => wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        SlotRole::Sampler => {
                            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                        }
                    },
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Group {group} Layout")),
                entries: &entries,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURED: &str = include_str!("shaders/textured.wgsl");

    const NO_DIFFUSE: &str = "
        @group(0) @binding(0) var<uniform> g_WorldViewProjection: mat4x4<f32>;

        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return g_WorldViewProjection * vec4<f32>(position, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0);
        }
    ";

    #[test]
    fn textured_effect_satisfies_the_contract() {
        let compiled = CompiledEffect::from_source("textured", TEXTURED).unwrap();
        assert!(compiled.is_fully_bound());
        assert!(compiled.has_world_view_projection());
        assert!(compiled.has_diffuse_map());
        assert!(compiled.has_sampler());
        assert_eq!(compiled.label(), "textured");
    }

    #[test]
    fn missing_diffuse_map_is_recorded_not_fatal() {
        let compiled = CompiledEffect::from_source("no_diffuse", NO_DIFFUSE).unwrap();
        assert!(!compiled.is_fully_bound());
        assert!(compiled.has_world_view_projection());
        assert!(!compiled.has_diffuse_map());
        assert!(!compiled.has_sampler());

        let names: Vec<&str> = compiled
            .violations()
            .iter()
            .map(|v| v.binding_name())
            .collect();
        assert_eq!(names, vec!["g_DiffuseMap", "g_Sampler"]);
    }

    #[test]
    fn wrongly_typed_binding_is_a_violation() {
        let source = "
            @group(0) @binding(0) var<uniform> g_WorldViewProjection: mat4x4<f32>;
            @group(1) @binding(0) var<uniform> g_DiffuseMap: vec4<f32>;
            @group(1) @binding(1) var g_Sampler: sampler;

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return g_WorldViewProjection * vec4<f32>(position, 1.0);
            }
        ";
        let compiled = CompiledEffect::from_source("wrong_kind", source).unwrap();
        assert!(!compiled.has_diffuse_map());
        assert!(compiled.violations().iter().any(|v| matches!(
            v,
            ContractViolation::WrongKind {
                name: "g_DiffuseMap",
                ..
            }
        )));
    }

    #[test]
    fn compile_failure_returns_the_diagnostic() {
        let err = CompiledEffect::from_source("broken", "@vertex fn vs(").unwrap_err();
        match err {
            EffectError::Compile(ShaderCompileError::Parse(message)) => {
                assert!(!message.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = CompiledEffect::from_file("does/not/exist.wgsl").unwrap_err();
        match err {
            EffectError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("does/not/exist.wgsl"));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn contract_resolution_uses_reflected_slots() {
        let compiled = CompiledEffect::from_source("textured", TEXTURED).unwrap();
        let wvp = compiled.resolved.world_view_projection.unwrap();
        assert_eq!((wvp.group, wvp.binding), (0, 0));
        let map = compiled.resolved.diffuse_map.unwrap();
        assert_eq!((map.group, map.binding), (1, 0));
        let sampler = compiled.resolved.sampler.unwrap();
        assert_eq!((sampler.group, sampler.binding), (1, 1));
    }
}
