//! WGSL reflection
//!
//! Parses and validates effect source with naga and extracts the pieces the
//! effect wrapper needs: the declared resource bindings, the entry points,
//! and the vertex entry point's input signature.

use prism_core::VertexFormat;

/// Compile-stage failure, carrying the full compiler diagnostic text.
#[derive(Debug, thiserror::Error)]
pub enum ShaderCompileError {
    #[error("WGSL parse error:\n{0}")]
    Parse(String),

    #[error("shader validation error:\n{0}")]
    Validation(String),
}

/// Kind of a reflected global resource binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectedKind {
    /// `var<uniform>` holding a 4x4 float matrix (possibly struct-wrapped).
    UniformMatrix,
    /// `texture_2d<f32>`.
    Texture2d,
    /// Non-comparison `sampler`.
    Sampler,
    /// Anything else.
    Other,
}

/// One global resource binding declared by the shader.
#[derive(Debug, Clone)]
pub struct BindingInfo {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ReflectedKind,
}

/// One vertex shader input, flattened out of struct arguments.
#[derive(Debug, Clone)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    /// Vertex buffer format the input expects, or `None` for types that
    /// cannot be fed from a vertex buffer here (integers, matrices).
    pub format: Option<VertexFormat>,
}

/// Reflection summary of a validated effect source.
#[derive(Debug, Clone, Default)]
pub struct ShaderInfo {
    pub bindings: Vec<BindingInfo>,
    pub vertex_entry: Option<String>,
    pub fragment_entry: Option<String>,
    pub vertex_inputs: Vec<VertexInput>,
}

impl ShaderInfo {
    /// Looks up a resource binding by its global variable name.
    pub fn binding(&self, name: &str) -> Option<&BindingInfo> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Looks up a vertex input by name.
    pub fn vertex_input(&self, name: &str) -> Option<&VertexInput> {
        self.vertex_inputs.iter().find(|i| i.name == name)
    }
}

/// Parses and validates WGSL source, returning its reflection summary.
///
/// Full validation runs in debug builds; release builds skip the naga pass
/// and rely on the device-side validation that happens at module creation.
pub fn reflect(source: &str) -> Result<ShaderInfo, ShaderCompileError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderCompileError::Parse(e.emit_to_string(source)))?;

    let flags = if cfg!(debug_assertions) {
        naga::valid::ValidationFlags::all()
    } else {
        naga::valid::ValidationFlags::empty()
    };
    naga::valid::Validator::new(flags, naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|e| ShaderCompileError::Validation(e.emit_to_string(source)))?;

    Ok(summarize(&module))
}

fn summarize(module: &naga::Module) -> ShaderInfo {
    let mut info = ShaderInfo::default();

    for (_, var) in module.global_variables.iter() {
        let (Some(name), Some(res)) = (&var.name, &var.binding) else {
            continue;
        };
        info.bindings.push(BindingInfo {
            name: name.clone(),
            group: res.group,
            binding: res.binding,
            kind: classify(module, var),
        });
    }

    for entry in &module.entry_points {
        match entry.stage {
            naga::ShaderStage::Vertex if info.vertex_entry.is_none() => {
                info.vertex_entry = Some(entry.name.clone());
                info.vertex_inputs = vertex_inputs(module, entry);
            }
            naga::ShaderStage::Fragment if info.fragment_entry.is_none() => {
                info.fragment_entry = Some(entry.name.clone());
            }
            _ => {}
        }
    }

    info
}

fn classify(module: &naga::Module, var: &naga::GlobalVariable) -> ReflectedKind {
    let inner = &module.types[var.ty].inner;
    match (var.space, inner) {
        (naga::AddressSpace::Uniform, inner) if is_mat4(module, inner) => {
            ReflectedKind::UniformMatrix
        }
        (
            naga::AddressSpace::Handle,
            naga::TypeInner::Image {
                dim: naga::ImageDimension::D2,
                arrayed: false,
                class:
                    naga::ImageClass::Sampled {
                        kind: naga::ScalarKind::Float,
                        multi: false,
                    },
            },
        ) => ReflectedKind::Texture2d,
        (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison: false }) => {
            ReflectedKind::Sampler
        }
        _ => ReflectedKind::Other,
    }
}

/// A uniform qualifies as a matrix binding when it is a `mat4x4<f32>`, or a
/// struct whose only member is one.
fn is_mat4(module: &naga::Module, inner: &naga::TypeInner) -> bool {
    match inner {
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } => scalar.kind == naga::ScalarKind::Float && scalar.width == 4,
        naga::TypeInner::Struct { members, .. } => {
            members.len() == 1 && is_mat4(module, &module.types[members[0].ty].inner)
        }
        _ => false,
    }
}

fn vertex_inputs(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<VertexInput> {
    let mut inputs = Vec::new();

    for (index, arg) in entry.function.arguments.iter().enumerate() {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => {
                inputs.push(VertexInput {
                    name: arg
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("arg{index}")),
                    location: *location,
                    format: input_format(&module.types[arg.ty].inner),
                });
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                // Struct argument: flatten its located members.
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        let Some(naga::Binding::Location { location, .. }) = &member.binding
                        else {
                            continue;
                        };
                        inputs.push(VertexInput {
                            name: member.name.clone().unwrap_or_default(),
                            location: *location,
                            format: input_format(&module.types[member.ty].inner),
                        });
                    }
                }
            }
        }
    }

    inputs.sort_by_key(|i| i.location);
    inputs
}

fn input_format(inner: &naga::TypeInner) -> Option<VertexFormat> {
    let float = naga::Scalar {
        kind: naga::ScalarKind::Float,
        width: 4,
    };
    match inner {
        naga::TypeInner::Scalar(scalar) if *scalar == float => Some(VertexFormat::Float32),
        naga::TypeInner::Vector { size, scalar } if *scalar == float => match size {
            naga::VectorSize::Bi => Some(VertexFormat::Float32x2),
            naga::VectorSize::Tri => Some(VertexFormat::Float32x3),
            naga::VectorSize::Quad => Some(VertexFormat::Float32x4),
        },
        _ => None,
    }
}
