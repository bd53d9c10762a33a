//! WGSL validation and resource reflection.
//!
//! Programs are authored as two WGSL modules (vertex + fragment). Both are
//! parsed and validated with naga before any device object is created, so a
//! broken shader is reported as [`ShaderError`] instead of a device error.
//!
//! Binding conventions:
//! - group 0: `var<uniform> name: mat4x4<f32>` slots, any binding index
//! - group 1: `texture_2d<f32>` at binding 0 and `sampler` at binding 1
//!
//! A program whose modules declare a texture consumes `TexturedVertex`;
//! otherwise it consumes `ColoredVertex`.

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::VertexKind;

pub(crate) const UNIFORM_GROUP: u32 = 0;
pub(crate) const TEXTURE_GROUP: u32 = 1;
pub(crate) const TEXTURE_BINDING: u32 = 0;
pub(crate) const SAMPLER_BINDING: u32 = 1;

/// Size of one `mat4x4<f32>` uniform slot.
pub(crate) const MAT4_SIZE: u64 = 64;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Why a program could not be created.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    Parse { stage: ShaderStage, message: String },
    Validation { stage: ShaderStage, message: String },
    MissingEntryPoint { stage: ShaderStage },
    UnnamedUniform { binding: u32 },
    UnsupportedUniform { name: String },
    UnsupportedBinding { name: String, group: u32, binding: u32 },
    ConflictingUniform { binding: u32, first: String, second: String },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Parse { stage, message } => {
                write!(f, "{stage} shader failed to parse:\n{message}")
            }
            ShaderError::Validation { stage, message } => {
                write!(f, "{stage} shader failed validation:\n{message}")
            }
            ShaderError::MissingEntryPoint { stage } => {
                write!(f, "{stage} module has no {stage} entry point")
            }
            ShaderError::UnnamedUniform { binding } => {
                write!(f, "uniform at binding {binding} has no name")
            }
            ShaderError::UnsupportedUniform { name } => {
                write!(f, "uniform '{name}' is not a mat4x4<f32>")
            }
            ShaderError::UnsupportedBinding { name, group, binding } => {
                write!(f, "'{name}' uses unsupported slot @group({group}) @binding({binding})")
            }
            ShaderError::ConflictingUniform { binding, first, second } => {
                write!(f, "binding {binding} declared as both '{first}' and '{second}'")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// A named `mat4x4<f32>` uniform in group 0.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct UniformSlot {
    pub name: String,
    pub binding: u32,
}

/// Everything a backend needs to build pipelines for a program.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProgramLayout {
    pub vertex_kind: VertexKind,
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Sorted by binding index.
    pub uniforms: Vec<UniformSlot>,
}

impl ProgramLayout {
    #[inline]
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u.name == name)
    }
}

#[derive(Default)]
struct ModuleResources {
    uniforms: Vec<UniformSlot>,
    samples_texture: bool,
}

/// Parses, validates and reflects a vertex/fragment module pair.
pub(crate) fn reflect_program(
    vertex_src: &str,
    fragment_src: &str,
) -> Result<ProgramLayout, ShaderError> {
    let vertex = load_module(ShaderStage::Vertex, vertex_src)?;
    let fragment = load_module(ShaderStage::Fragment, fragment_src)?;

    let vertex_entry = entry_point(&vertex, ShaderStage::Vertex)?;
    let fragment_entry = entry_point(&fragment, ShaderStage::Fragment)?;

    let vs = module_resources(&vertex)?;
    let fs = module_resources(&fragment)?;

    let mut uniforms = vs.uniforms;
    for slot in fs.uniforms {
        match uniforms.iter().find(|u| u.binding == slot.binding) {
            Some(existing) if existing.name != slot.name => {
                return Err(ShaderError::ConflictingUniform {
                    binding: slot.binding,
                    first: existing.name.clone(),
                    second: slot.name,
                });
            }
            Some(_) => {}
            None => uniforms.push(slot),
        }
    }
    uniforms.sort_by_key(|u| u.binding);

    let vertex_kind = if vs.samples_texture || fs.samples_texture {
        VertexKind::Textured
    } else {
        VertexKind::Colored
    };

    Ok(ProgramLayout {
        vertex_kind,
        vertex_entry,
        fragment_entry,
        uniforms,
    })
}

fn load_module(stage: ShaderStage, src: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(src).map_err(|e| ShaderError::Parse {
        stage,
        message: e.emit_to_string(src),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| ShaderError::Validation {
            stage,
            message: e.emit_to_string(src),
        })?;

    Ok(module)
}

fn entry_point(module: &naga::Module, stage: ShaderStage) -> Result<String, ShaderError> {
    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted)
        .map(|ep| ep.name.clone())
        .ok_or(ShaderError::MissingEntryPoint { stage })
}

fn module_resources(module: &naga::Module) -> Result<ModuleResources, ShaderError> {
    let mut out = ModuleResources::default();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else { continue };
        let name = var.name.clone().unwrap_or_default();
        let unsupported = || ShaderError::UnsupportedBinding {
            name: name.clone(),
            group: binding.group,
            binding: binding.binding,
        };

        match var.space {
            naga::AddressSpace::Uniform => {
                if binding.group != UNIFORM_GROUP {
                    return Err(unsupported());
                }
                if name.is_empty() {
                    return Err(ShaderError::UnnamedUniform { binding: binding.binding });
                }
                let is_mat4 = matches!(
                    module.types[var.ty].inner,
                    naga::TypeInner::Matrix {
                        columns: naga::VectorSize::Quad,
                        rows: naga::VectorSize::Quad,
                        ..
                    }
                );
                if !is_mat4 {
                    return Err(ShaderError::UnsupportedUniform { name });
                }
                out.uniforms.push(UniformSlot {
                    name,
                    binding: binding.binding,
                });
            }
            naga::AddressSpace::Handle => match module.types[var.ty].inner {
                naga::TypeInner::Image { .. } => {
                    if binding.group != TEXTURE_GROUP || binding.binding != TEXTURE_BINDING {
                        return Err(unsupported());
                    }
                    out.samples_texture = true;
                }
                naga::TypeInner::Sampler { .. } => {
                    if binding.group != TEXTURE_GROUP || binding.binding != SAMPLER_BINDING {
                        return Err(unsupported());
                    }
                }
                _ => return Err(unsupported()),
            },
            _ => return Err(unsupported()),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders;

    #[test]
    fn flat_program_reflects_view_proj_uniform() {
        let layout = reflect_program(shaders::FLAT_VERTEX, shaders::FLAT_FRAGMENT).unwrap();
        assert_eq!(layout.vertex_kind, VertexKind::Colored);
        assert_eq!(layout.vertex_entry, "vs_main");
        assert_eq!(layout.fragment_entry, "fs_main");
        assert_eq!(
            layout.uniforms,
            vec![UniformSlot { name: "u_view_proj".into(), binding: 0 }]
        );
        assert!(layout.has_uniform("u_view_proj"));
        assert!(!layout.has_uniform("u_model"));
    }

    #[test]
    fn textured_program_is_detected_from_sampler() {
        let layout =
            reflect_program(shaders::TEXTURED_VERTEX, shaders::TEXTURED_FRAGMENT).unwrap();
        assert_eq!(layout.vertex_kind, VertexKind::Textured);
        assert_eq!(layout.uniforms.len(), 1);
    }

    #[test]
    fn syntax_error_is_a_parse_error() {
        let err = reflect_program("fn broken(", shaders::FLAT_FRAGMENT).unwrap_err();
        assert!(matches!(err, ShaderError::Parse { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn module_without_entry_point_is_rejected() {
        let err = reflect_program(shaders::FLAT_VERTEX, "fn helper() {}").unwrap_err();
        assert_eq!(err, ShaderError::MissingEntryPoint { stage: ShaderStage::Fragment });
    }

    #[test]
    fn non_matrix_uniform_is_rejected() {
        let vs = r#"
            @group(0) @binding(0) var<uniform> u_tint: vec4<f32>;

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(position, 1.0) * u_tint.x;
            }
        "#;
        let err = reflect_program(vs, shaders::FLAT_FRAGMENT).unwrap_err();
        assert_eq!(err, ShaderError::UnsupportedUniform { name: "u_tint".into() });
    }

    #[test]
    fn uniform_outside_group_zero_is_rejected() {
        let vs = r#"
            @group(2) @binding(0) var<uniform> u_view_proj: mat4x4<f32>;

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return u_view_proj * vec4<f32>(position, 1.0);
            }
        "#;
        let err = reflect_program(vs, shaders::FLAT_FRAGMENT).unwrap_err();
        assert!(matches!(err, ShaderError::UnsupportedBinding { group: 2, .. }));
    }
}
