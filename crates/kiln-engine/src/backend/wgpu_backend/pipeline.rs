use crate::backend::{ColoredVertex, PipelineSettings, TexturedVertex, Topology, VertexKind};

/// Everything that selects a distinct render pipeline for one program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct PipelineKey {
    pub topology: Topology,
    pub blend: bool,
    pub depth_test: bool,
}

impl PipelineKey {
    pub fn new(topology: Topology, settings: PipelineSettings) -> Self {
        Self {
            topology,
            blend: settings.blend,
            depth_test: settings.depth_test,
        }
    }
}

/// Surface-side formats every pipeline targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct TargetFormats {
    pub color: wgpu::TextureFormat,
    pub depth: wgpu::TextureFormat,
}

/// Straight-alpha blending: `src * a + dst * (1 - a)`.
pub(crate) fn blend_state(enabled: bool) -> Option<wgpu::BlendState> {
    enabled.then_some(wgpu::BlendState::ALPHA_BLENDING)
}

/// Depth state for the shared depth attachment.
///
/// Every pipeline carries a depth attachment so that one render pass can mix
/// depth-tested and untested draws; untested draws neither compare nor write.
pub(crate) fn depth_state(format: wgpu::TextureFormat, depth_test: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format,
        depth_write_enabled: depth_test,
        depth_compare: if depth_test {
            wgpu::CompareFunction::LessEqual
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub(crate) struct PipelineStages<'a> {
    pub label: &'a str,
    pub layout: &'a wgpu::PipelineLayout,
    pub vertex_module: &'a wgpu::ShaderModule,
    pub vertex_entry: &'a str,
    pub fragment_module: &'a wgpu::ShaderModule,
    pub fragment_entry: &'a str,
    pub vertex_kind: VertexKind,
}

pub(crate) fn create_pipeline(
    device: &wgpu::Device,
    stages: &PipelineStages<'_>,
    key: PipelineKey,
    formats: TargetFormats,
) -> wgpu::RenderPipeline {
    let buffers = [match stages.vertex_kind {
        VertexKind::Colored => ColoredVertex::layout(),
        VertexKind::Textured => TexturedVertex::layout(),
    }];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(stages.label),
        layout: Some(stages.layout),
        vertex: wgpu::VertexState {
            module: stages.vertex_module,
            entry_point: Some(stages.vertex_entry),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: stages.fragment_module,
            entry_point: Some(stages.fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: formats.color,
                blend: blend_state(key.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: key.topology.into(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(depth_state(formats.depth, key.depth_test)),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_depth_test_never_rejects_or_writes() {
        let s = depth_state(wgpu::TextureFormat::Depth32Float, false);
        assert_eq!(s.depth_compare, wgpu::CompareFunction::Always);
        assert!(!s.depth_write_enabled);
    }

    #[test]
    fn enabled_depth_test_uses_less_equal() {
        let s = depth_state(wgpu::TextureFormat::Depth32Float, true);
        assert_eq!(s.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(s.depth_write_enabled);
    }

    #[test]
    fn blend_toggles_alpha_blending() {
        assert_eq!(blend_state(true), Some(wgpu::BlendState::ALPHA_BLENDING));
        assert_eq!(blend_state(false), None);
    }

    #[test]
    fn key_follows_settings() {
        let key = PipelineKey::new(
            Topology::LineList,
            PipelineSettings { blend: false, depth_test: true },
        );
        assert_eq!(key.topology, Topology::LineList);
        assert!(!key.blend && key.depth_test);
    }
}
