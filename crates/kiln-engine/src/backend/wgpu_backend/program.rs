use std::collections::HashMap;
use std::num::NonZeroU64;

use glam::Mat4;

use crate::backend::reflect::MAT4_SIZE;
use crate::backend::{ProgramLayout, VertexKind};

use super::pipeline::{create_pipeline, PipelineKey, PipelineStages, TargetFormats};

/// A linked shader program and the pipelines built from it.
pub(crate) struct Program {
    label: String,
    layout: ProgramLayout,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    /// Group 0, one dynamic-offset entry per uniform.
    uniform_bgl: wgpu::BindGroupLayout,
    uniform_values: HashMap<String, Mat4>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Program {
    pub fn new(
        device: &wgpu::Device,
        label: String,
        layout: ProgramLayout,
        vertex_src: &str,
        fragment_src: &str,
        texture_bgl: &wgpu::BindGroupLayout,
    ) -> Self {
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
        });

        let entries: Vec<_> = layout
            .uniforms
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(MAT4_SIZE),
                },
                count: None,
            })
            .collect();
        // Group indices are fixed: a program without uniforms still gets an
        // (empty) group 0 so that textures stay in group 1.
        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln uniform bgl"),
            entries: &entries,
        });
        let groups: Vec<&wgpu::BindGroupLayout> = match layout.vertex_kind {
            VertexKind::Colored => vec![&uniform_bgl],
            VertexKind::Textured => vec![&uniform_bgl, texture_bgl],
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &groups,
            immediate_size: 0,
        });

        Self {
            label,
            layout,
            vertex_module,
            fragment_module,
            pipeline_layout,
            uniform_bgl,
            uniform_values: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    #[inline]
    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    #[inline]
    pub fn vertex_kind(&self) -> VertexKind {
        self.layout.vertex_kind
    }

    #[inline]
    pub fn uniform_bgl(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_bgl
    }

    /// Stores a uniform value. Returns `false` when the program has no such uniform.
    pub fn set_uniform(&mut self, name: &str, value: Mat4) -> bool {
        if !self.layout.has_uniform(name) {
            return false;
        }
        self.uniform_values.insert(name.to_string(), value);
        true
    }

    /// Current values in binding order; unset uniforms read as identity.
    pub fn uniform_block(&self) -> impl Iterator<Item = Mat4> + '_ {
        self.layout.uniforms.iter().map(|slot| {
            self.uniform_values
                .get(&slot.name)
                .copied()
                .unwrap_or(Mat4::IDENTITY)
        })
    }

    /// Builds the pipeline for `key` on first use.
    pub fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey, formats: TargetFormats) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("{}: building pipeline {key:?}", self.label);
        let stages = PipelineStages {
            label: &self.label,
            layout: &self.pipeline_layout,
            vertex_module: &self.vertex_module,
            vertex_entry: &self.layout.vertex_entry,
            fragment_module: &self.fragment_module,
            fragment_entry: &self.layout.fragment_entry,
            vertex_kind: self.layout.vertex_kind,
        };
        let pipeline = create_pipeline(device, &stages, key, formats);
        self.pipelines.insert(key, pipeline);
    }

    #[inline]
    pub fn pipeline(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&key)
    }
}
