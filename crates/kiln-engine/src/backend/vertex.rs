//! Vertex formats consumed by every backend.
//!
//! Layout on the device:
//! - location 0: position `Float32x3`
//! - location 1: color    `Float32x4`
//! - location 2: uv       `Float32x2` (textured only)

use bytemuck::{Pod, Zeroable};

use crate::paint::Color;

/// Untextured vertex: position + color.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ColoredVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl ColoredVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    #[inline]
    pub fn new(x: f32, y: f32, z: f32, color: Color) -> Self {
        Self {
            position: [x, y, z],
            color: color.to_array(),
        }
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColoredVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Textured vertex: position + color tint + texture coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl TexturedVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4, // color
        2 => Float32x2  // uv
    ];

    #[inline]
    pub fn new(x: f32, y: f32, z: f32, tint: Color, u: f32, v: f32) -> Self {
        Self {
            position: [x, y, z],
            color: tint.to_array(),
            uv: [u, v],
        }
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexturedVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Which vertex format a shader program consumes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexKind {
    Colored,
    Textured,
}

/// Primitive assembly for a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    TriangleList,
    LineList,
}

impl From<Topology> for wgpu::PrimitiveTopology {
    fn from(t: Topology) -> Self {
        match t {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// A vertex sequence submitted in one draw call.
///
/// The variant selects both the vertex format and the topology.
#[derive(Debug, Copy, Clone)]
pub enum VertexBatch<'a> {
    Triangles(&'a [ColoredVertex]),
    Lines(&'a [ColoredVertex]),
    Textured(&'a [TexturedVertex]),
}

impl VertexBatch<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            VertexBatch::Triangles(v) | VertexBatch::Lines(v) => v.len(),
            VertexBatch::Textured(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn kind(&self) -> VertexKind {
        match self {
            VertexBatch::Triangles(_) | VertexBatch::Lines(_) => VertexKind::Colored,
            VertexBatch::Textured(_) => VertexKind::Textured,
        }
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        match self {
            VertexBatch::Lines(_) => Topology::LineList,
            VertexBatch::Triangles(_) | VertexBatch::Textured(_) => Topology::TriangleList,
        }
    }

    /// Raw bytes in device layout.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VertexBatch::Triangles(v) | VertexBatch::Lines(v) => bytemuck::cast_slice(v),
            VertexBatch::Textured(v) => bytemuck::cast_slice(v),
        }
    }
}
