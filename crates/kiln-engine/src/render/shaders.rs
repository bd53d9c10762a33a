//! Bundled WGSL programs used by the primitive renderer.

/// Flat-color program: `ColoredVertex`, uniform `u_view_proj`.
pub const FLAT_VERTEX: &str = include_str!("shaders/flat.vert.wgsl");
pub const FLAT_FRAGMENT: &str = include_str!("shaders/flat.frag.wgsl");

/// Textured program: `TexturedVertex`, uniform `u_view_proj`, texture in group 1.
pub const TEXTURED_VERTEX: &str = include_str!("shaders/textured.vert.wgsl");
pub const TEXTURED_FRAGMENT: &str = include_str!("shaders/textured.frag.wgsl");

/// Name of the view-projection uniform both programs declare.
pub const VIEW_PROJ_UNIFORM: &str = "u_view_proj";
