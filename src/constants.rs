// Light limits
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

// Cascade limits
pub const MAX_CASCADES: usize = 4;
pub const MAX_CASCADE_RATIOS: usize = MAX_CASCADES - 1;
pub const MAX_ATLAS_TILES: usize = MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES;

// Atlas
pub const MIN_ATLAS_SIZE: u32 = 256;
pub const MAX_ATLAS_SIZE: u32 = 8192;
pub const PLACEHOLDER_ATLAS_SIZE: u32 = 1;

// Cascade fitting
/// Culling spheres are rounded up to this many steps per world unit.
pub const CASCADE_RADIUS_QUANTIZATION: f32 = 16.0;
/// Blend culling factor is `max(0, BASE - cascade_fade)`.
pub const CASCADE_BLEND_CULLING_BASE: f32 = 0.8;

// Fade guards
pub const MIN_CASCADE_FADE: f32 = 0.001;
pub const MIN_SHADOW_DISTANCE: f32 = 0.001;
pub const MIN_DISTANCE_FADE: f32 = 0.001;
