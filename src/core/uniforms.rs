use bytemuck::{Pod, Zeroable};

use crate::constants::{MAX_ATLAS_TILES, MAX_CASCADES, MAX_DIRECTIONAL_LIGHTS};

/// Shadow parameters read by the lit shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ShadowGlobals {
    /// World to atlas-sample space, one per (light, cascade) tile
    pub dir_shadow_matrices: [[[f32; 4]; 4]; MAX_ATLAS_TILES],
    /// Center xyz + squared radius
    pub cascade_culling_spheres: [[f32; 4]; MAX_CASCADES],
    /// 1 / radius², filter footprint · √2
    pub cascade_data: [[f32; 4]; MAX_CASCADES],
    /// 1 / max distance, 1 / distance fade, 1 / (1 - f²)
    pub shadow_distance_fade: [f32; 4],
    /// Atlas size, 1 / atlas size
    pub shadow_atlas_size: [f32; 4],
    pub cascade_count: i32,
    /// Active PCF keyword index, -1 = none
    pub filter_mode: i32,
    /// Active cascade blend keyword index, -1 = none
    pub blend_mode: i32,
    pub _padding: i32,
}

impl ShadowGlobals {
    pub fn new() -> Self {
        let mut globals = Self::zeroed();
        globals.filter_mode = -1;
        globals.blend_mode = -1;
        globals
    }
}

impl Default for ShadowGlobals {
    fn default() -> Self {
        Self::new()
    }
}

/// Directional light block read by the lit shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightingGlobals {
    pub colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Direction towards the light, w unused
    pub directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Shadow strength, first tile index, normal bias
    pub shadow_data: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    pub directional_light_count: i32,
    pub _padding: [i32; 3],
}

impl LightingGlobals {
    pub fn zeroed_with_count(count: i32) -> Self {
        Self {
            directional_light_count: count,
            ..Self::zeroed()
        }
    }
}
