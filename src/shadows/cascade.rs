//! Cascade matrices and the culling contract they come from.
//!
//! The planner never fits cascades itself. It asks a [`ShadowCasterCulling`]
//! snapshot (valid for one frame) for the view/projection pair and culling sphere
//! of each cascade slice.

use glam::{Mat4, Vec3, Vec4};

use crate::constants::{CASCADE_BLEND_CULLING_BASE, MAX_CASCADE_RATIOS};
use crate::render::frustum::AABB;

/// Everything the culling step needs to fit one cascade of one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeRequest {
    pub visible_light_index: usize,
    pub cascade_index: usize,
    pub cascade_count: usize,
    pub ratios: Vec3,
    /// Tile resolution in pixels, used for texel snapping
    pub tile_size: u32,
    pub near_plane_offset: f32,
    /// Casters fully covered by the previous cascade below this factor may be skipped
    pub blend_culling_factor: f32,
}

/// One fitted cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeSplit {
    pub view: Mat4,
    pub proj: Mat4,
    /// World-space center in xyz, radius in w
    pub culling_sphere: Vec4,
    pub blend_culling_factor: f32,
}

impl CascadeSplit {
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

/// Per-frame visibility results as seen by the shadow planner.
pub trait ShadowCasterCulling {
    /// World bounds of everything that can cast a shadow from this light, if anything does.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<AABB>;

    /// Fits the requested cascade, or `None` when the light cannot produce one.
    fn compute_directional_cascade(&self, request: &CascadeRequest) -> Option<CascadeSplit>;
}

/// Fraction of the shadow distance covered by a cascade: `[ratios[i-1] or 0, ratios[i] or 1]`.
pub fn cascade_depth_range(cascade_index: usize, cascade_count: usize, ratios: Vec3) -> (f32, f32) {
    let ratio = |i: usize| -> f32 {
        if i < MAX_CASCADE_RATIOS {
            ratios[i]
        } else {
            1.0
        }
    };
    let last = cascade_count.saturating_sub(1);
    let near = if cascade_index == 0 {
        0.0
    } else {
        ratio(cascade_index - 1)
    };
    let far = if cascade_index >= last {
        1.0
    } else {
        ratio(cascade_index)
    };
    (near, far)
}

pub fn blend_culling_factor(cascade_fade: f32) -> f32 {
    (CASCADE_BLEND_CULLING_BASE - cascade_fade).max(0.0)
}

/// Builds cascade requests for one light and forwards them to the culling snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CascadeComputer {
    pub cascade_count: usize,
    pub ratios: Vec3,
    pub tile_size: u32,
    pub blend_culling_factor: f32,
}

impl CascadeComputer {
    pub fn compute_cascade<C: ShadowCasterCulling + ?Sized>(
        &self,
        culling: &C,
        visible_light_index: usize,
        cascade_index: usize,
        near_plane_offset: f32,
    ) -> Option<CascadeSplit> {
        let request = CascadeRequest {
            visible_light_index,
            cascade_index,
            cascade_count: self.cascade_count,
            ratios: self.ratios,
            tile_size: self.tile_size,
            near_plane_offset,
            blend_culling_factor: self.blend_culling_factor,
        };
        culling.compute_directional_cascade(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cascade_covers_full_range() {
        let ratios = Vec3::new(0.1, 0.25, 0.5);
        assert_eq!(cascade_depth_range(0, 1, ratios), (0.0, 1.0));
    }

    #[test]
    fn test_cascades_partition_depth() {
        let ratios = Vec3::new(0.1, 0.25, 0.5);
        assert_eq!(cascade_depth_range(0, 4, ratios), (0.0, 0.1));
        assert_eq!(cascade_depth_range(1, 4, ratios), (0.1, 0.25));
        assert_eq!(cascade_depth_range(2, 4, ratios), (0.25, 0.5));
        assert_eq!(cascade_depth_range(3, 4, ratios), (0.5, 1.0));
    }

    #[test]
    fn test_last_cascade_spans_remainder() {
        let ratios = Vec3::new(0.5, 0.75, 0.9);
        assert_eq!(cascade_depth_range(1, 2, ratios), (0.5, 1.0));
    }

    #[test]
    fn test_blend_culling_factor_never_negative() {
        assert!((blend_culling_factor(0.1) - 0.7).abs() < 1e-6);
        assert_eq!(blend_culling_factor(1.0), 0.0);
    }
}
