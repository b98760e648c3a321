//! Cascade edge fade and distance fade parameters.

use glam::Vec4;

use crate::constants::{MIN_CASCADE_FADE, MIN_DISTANCE_FADE, MIN_SHADOW_DISTANCE};
use crate::utils::settings::{ShadowFilter, ShadowSettings};

/// Packed per-cascade values for the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeFade {
    /// Center in xyz, squared (shrunk) radius in w
    pub culling_sphere: Vec4,
    /// `(1 / radius², filter footprint · √2, 0, 0)`
    pub data: Vec4,
}

/// Shrinks a cascade sphere by the filter footprint and packs it for cheap shader tests.
pub fn cascade_fade_data(culling_sphere: Vec4, tile_size: f32, filter: ShadowFilter) -> CascadeFade {
    let texel_size = 2.0 * culling_sphere.w / tile_size.max(1.0);
    let filter_size = texel_size * filter.width();

    let radius = (culling_sphere.w - filter_size).max(0.0);
    let radius_sq = radius * radius;
    let inv_radius_sq = if radius_sq > 0.0 { 1.0 / radius_sq } else { 0.0 };

    CascadeFade {
        culling_sphere: culling_sphere.truncate().extend(radius_sq),
        data: Vec4::new(inv_radius_sq, filter_size * std::f32::consts::SQRT_2, 0.0, 0.0),
    }
}

/// `(1 / max distance, 1 / distance fade, 1 / (1 - f²), 0)` with `f = 1 - cascade fade`.
pub fn distance_fade(max_distance: f32, distance_fade: f32, cascade_fade: f32) -> Vec4 {
    let max_distance = if max_distance.is_finite() {
        max_distance.max(MIN_SHADOW_DISTANCE)
    } else {
        MIN_SHADOW_DISTANCE
    };
    let distance_fade = if distance_fade.is_finite() {
        distance_fade.max(MIN_DISTANCE_FADE)
    } else {
        MIN_DISTANCE_FADE
    };
    let cascade_fade = if cascade_fade.is_finite() {
        cascade_fade.clamp(MIN_CASCADE_FADE, 1.0)
    } else {
        1.0
    };

    let f = 1.0 - cascade_fade;
    Vec4::new(
        1.0 / max_distance,
        1.0 / distance_fade,
        1.0 / (1.0 - f * f),
        0.0,
    )
}

pub fn settings_distance_fade(settings: &ShadowSettings) -> Vec4 {
    distance_fade(
        settings.max_distance,
        settings.distance_fade,
        settings.directional.cascade_fade,
    )
}
