//! Clip space to atlas space.
//!
//! Shadow matrices leave the culling step in OpenGL clip convention (x, y, z in
//! `[-1, 1]`). Shading samples the atlas with `[0, 1]` coordinates restricted to
//! the cascade's tile, so the X and Y rows are scaled and offset into the tile
//! while Z is only remapped to `[0, 1]`.

use glam::{Mat4, Vec2};

/// Converts a world-to-clip matrix into world-to-atlas-sample space.
///
/// `reversed_z` flips the depth row so comparisons stay correct on backends that
/// clear depth to 0 and test with greater-than.
pub fn to_atlas_space(clip: Mat4, tile_offset: Vec2, split: u32, reversed_z: bool) -> Mat4 {
    let scale = 1.0 / split.max(1) as f32;

    let x = clip.row(0);
    let y = clip.row(1);
    let mut z = clip.row(2);
    let w = clip.row(3);
    if reversed_z {
        z = -z;
    }

    let x = (0.5 * (x + w) + tile_offset.x * w) * scale;
    let y = (0.5 * (y + w) + tile_offset.y * w) * scale;
    let z = 0.5 * (z + w);

    Mat4::from_cols(x, y, z, w).transpose()
}
