use glam::Vec2;

/// How the square atlas is divided this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    /// Tiles per atlas row and column: 1, 2 or 4
    pub split: u32,
    /// Edge length of one tile in pixels
    pub tile_size: u32,
}

/// Pixel rectangle of one tile inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileViewport {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Picks the smallest split from {1, 2, 4} whose square holds `total_tiles`.
pub fn plan_layout(total_tiles: usize, atlas_size: u32) -> AtlasLayout {
    let split = match total_tiles {
        0..=1 => 1,
        2..=4 => 2,
        _ => 4,
    };
    AtlasLayout {
        split,
        tile_size: atlas_size / split,
    }
}

impl AtlasLayout {
    pub fn tile_count(&self) -> usize {
        (self.split * self.split) as usize
    }

    /// Column and row of a tile, in tile units.
    pub fn tile_offset(&self, tile_index: usize) -> Vec2 {
        let split = self.split as usize;
        Vec2::new((tile_index % split) as f32, (tile_index / split) as f32)
    }

    pub fn viewport(&self, tile_index: usize) -> TileViewport {
        let offset = self.tile_offset(tile_index) * self.tile_size as f32;
        TileViewport {
            x: offset.x,
            y: offset.y,
            size: self.tile_size as f32,
        }
    }
}
