//! Command side of the shadow pass.
//!
//! The planner only talks to a [`ShadowPassBackend`]; whether that records
//! commands for inspection or drives a real GPU is chosen by the caller.

use glam::Mat4;

use crate::shadows::tiles::TileViewport;

/// Identifies the atlas texture acquired for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasHandle {
    pub id: u64,
    pub size: u32,
}

pub trait ShadowPassBackend {
    /// Allocates a square depth atlas and clears it.
    fn acquire_atlas(&mut self, size: u32) -> AtlasHandle;

    fn set_tile_viewport(&mut self, viewport: TileViewport);

    fn set_view_projection(&mut self, view: Mat4, proj: Mat4);

    /// Slope-scaled depth bias for subsequent caster draws.
    fn set_depth_bias(&mut self, slope_scale_bias: f32);

    /// Draws every caster of the light into the current tile.
    fn draw_shadow_casters(&mut self, visible_light_index: usize, blend_culling_factor: f32);

    /// Flushes recorded work so the atlas can be sampled.
    fn submit(&mut self);

    fn release_atlas(&mut self, handle: AtlasHandle);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShadowCommand {
    AcquireAtlas(AtlasHandle),
    SetViewport(TileViewport),
    SetViewProjection { view: Mat4, proj: Mat4 },
    SetDepthBias(f32),
    DrawShadows {
        visible_light_index: usize,
        blend_culling_factor: f32,
    },
    Submit,
    ReleaseAtlas(AtlasHandle),
}

/// Records every command instead of executing it.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<ShadowCommand>,
    next_id: u64,
    live: Vec<AtlasHandle>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[ShadowCommand] {
        &self.commands
    }

    /// Atlases acquired and not yet released.
    pub fn live_atlases(&self) -> &[AtlasHandle] {
        &self.live
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, ShadowCommand::DrawShadows { .. }))
            .count()
    }

    pub fn viewports(&self) -> impl Iterator<Item = &TileViewport> {
        self.commands.iter().filter_map(|c| match c {
            ShadowCommand::SetViewport(vp) => Some(vp),
            _ => None,
        })
    }
}

impl ShadowPassBackend for CommandRecorder {
    fn acquire_atlas(&mut self, size: u32) -> AtlasHandle {
        self.next_id += 1;
        let handle = AtlasHandle {
            id: self.next_id,
            size,
        };
        self.live.push(handle);
        self.commands.push(ShadowCommand::AcquireAtlas(handle));
        handle
    }

    fn set_tile_viewport(&mut self, viewport: TileViewport) {
        self.commands.push(ShadowCommand::SetViewport(viewport));
    }

    fn set_view_projection(&mut self, view: Mat4, proj: Mat4) {
        self.commands
            .push(ShadowCommand::SetViewProjection { view, proj });
    }

    fn set_depth_bias(&mut self, slope_scale_bias: f32) {
        self.commands.push(ShadowCommand::SetDepthBias(slope_scale_bias));
    }

    fn draw_shadow_casters(&mut self, visible_light_index: usize, blend_culling_factor: f32) {
        self.commands.push(ShadowCommand::DrawShadows {
            visible_light_index,
            blend_culling_factor,
        });
    }

    fn submit(&mut self) {
        self.commands.push(ShadowCommand::Submit);
    }

    fn release_atlas(&mut self, handle: AtlasHandle) {
        match self.live.iter().position(|h| *h == handle) {
            Some(i) => {
                self.live.swap_remove(i);
            }
            None => tracing::warn!("Releasing unknown shadow atlas {:?}", handle),
        }
        self.commands.push(ShadowCommand::ReleaseAtlas(handle));
    }
}
