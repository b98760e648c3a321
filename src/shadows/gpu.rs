//! wgpu implementation of the shadow pass backend.
//!
//! Owns the Depth32Float atlas texture for the current frame and records one
//! render pass per tile, restricted to the tile's viewport. What gets drawn
//! into a tile is up to the [`ShadowCasterDrawer`] supplied by the caller.

use glam::Mat4;

use crate::error::{Result, ShadowError};
use crate::shadows::backend::{AtlasHandle, ShadowPassBackend};
use crate::shadows::tiles::TileViewport;

pub const SHADOW_ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[cfg_attr(rustfmt, rustfmt_skip)]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

#[cfg_attr(rustfmt, rustfmt_skip)]
const OPENGL_TO_WGPU_REVERSED_Z_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, -0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

/// Moves an OpenGL-convention clip matrix (z in `[-1, 1]`) into wgpu's `[0, 1]` depth,
/// flipped when `reversed_z`. Stored depth then equals the atlas matrix's z.
pub fn to_wgpu_clip(view_proj: Mat4, reversed_z: bool) -> Mat4 {
    if reversed_z {
        OPENGL_TO_WGPU_REVERSED_Z_MATRIX * view_proj
    } else {
        OPENGL_TO_WGPU_MATRIX * view_proj
    }
}

/// Per-tile draw parameters passed to the caster drawer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CasterDraw {
    pub visible_light_index: usize,
    /// World to wgpu clip space
    pub view_proj: Mat4,
    pub slope_scale_bias: f32,
    pub blend_culling_factor: f32,
}

pub trait ShadowCasterDrawer {
    fn draw(&mut self, pass: &mut wgpu::RenderPass<'_>, draw: &CasterDraw);
}

/// Drawer that leaves tiles cleared.
#[derive(Debug, Default)]
pub struct ClearOnly;

impl ShadowCasterDrawer for ClearOnly {
    fn draw(&mut self, _pass: &mut wgpu::RenderPass<'_>, _draw: &CasterDraw) {}
}

pub struct GpuShadowAtlas<D: ShadowCasterDrawer> {
    device: wgpu::Device,
    queue: wgpu::Queue,
    drawer: D,
    reversed_z: bool,

    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    encoder: Option<wgpu::CommandEncoder>,
    current: Option<AtlasHandle>,
    next_id: u64,

    viewport: Option<TileViewport>,
    view_proj: Mat4,
    slope_scale_bias: f32,
}

impl<D: ShadowCasterDrawer> GpuShadowAtlas<D> {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, drawer: D, reversed_z: bool) -> Self {
        Self {
            device,
            queue,
            drawer,
            reversed_z,
            texture: None,
            view: None,
            encoder: None,
            current: None,
            next_id: 0,
            viewport: None,
            view_proj: Mat4::IDENTITY,
            slope_scale_bias: 0.0,
        }
    }

    fn clear_depth(&self) -> f32 {
        if self.reversed_z { 0.0 } else { 1.0 }
    }
}

impl<D: ShadowCasterDrawer> ShadowPassBackend for GpuShadowAtlas<D> {
    fn acquire_atlas(&mut self, size: u32) -> AtlasHandle {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Directional Shadow Atlas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_ATLAS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Shadow Atlas Encoder"),
            });
        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Atlas Clear"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_depth()),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
        }

        self.next_id += 1;
        let handle = AtlasHandle {
            id: self.next_id,
            size,
        };
        tracing::debug!("Created shadow atlas {}x{} (#{})", size, size, handle.id);

        self.texture = Some(texture);
        self.view = Some(view);
        self.encoder = Some(encoder);
        self.current = Some(handle);
        self.viewport = None;
        handle
    }

    fn set_tile_viewport(&mut self, viewport: TileViewport) {
        self.viewport = Some(viewport);
    }

    fn set_view_projection(&mut self, view: Mat4, proj: Mat4) {
        self.view_proj = to_wgpu_clip(proj * view, self.reversed_z);
    }

    fn set_depth_bias(&mut self, slope_scale_bias: f32) {
        self.slope_scale_bias = slope_scale_bias;
    }

    fn draw_shadow_casters(&mut self, visible_light_index: usize, blend_culling_factor: f32) {
        let (Some(encoder), Some(view)) = (self.encoder.as_mut(), self.view.as_ref()) else {
            tracing::warn!("Shadow caster draw without an atlas");
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Tile Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        if let Some(vp) = self.viewport {
            pass.set_viewport(vp.x, vp.y, vp.size, vp.size, 0.0, 1.0);
        }

        let draw = CasterDraw {
            visible_light_index,
            view_proj: self.view_proj,
            slope_scale_bias: self.slope_scale_bias,
            blend_culling_factor,
        };
        self.drawer.draw(&mut pass, &draw);
    }

    fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    fn release_atlas(&mut self, handle: AtlasHandle) {
        if self.current != Some(handle) {
            tracing::warn!("Releasing shadow atlas {:?} that is not current", handle);
            return;
        }
        // Unsubmitted work would reference the texture
        self.submit();
        self.view = None;
        if let Some(texture) = self.texture.take() {
            texture.destroy();
        }
        self.current = None;
        tracing::trace!("Released shadow atlas #{}", handle.id);
    }
}

/// Requests a device without a surface, for offscreen atlas rendering.
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| ShadowError::Adapter(e.to_string()))?;

    let info = adapter.get_info();
    tracing::info!(
        "Selected adapter: {} on {:?} backend",
        info.name,
        info.backend
    );

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Shadow Atlas Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| ShadowError::Device(e.to_string()))
}
