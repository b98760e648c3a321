//! Per-frame directional shadow planning
//!
//! Call order for each camera: [`ShadowMapPlanner::reset`], then
//! [`ShadowMapPlanner::reserve_directional_light`] for every directional light,
//! then [`ShadowMapPlanner::render`] and finally [`ShadowMapPlanner::cleanup`].
//! All buffers are sized for the worst case up front and overwritten in place.

use glam::{Mat4, Vec3, Vec4};

use crate::constants::{
    MAX_ATLAS_TILES, MAX_CASCADES, MAX_SHADOWED_DIRECTIONAL_LIGHTS, PLACEHOLDER_ATLAS_SIZE,
};
use crate::core::uniforms::ShadowGlobals;
use crate::lighting::{Light, LightShadows};
use crate::shadows::atlas_matrix::to_atlas_space;
use crate::shadows::backend::{AtlasHandle, ShadowPassBackend};
use crate::shadows::cascade::{CascadeComputer, ShadowCasterCulling, blend_culling_factor};
use crate::shadows::fade::{cascade_fade_data, settings_distance_fade};
use crate::shadows::quality::ShadowQuality;
use crate::shadows::tiles::{AtlasLayout, plan_layout};
use crate::utils::settings::ShadowSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Idle,
    Reserving,
    Rendering,
    CleanedUp,
}

/// A light that was granted shadow tiles this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowedDirectionalLight {
    pub visible_light_index: usize,
    pub slope_scale_bias: f32,
    pub near_plane_offset: f32,
}

/// Shadow info handed to the light arrays right after reservation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectionalShadowData {
    pub strength: f32,
    /// Index of the light's first cascade tile
    pub tile_index: f32,
    pub normal_bias: f32,
}

impl DirectionalShadowData {
    /// Returned when a light gets no shadows.
    pub const NONE: Self = Self {
        strength: 0.0,
        tile_index: 0.0,
        normal_bias: 0.0,
    };

    pub fn is_shadowed(&self) -> bool {
        self.strength > 0.0
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.strength, self.tile_index, self.normal_bias)
    }

    pub fn to_vec4(self) -> Vec4 {
        self.to_vec3().extend(0.0)
    }
}

#[derive(Debug)]
pub struct ShadowMapPlanner {
    settings: ShadowSettings,
    reversed_z: bool,
    state: PlannerState,

    lights: [ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    light_count: usize,

    atlas_matrices: [Mat4; MAX_ATLAS_TILES],
    tile_count: usize,
    cascade_culling_spheres: [Vec4; MAX_CASCADES],
    cascade_data: [Vec4; MAX_CASCADES],
    sphere_count: usize,

    layout: Option<AtlasLayout>,
    distance_fade: Vec4,
    atlas_size: Vec4,
    quality: ShadowQuality,
    atlas: Option<AtlasHandle>,
}

impl ShadowMapPlanner {
    /// `reversed_z` must match the depth convention of the backend drawing the atlas.
    pub fn new(reversed_z: bool) -> Self {
        Self {
            settings: ShadowSettings::default(),
            reversed_z,
            state: PlannerState::CleanedUp,
            lights: [ShadowedDirectionalLight::default(); MAX_SHADOWED_DIRECTIONAL_LIGHTS],
            light_count: 0,
            atlas_matrices: [Mat4::IDENTITY; MAX_ATLAS_TILES],
            tile_count: 0,
            cascade_culling_spheres: [Vec4::ZERO; MAX_CASCADES],
            cascade_data: [Vec4::ZERO; MAX_CASCADES],
            sphere_count: 0,
            layout: None,
            distance_fade: Vec4::ZERO,
            atlas_size: Vec4::ZERO,
            quality: ShadowQuality::default(),
            atlas: None,
        }
    }

    /// Starts a new frame with `settings`.
    pub fn reset(&mut self, settings: &ShadowSettings) {
        if self.atlas.is_some() {
            tracing::warn!("Shadow planner reset before cleanup; atlas will be released on render");
        }
        self.settings = settings.validated();
        self.light_count = 0;
        self.tile_count = 0;
        self.cascade_culling_spheres[..self.sphere_count].fill(Vec4::ZERO);
        self.cascade_data[..self.sphere_count].fill(Vec4::ZERO);
        self.sphere_count = 0;
        self.layout = None;
        self.distance_fade = Vec4::ZERO;
        self.atlas_size = Vec4::ZERO;
        self.quality = ShadowQuality::default();
        self.state = PlannerState::Idle;
    }

    /// Tries to give `light` shadow tiles. Lights past the limit, with shadows off,
    /// zero strength or nothing to cast get [`DirectionalShadowData::NONE`].
    pub fn reserve_directional_light<C: ShadowCasterCulling + ?Sized>(
        &mut self,
        light: &Light,
        visible_light_index: usize,
        culling: &C,
    ) -> DirectionalShadowData {
        if !matches!(self.state, PlannerState::Idle | PlannerState::Reserving) {
            tracing::warn!(
                "Shadow reservation for light {} outside reservation phase ({:?})",
                visible_light_index,
                self.state
            );
            return DirectionalShadowData::NONE;
        }
        self.state = PlannerState::Reserving;

        if self.light_count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS
            || light.shadows == LightShadows::None
            || light.shadow_strength <= 0.0
            || culling.shadow_caster_bounds(visible_light_index).is_none()
        {
            return DirectionalShadowData::NONE;
        }

        let index = self.light_count;
        self.lights[index] = ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.shadow_bias,
            near_plane_offset: light.shadow_near_plane,
        };
        self.light_count += 1;

        DirectionalShadowData {
            strength: light.shadow_strength,
            tile_index: (self.settings.cascade_count() * index) as f32,
            normal_bias: light.shadow_normal_bias,
        }
    }

    /// Draws every reserved cascade into the atlas and fills the shading parameters.
    pub fn render<C, B>(&mut self, culling: &C, backend: &mut B)
    where
        C: ShadowCasterCulling + ?Sized,
        B: ShadowPassBackend + ?Sized,
    {
        if !matches!(self.state, PlannerState::Idle | PlannerState::Reserving) {
            tracing::warn!("Shadow render called in state {:?}", self.state);
        }
        if let Some(stale) = self.atlas.take() {
            backend.release_atlas(stale);
        }
        self.state = PlannerState::Rendering;

        if self.light_count == 0 {
            // Keep the atlas binding valid for shaders that always sample it
            self.atlas = Some(backend.acquire_atlas(PLACEHOLDER_ATLAS_SIZE));
            backend.submit();
            return;
        }

        let atlas_size = self.settings.directional.atlas_size;
        self.atlas = Some(backend.acquire_atlas(atlas_size));

        let cascade_count = self.settings.cascade_count();
        self.tile_count = self.light_count * cascade_count;
        let layout = plan_layout(self.tile_count, atlas_size);
        self.layout = Some(layout);
        tracing::debug!(
            "Shadow atlas {}px: {} lights x {} cascades, split {}, tile {}px",
            atlas_size,
            self.light_count,
            cascade_count,
            layout.split,
            layout.tile_size
        );

        let computer = CascadeComputer {
            cascade_count,
            ratios: self.settings.cascade_ratios(),
            tile_size: layout.tile_size,
            blend_culling_factor: blend_culling_factor(self.settings.directional.cascade_fade),
        };

        for light_index in 0..self.light_count {
            self.render_directional_light(light_index, &computer, layout, culling, backend);
        }

        self.distance_fade = settings_distance_fade(&self.settings);
        self.quality = ShadowQuality::select(
            self.settings.directional.filter,
            self.settings.directional.cascade_blend,
        );
        self.atlas_size = Vec4::new(atlas_size as f32, 1.0 / atlas_size as f32, 0.0, 0.0);
        backend.submit();
    }

    fn render_directional_light<C, B>(
        &mut self,
        light_index: usize,
        computer: &CascadeComputer,
        layout: AtlasLayout,
        culling: &C,
        backend: &mut B,
    ) where
        C: ShadowCasterCulling + ?Sized,
        B: ShadowPassBackend + ?Sized,
    {
        let light = self.lights[light_index];
        let first_tile = light_index * computer.cascade_count;

        for cascade_index in 0..computer.cascade_count {
            let tile_index = first_tile + cascade_index;
            let Some(split) = computer.compute_cascade(
                culling,
                light.visible_light_index,
                cascade_index,
                light.near_plane_offset,
            ) else {
                tracing::debug!(
                    "No cascade {} for light {}, tile {} left empty",
                    cascade_index,
                    light.visible_light_index,
                    tile_index
                );
                self.atlas_matrices[tile_index] = Mat4::ZERO;
                if light_index == 0 {
                    self.cascade_culling_spheres[cascade_index] = Vec4::ZERO;
                    self.cascade_data[cascade_index] = Vec4::ZERO;
                }
                continue;
            };

            // Cascade spheres are shared by every light, so only the first one records them
            if light_index == 0 {
                let fade = cascade_fade_data(
                    split.culling_sphere,
                    layout.tile_size as f32,
                    self.settings.directional.filter,
                );
                self.cascade_culling_spheres[cascade_index] = fade.culling_sphere;
                self.cascade_data[cascade_index] = fade.data;
                self.sphere_count = self.sphere_count.max(cascade_index + 1);
            }

            let viewport = layout.viewport(tile_index);
            backend.set_tile_viewport(viewport);
            self.atlas_matrices[tile_index] = to_atlas_space(
                split.view_proj(),
                layout.tile_offset(tile_index),
                layout.split,
                self.reversed_z,
            );

            backend.set_view_projection(split.view, split.proj);
            backend.set_depth_bias(light.slope_scale_bias);
            backend.draw_shadow_casters(light.visible_light_index, split.blend_culling_factor);
            backend.set_depth_bias(0.0);
        }
    }

    /// Releases the atlas acquired by [`Self::render`].
    pub fn cleanup<B: ShadowPassBackend + ?Sized>(&mut self, backend: &mut B) {
        match self.atlas.take() {
            Some(handle) => backend.release_atlas(handle),
            None => tracing::warn!("Shadow cleanup without an atlas ({:?})", self.state),
        }
        self.state = PlannerState::CleanedUp;
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn reserved_light_count(&self) -> usize {
        self.light_count
    }

    pub fn reserved_lights(&self) -> &[ShadowedDirectionalLight] {
        &self.lights[..self.light_count]
    }

    pub fn layout(&self) -> Option<AtlasLayout> {
        self.layout
    }

    pub fn atlas(&self) -> Option<AtlasHandle> {
        self.atlas
    }

    pub fn atlas_matrices(&self) -> &[Mat4] {
        &self.atlas_matrices[..self.tile_count]
    }

    pub fn cascade_culling_spheres(&self) -> &[Vec4] {
        &self.cascade_culling_spheres[..self.sphere_count]
    }

    pub fn cascade_data(&self) -> &[Vec4] {
        &self.cascade_data[..self.sphere_count]
    }

    pub fn distance_fade(&self) -> Vec4 {
        self.distance_fade
    }

    pub fn quality(&self) -> ShadowQuality {
        self.quality
    }

    /// Packs the current frame's parameters; unused slots stay zeroed.
    pub fn globals(&self) -> ShadowGlobals {
        let mut globals = ShadowGlobals::new();
        for (dst, m) in globals.dir_shadow_matrices.iter_mut().zip(self.atlas_matrices()) {
            *dst = m.to_cols_array_2d();
        }
        for (dst, s) in globals
            .cascade_culling_spheres
            .iter_mut()
            .zip(self.cascade_culling_spheres())
        {
            *dst = s.to_array();
        }
        for (dst, d) in globals.cascade_data.iter_mut().zip(self.cascade_data()) {
            *dst = d.to_array();
        }
        globals.cascade_count = if self.light_count > 0 {
            self.settings.directional.cascade_count as i32
        } else {
            0
        };
        globals.shadow_distance_fade = self.distance_fade.to_array();
        globals.shadow_atlas_size = self.atlas_size.to_array();
        let (filter, blend) = self.quality.shader_indices();
        globals.filter_mode = filter;
        globals.blend_mode = blend;
        globals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frustum::AABB;
    use crate::shadows::backend::{CommandRecorder, ShadowCommand};
    use crate::shadows::cascade::{CascadeRequest, CascadeSplit};
    use crate::utils::settings::{CascadeBlend, ShadowFilter};

    /// Every light casts; cascade i gets a sphere of radius 10 * (i + 1).
    struct FixedCulling {
        without_casters: Option<usize>,
    }

    impl FixedCulling {
        fn all() -> Self {
            Self { without_casters: None }
        }
    }

    impl ShadowCasterCulling for FixedCulling {
        fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<AABB> {
            if self.without_casters == Some(visible_light_index) {
                return None;
            }
            Some(AABB::new(Vec3::splat(-10.0), Vec3::splat(10.0)))
        }

        fn compute_directional_cascade(&self, request: &CascadeRequest) -> Option<CascadeSplit> {
            let radius = 10.0 * (request.cascade_index + 1) as f32;
            Some(CascadeSplit {
                view: Mat4::IDENTITY,
                proj: Mat4::orthographic_rh_gl(-radius, radius, -radius, radius, 0.0, 100.0),
                culling_sphere: Vec4::new(0.0, 0.0, -radius, radius),
                blend_culling_factor: request.blend_culling_factor,
            })
        }
    }

    fn settings(cascades: u32, filter: ShadowFilter, blend: CascadeBlend) -> ShadowSettings {
        let mut s = ShadowSettings::default();
        s.directional.atlas_size = 1024;
        s.directional.cascade_count = cascades;
        s.directional.cascade_ratios = [0.5, 0.75, 0.9];
        s.directional.filter = filter;
        s.directional.cascade_blend = blend;
        s
    }

    fn light() -> Light {
        Light::directional_with_shadows()
    }

    #[test]
    fn test_reservation_bases_follow_order() {
        let culling = FixedCulling::all();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(3, ShadowFilter::Disabled, CascadeBlend::Hard));

        for n in 0..4 {
            let data = planner.reserve_directional_light(&light(), n + 10, &culling);
            assert_eq!(data.tile_index, (n * 3) as f32);
            assert_eq!(data.strength, 1.0);
            assert_eq!(data.normal_bias, light().shadow_normal_bias);
        }
        assert_eq!(planner.state(), PlannerState::Reserving);
    }

    #[test]
    fn test_fifth_light_is_rejected() {
        let culling = FixedCulling::all();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(2, ShadowFilter::Disabled, CascadeBlend::Hard));
        for n in 0..4 {
            assert!(planner.reserve_directional_light(&light(), n, &culling).is_shadowed());
        }
        let before: Vec<_> = planner.reserved_lights().to_vec();

        let fifth = planner.reserve_directional_light(&light(), 4, &culling);
        assert_eq!(fifth, DirectionalShadowData::NONE);
        assert_eq!(planner.reserved_light_count(), 4);
        assert_eq!(planner.reserved_lights(), before.as_slice());
    }

    #[test]
    fn test_unshadowed_lights_get_sentinel() {
        let culling = FixedCulling {
            without_casters: Some(2),
        };
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&ShadowSettings::default());

        let mut off = light();
        off.shadows = LightShadows::None;
        let mut weak = light();
        weak.shadow_strength = 0.0;

        assert_eq!(planner.reserve_directional_light(&off, 0, &culling), DirectionalShadowData::NONE);
        assert_eq!(planner.reserve_directional_light(&weak, 1, &culling), DirectionalShadowData::NONE);
        assert_eq!(planner.reserve_directional_light(&light(), 2, &culling), DirectionalShadowData::NONE);
        assert_eq!(planner.reserved_light_count(), 0);

        // A rejected light does not consume an index
        let ok = planner.reserve_directional_light(&light(), 3, &culling);
        assert_eq!(ok.tile_index, 0.0);
    }

    #[test]
    fn test_two_lights_two_cascades_end_to_end() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(2, ShadowFilter::Medium, CascadeBlend::Soft));
        planner.reserve_directional_light(&light(), 0, &culling);
        planner.reserve_directional_light(&light(), 1, &culling);

        planner.render(&culling, &mut backend);
        assert_eq!(planner.state(), PlannerState::Rendering);

        let layout = planner.layout().unwrap();
        assert_eq!(layout.split, 2);
        assert_eq!(layout.tile_size, 512);
        assert_eq!(planner.atlas_matrices().len(), 4);
        assert_eq!(backend.draw_count(), 4);

        let quality = planner.quality();
        assert_eq!(quality.filter_flags(), [false, true, false]);
        assert_eq!(quality.blend_flags(), [false, true, false]);

        // Each tile gets its own quadrant
        let origins: Vec<(f32, f32)> = backend.viewports().map(|vp| (vp.x, vp.y)).collect();
        assert_eq!(origins, vec![(0.0, 0.0), (512.0, 0.0), (0.0, 512.0), (512.0, 512.0)]);

        assert_eq!(planner.cascade_culling_spheres().len(), 2);
        let globals = planner.globals();
        assert_eq!(globals.cascade_count, 2);
        assert_eq!(globals.shadow_atlas_size[0], 1024.0);
        assert_eq!((globals.filter_mode, globals.blend_mode), (1, 1));

        let handle = planner.atlas().unwrap();
        assert_eq!(handle.size, 1024);
        planner.cleanup(&mut backend);
        assert!(backend.live_atlases().is_empty());
        assert_eq!(planner.state(), PlannerState::CleanedUp);
    }

    #[test]
    fn test_atlas_matrices_sample_their_own_tile() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(2, ShadowFilter::Disabled, CascadeBlend::Hard));
        planner.reserve_directional_light(&light(), 0, &culling);
        planner.reserve_directional_light(&light(), 1, &culling);
        planner.render(&culling, &mut backend);

        for (tile, m) in planner.atlas_matrices().iter().enumerate() {
            let p = *m * Vec4::new(0.0, 0.0, -5.0, 1.0);
            let expected_x = 0.25 + 0.5 * (tile % 2) as f32;
            let expected_y = 0.25 + 0.5 * (tile / 2) as f32;
            assert!((p.x / p.w - expected_x).abs() < 1e-5, "tile {tile}: {p:?}");
            assert!((p.y / p.w - expected_y).abs() < 1e-5, "tile {tile}: {p:?}");
        }
    }

    #[test]
    fn test_depth_bias_wraps_each_draw() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(1, ShadowFilter::Disabled, CascadeBlend::Hard));
        let mut biased = light();
        biased.shadow_bias = 0.3;
        planner.reserve_directional_light(&biased, 0, &culling);
        planner.render(&culling, &mut backend);

        let cmds = backend.commands();
        let draw = cmds
            .iter()
            .position(|c| matches!(c, ShadowCommand::DrawShadows { .. }))
            .unwrap();
        assert_eq!(cmds[draw - 1], ShadowCommand::SetDepthBias(0.3));
        assert_eq!(cmds[draw + 1], ShadowCommand::SetDepthBias(0.0));
    }

    #[test]
    fn test_zero_lights_use_placeholder_atlas() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&ShadowSettings::default());
        planner.render(&culling, &mut backend);

        let handle = planner.atlas().unwrap();
        assert_eq!(handle.size, 1);
        assert_eq!(backend.live_atlases(), &[handle]);
        assert!(planner.atlas_matrices().is_empty());
        assert_eq!(planner.globals().cascade_count, 0);

        planner.cleanup(&mut backend);
        assert!(backend.live_atlases().is_empty());
        let releases = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, ShadowCommand::ReleaseAtlas(h) if *h == handle))
            .count();
        assert_eq!(releases, 1);
    }

    #[test]
    fn test_fade_data_only_from_first_light() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(4, ShadowFilter::Disabled, CascadeBlend::Hard));
        for n in 0..3 {
            planner.reserve_directional_light(&light(), n, &culling);
        }
        planner.render(&culling, &mut backend);

        assert_eq!(planner.atlas_matrices().len(), 12);
        assert_eq!(planner.layout().unwrap().split, 4);
        let spheres = planner.cascade_culling_spheres();
        assert_eq!(spheres.len(), 4);
        for (i, s) in spheres.iter().enumerate() {
            let r = 10.0 * (i + 1) as f32;
            let footprint = 2.0 * r / 256.0;
            assert!((s.w - (r - footprint).powi(2)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_next_frame_overwrites_state() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);

        planner.reset(&settings(4, ShadowFilter::High, CascadeBlend::Dither));
        for n in 0..4 {
            planner.reserve_directional_light(&light(), n, &culling);
        }
        planner.render(&culling, &mut backend);
        planner.cleanup(&mut backend);
        assert_eq!(planner.atlas_matrices().len(), 16);

        planner.reset(&settings(1, ShadowFilter::Disabled, CascadeBlend::Disabled));
        assert_eq!(planner.state(), PlannerState::Idle);
        assert!(planner.atlas_matrices().is_empty());
        planner.reserve_directional_light(&light(), 0, &culling);
        planner.render(&culling, &mut backend);
        assert_eq!(planner.atlas_matrices().len(), 1);
        assert_eq!(planner.layout().unwrap().split, 1);
        assert_eq!(planner.quality(), ShadowQuality::default());
        planner.cleanup(&mut backend);
        assert!(backend.live_atlases().is_empty());
    }

    #[test]
    fn test_missed_cleanup_releases_stale_atlas() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);

        planner.reset(&ShadowSettings::default());
        planner.render(&culling, &mut backend);
        planner.reset(&ShadowSettings::default());
        planner.render(&culling, &mut backend);
        assert_eq!(backend.live_atlases().len(), 1);

        planner.cleanup(&mut backend);
        planner.cleanup(&mut backend);
        assert!(backend.live_atlases().is_empty());
    }

    /// Cascade fitting that can be told to fail for one cascade.
    struct ScriptedCulling {
        radius: f32,
        failing_cascade: Option<usize>,
    }

    impl ShadowCasterCulling for ScriptedCulling {
        fn shadow_caster_bounds(&self, _: usize) -> Option<AABB> {
            Some(AABB::new(Vec3::splat(-10.0), Vec3::splat(10.0)))
        }

        fn compute_directional_cascade(&self, request: &CascadeRequest) -> Option<CascadeSplit> {
            if self.failing_cascade == Some(request.cascade_index) {
                return None;
            }
            let r = self.radius;
            Some(CascadeSplit {
                view: Mat4::IDENTITY,
                proj: Mat4::orthographic_rh_gl(-r, r, -r, r, 0.0, 100.0),
                culling_sphere: Vec4::new(0.0, 0.0, -r, r),
                blend_culling_factor: request.blend_culling_factor,
            })
        }
    }

    #[test]
    fn test_failed_cascade_does_not_expose_previous_sphere() {
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        let frame_settings = settings(2, ShadowFilter::Disabled, CascadeBlend::Hard);

        let wide = ScriptedCulling { radius: 99.0, failing_cascade: None };
        planner.reset(&frame_settings);
        planner.reserve_directional_light(&light(), 0, &wide);
        planner.render(&wide, &mut backend);
        planner.cleanup(&mut backend);
        assert!(planner.cascade_culling_spheres()[0].w > 9000.0);

        let narrow = ScriptedCulling { radius: 5.0, failing_cascade: Some(0) };
        planner.reset(&frame_settings);
        planner.reserve_directional_light(&light(), 0, &narrow);
        planner.render(&narrow, &mut backend);

        let spheres = planner.cascade_culling_spheres();
        assert_eq!(spheres.len(), 2);
        assert_eq!(spheres[0], Vec4::ZERO);
        assert_eq!(planner.cascade_data()[0], Vec4::ZERO);
        assert!(spheres[1].w > 0.0 && spheres[1].w < 25.0);
        assert_eq!(planner.atlas_matrices()[0], Mat4::ZERO);

        let globals = planner.globals();
        assert_eq!(globals.cascade_culling_spheres[0], [0.0; 4]);
        assert_eq!(globals.cascade_data[0], [0.0; 4]);
        planner.cleanup(&mut backend);
    }

    #[test]
    fn test_reset_clears_previous_spheres() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&settings(4, ShadowFilter::Disabled, CascadeBlend::Hard));
        planner.reserve_directional_light(&light(), 0, &culling);
        planner.render(&culling, &mut backend);
        planner.cleanup(&mut backend);

        planner.reset(&settings(4, ShadowFilter::Disabled, CascadeBlend::Hard));
        assert!(planner.cascade_culling_spheres().is_empty());
        assert_eq!(planner.globals().cascade_culling_spheres, [[0.0; 4]; 4]);
    }

    #[test]
    fn test_reserve_after_render_is_refused() {
        let culling = FixedCulling::all();
        let mut backend = CommandRecorder::new();
        let mut planner = ShadowMapPlanner::new(false);
        planner.reset(&ShadowSettings::default());
        planner.render(&culling, &mut backend);
        let late = planner.reserve_directional_light(&light(), 0, &culling);
        assert_eq!(late, DirectionalShadowData::NONE);
        assert_eq!(planner.reserved_light_count(), 0);
    }
}
