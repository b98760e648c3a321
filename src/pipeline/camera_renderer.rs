use crate::core::uniforms::{LightingGlobals, ShadowGlobals};
use crate::lighting::{LightCollector, VisibleLight};
use crate::pipeline::diagnostics::{FrameDiagnostics, NoDiagnostics};
use crate::shadows::backend::ShadowPassBackend;
use crate::shadows::cascade::ShadowCasterCulling;
use crate::shadows::planner::ShadowMapPlanner;
use crate::shadows::quality::ShadowQuality;
use crate::utils::settings::ShadowSettings;

pub const LIGHTING_SAMPLE: &str = "Lighting";
pub const SHADOWS_SAMPLE: &str = "Shadows";

/// Parameters the lit geometry pass binds for one camera.
#[derive(Debug, Clone, Copy)]
pub struct FrameGlobals {
    pub shadows: ShadowGlobals,
    pub lighting: LightingGlobals,
    pub quality: ShadowQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub directional_lights: usize,
    pub shadowed_lights: usize,
    pub tiles: usize,
    pub split: u32,
    pub tile_size: u32,
}

/// Drives the shadow planner through one camera's frame.
#[derive(Debug)]
pub struct CameraRenderer<D: FrameDiagnostics = NoDiagnostics> {
    planner: ShadowMapPlanner,
    lighting: LightCollector,
    diagnostics: D,
}

impl CameraRenderer<NoDiagnostics> {
    pub fn new(reversed_z: bool) -> Self {
        Self::with_diagnostics(reversed_z, NoDiagnostics)
    }
}

impl<D: FrameDiagnostics> CameraRenderer<D> {
    pub fn with_diagnostics(reversed_z: bool, diagnostics: D) -> Self {
        Self {
            planner: ShadowMapPlanner::new(reversed_z),
            lighting: LightCollector::new(),
            diagnostics,
        }
    }

    /// Runs reset, light collection, the shadow pass, geometry and cleanup in order.
    ///
    /// `draw_geometry` runs while the atlas is alive and receives the packed parameters.
    pub fn render_camera<C, B, F>(
        &mut self,
        camera_name: &str,
        culling: &C,
        visible_lights: &[VisibleLight],
        settings: &ShadowSettings,
        backend: &mut B,
        draw_geometry: F,
    ) -> FrameStats
    where
        C: ShadowCasterCulling + ?Sized,
        B: ShadowPassBackend + ?Sized,
        F: FnOnce(&FrameGlobals),
    {
        let sample = self.diagnostics.sample_name(camera_name);
        self.diagnostics.begin_sample(sample);

        self.diagnostics.begin_sample(LIGHTING_SAMPLE);
        self.planner.reset(settings);
        self.lighting
            .setup(visible_lights, &mut self.planner, culling);
        self.diagnostics.end_sample(LIGHTING_SAMPLE);

        self.diagnostics.begin_sample(SHADOWS_SAMPLE);
        self.planner.render(culling, backend);
        self.diagnostics.end_sample(SHADOWS_SAMPLE);

        let globals = FrameGlobals {
            shadows: self.planner.globals(),
            lighting: self.lighting.globals(),
            quality: self.planner.quality(),
        };
        draw_geometry(&globals);
        self.diagnostics.draw_unsupported(camera_name);
        self.diagnostics.draw_gizmos(camera_name);

        let layout = self.planner.layout();
        let stats = FrameStats {
            directional_lights: self.lighting.count(),
            shadowed_lights: self.planner.reserved_light_count(),
            tiles: self.planner.atlas_matrices().len(),
            split: layout.map_or(0, |l| l.split),
            tile_size: layout.map_or(0, |l| l.tile_size),
        };

        self.planner.cleanup(backend);
        self.diagnostics.end_sample(sample);
        stats
    }

    pub fn planner(&self) -> &ShadowMapPlanner {
        &self.planner
    }

    pub fn lighting(&self) -> &LightCollector {
        &self.lighting
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::Light;
    use crate::pipeline::diagnostics::LoggingDiagnostics;
    use crate::render::frustum::AABB;
    use crate::render_core::csm::{CameraView, FrustumCuller};
    use crate::shadows::backend::{CommandRecorder, ShadowCommand};
    use crate::utils::settings::{CascadeBlend, ShadowFilter};
    use glam::Vec3;

    fn scene(light_count: usize) -> (FrustumCuller, Vec<VisibleLight>) {
        let lights: Vec<VisibleLight> = (0..light_count)
            .map(|i| {
                VisibleLight::directional(
                    Light::directional_with_shadows(),
                    Vec3::new(0.2 * i as f32, 1.0, 0.3),
                )
            })
            .collect();
        let camera = CameraView::look_at(
            Vec3::new(0.0, 3.0, 5.0),
            Vec3::new(0.0, 0.0, -10.0),
            60f32.to_radians(),
            1.5,
            0.3,
            1000.0,
        );
        let casters = [
            AABB::new(Vec3::new(-40.0, -1.0, -80.0), Vec3::new(40.0, 0.0, 10.0)),
            AABB::new(Vec3::new(-1.0, 0.0, -6.0), Vec3::new(1.0, 4.0, -4.0)),
        ];
        let culler = FrustumCuller::new(camera, lights.clone(), &casters, 100.0);
        (culler, lights)
    }

    fn medium_soft() -> ShadowSettings {
        let mut settings = ShadowSettings::default();
        settings.directional.atlas_size = 1024;
        settings.directional.cascade_count = 2;
        settings.directional.cascade_ratios = [0.5, 0.75, 0.9];
        settings.directional.filter = ShadowFilter::Medium;
        settings.directional.cascade_blend = CascadeBlend::Soft;
        settings
    }

    #[test]
    fn test_two_lights_through_real_culler() {
        let (culler, lights) = scene(2);
        let mut backend = CommandRecorder::new();
        let mut renderer = CameraRenderer::new(false);

        let mut seen = None;
        let stats = renderer.render_camera(
            "Main Camera",
            &culler,
            &lights,
            &medium_soft(),
            &mut backend,
            |globals| seen = Some(*globals),
        );

        assert_eq!(
            stats,
            FrameStats {
                directional_lights: 2,
                shadowed_lights: 2,
                tiles: 4,
                split: 2,
                tile_size: 512,
            }
        );
        let globals = seen.unwrap();
        assert_eq!(globals.quality.filter_flags(), [false, true, false]);
        assert_eq!(globals.quality.blend_flags(), [false, true, false]);
        assert_eq!(globals.lighting.shadow_data[1][1], 2.0);
        assert_eq!(globals.shadows.cascade_count, 2);
        for m in &globals.shadows.dir_shadow_matrices[..4] {
            assert!(m.iter().flatten().all(|v| v.is_finite()));
            assert_ne!(*m, [[0.0; 4]; 4]);
        }
        assert!(backend.live_atlases().is_empty());
    }

    #[test]
    fn test_no_lights_still_binds_placeholder() {
        let (culler, lights) = scene(0);
        let mut backend = CommandRecorder::new();
        let mut renderer = CameraRenderer::new(false);
        let stats = renderer.render_camera(
            "Main Camera",
            &culler,
            &lights,
            &ShadowSettings::default(),
            &mut backend,
            |globals| assert_eq!(globals.shadows.cascade_count, 0),
        );

        assert_eq!(stats.shadowed_lights, 0);
        let cmds = backend.commands();
        assert!(matches!(cmds.first(), Some(ShadowCommand::AcquireAtlas(h)) if h.size == 1));
        assert!(matches!(cmds.last(), Some(ShadowCommand::ReleaseAtlas(h)) if h.size == 1));
    }

    #[test]
    fn test_logging_diagnostics_scopes_each_phase() {
        let (culler, lights) = scene(1);
        let mut backend = CommandRecorder::new();
        let mut renderer = CameraRenderer::with_diagnostics(false, LoggingDiagnostics::new());
        renderer.render_camera(
            "Scene View",
            &culler,
            &lights,
            &ShadowSettings::default(),
            &mut backend,
            |_| {},
        );

        let d = renderer.diagnostics();
        let names: Vec<_> = d.samples().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![LIGHTING_SAMPLE, SHADOWS_SAMPLE, "Scene View"]);
        assert_eq!(d.unsupported_draws(), 1);
        assert_eq!(d.gizmo_draws(), 1);
        assert_eq!(d.open_scopes(), 0);
    }

    #[test]
    fn test_consecutive_cameras_reuse_buffers() {
        let (culler, lights) = scene(4);
        let mut backend = CommandRecorder::new();
        let mut renderer = CameraRenderer::new(true);
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 4;

        let first = renderer.render_camera("A", &culler, &lights, &settings, &mut backend, |_| {});
        assert_eq!((first.tiles, first.split), (16, 4));

        let second = renderer.render_camera("B", &culler, &lights[..1], &settings, &mut backend, |_| {});
        assert_eq!((second.tiles, second.split), (4, 2));
        assert_eq!(renderer.planner().atlas_matrices().len(), 4);
        assert!(backend.live_atlases().is_empty());
    }
}
