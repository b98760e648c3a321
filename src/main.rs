//! Shadow atlas planner demo
//!
//! Builds a small synthetic scene, runs one frame of directional shadow
//! planning and logs the resulting atlas layout and shader parameters.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glam::Vec3;

use shadow_atlas::pipeline::FrameStats;
use shadow_atlas::shadows::gpu::{ClearOnly, GpuShadowAtlas, request_headless_device};
use shadow_atlas::utils::settings::{
    default_settings_path, load_settings_or_default, save_settings,
};
use shadow_atlas::{
    AABB, CameraRenderer, CameraView, CascadeBlend, CommandRecorder, FrustumCuller, Light,
    LoggingDiagnostics, ShadowFilter, ShadowPassBackend, ShadowSettings, VisibleLight,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    Off,
    Simple,
    Medium,
    High,
}

impl From<FilterArg> for ShadowFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Off => ShadowFilter::Disabled,
            FilterArg::Simple => ShadowFilter::Simple,
            FilterArg::Medium => ShadowFilter::Medium,
            FilterArg::High => ShadowFilter::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BlendArg {
    Off,
    Hard,
    Soft,
    Dither,
}

impl From<BlendArg> for CascadeBlend {
    fn from(arg: BlendArg) -> Self {
        match arg {
            BlendArg::Off => CascadeBlend::Disabled,
            BlendArg::Hard => CascadeBlend::Hard,
            BlendArg::Soft => CascadeBlend::Soft,
            BlendArg::Dither => CascadeBlend::Dither,
        }
    }
}

/// Plan one frame of cascaded directional shadows
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of shadowed directional lights in the scene
    #[arg(long, default_value_t = 2)]
    lights: usize,

    /// Cascades per light (1-4), overrides the settings file
    #[arg(long)]
    cascades: Option<u32>,

    /// Atlas edge length in pixels, overrides the settings file
    #[arg(long)]
    atlas_size: Option<u32>,

    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    #[arg(long, value_enum)]
    blend: Option<BlendArg>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long, default_value_t = false)]
    save: bool,

    /// Render the atlas on a headless GPU device instead of recording commands
    #[arg(long, default_value_t = false)]
    gpu: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting shadow atlas planner...");
    let args = Args::parse();
    let settings_path = args.settings.clone().unwrap_or_else(default_settings_path);
    let settings = effective_settings(&args, load_settings_or_default(&settings_path));

    if args.save {
        match save_settings(&settings_path, &settings) {
            Ok(()) => tracing::info!("Saved settings to {}", settings_path.display()),
            Err(e) => tracing::error!("{}", e),
        }
    }

    let (culler, lights) = demo_scene(args.lights, &settings);

    let stats = if args.gpu {
        match pollster::block_on(request_headless_device()) {
            Ok((device, queue)) => {
                let mut backend = GpuShadowAtlas::new(device, queue, ClearOnly, false);
                run_frame(&culler, &lights, &settings, &mut backend)
            }
            Err(e) => {
                tracing::error!("{}; falling back to command recording", e);
                run_frame(&culler, &lights, &settings, &mut CommandRecorder::new())
            }
        }
    } else {
        let mut recorder = CommandRecorder::new();
        let stats = run_frame(&culler, &lights, &settings, &mut recorder);
        tracing::info!("Recorded {} shadow commands", recorder.commands().len());
        stats
    };

    tracing::info!(
        "{} directional lights, {} shadowed, {} tiles in a {}x{} split of {}px tiles",
        stats.directional_lights,
        stats.shadowed_lights,
        stats.tiles,
        stats.split,
        stats.split,
        stats.tile_size
    );
}

fn effective_settings(args: &Args, mut settings: ShadowSettings) -> ShadowSettings {
    if let Some(cascades) = args.cascades {
        settings.directional.cascade_count = cascades;
    }
    if let Some(size) = args.atlas_size {
        settings.directional.atlas_size = size;
    }
    if let Some(filter) = args.filter {
        settings.directional.filter = filter.into();
    }
    if let Some(blend) = args.blend {
        settings.directional.cascade_blend = blend.into();
    }
    settings.validated()
}

/// Ground plane with a row of pillars, lit by `light_count` suns at different angles.
fn demo_scene(light_count: usize, settings: &ShadowSettings) -> (FrustumCuller, Vec<VisibleLight>) {
    let lights: Vec<VisibleLight> = (0..light_count)
        .map(|i| {
            let angle = i as f32 * 0.7;
            let direction = Vec3::new(angle.cos() * 0.5, 1.0, angle.sin() * 0.5);
            VisibleLight::directional(Light::directional_with_shadows(), direction)
        })
        .collect();

    let mut casters = vec![AABB::new(
        Vec3::new(-200.0, -1.0, -200.0),
        Vec3::new(200.0, 0.0, 200.0),
    )];
    for i in 0..8 {
        let z = -10.0 - i as f32 * 12.0;
        casters.push(AABB::new(Vec3::new(-1.0, 0.0, z - 1.0), Vec3::new(1.0, 6.0, z + 1.0)));
    }

    let camera = CameraView::look_at(
        Vec3::new(0.0, 4.0, 8.0),
        Vec3::new(0.0, 1.0, -20.0),
        60f32.to_radians(),
        16.0 / 9.0,
        0.3,
        1000.0,
    );
    let culler = FrustumCuller::new(camera, lights.clone(), &casters, settings.max_distance);
    (culler, lights)
}

fn run_frame<B: ShadowPassBackend>(
    culler: &FrustumCuller,
    lights: &[VisibleLight],
    settings: &ShadowSettings,
    backend: &mut B,
) -> FrameStats {
    let mut renderer = CameraRenderer::with_diagnostics(false, LoggingDiagnostics::new());
    let stats = renderer.render_camera("Main Camera", culler, lights, settings, backend, |globals| {
        let keywords: Vec<_> = globals.quality.enabled_keywords().collect();
        tracing::info!("Enabled shadow keywords: {:?}", keywords);
        tracing::debug!(
            "Distance fade {:?}, atlas size {:?}",
            globals.shadows.shadow_distance_fade,
            globals.shadows.shadow_atlas_size
        );
        for (i, sphere) in globals.shadows.cascade_culling_spheres
            [..globals.shadows.cascade_count as usize]
            .iter()
            .enumerate()
        {
            tracing::debug!("Cascade {} sphere {:?}", i, sphere);
        }
    });

    for sample in renderer.diagnostics().samples() {
        tracing::debug!("{}: {:?}", sample.name, sample.elapsed);
    }
    stats
}
