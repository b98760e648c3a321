//! Cascaded directional shadow maps packed into a single atlas.
//!
//! Each frame the [`ShadowMapPlanner`] reserves shadow slots for up to four
//! directional lights, lays their cascades out in a square atlas, and produces
//! the atlas-space matrices, cascade spheres and fade parameters the lit shader
//! samples with.

// Core data shared with shaders
pub mod core;

// Frame driver and diagnostics
pub mod pipeline;

// Bounds and frustum helpers
pub mod render;

// Cascade fitting against the camera frustum
pub mod render_core;

// Atlas planning
pub mod shadows;

// Settings persistence
pub mod utils;

pub mod constants;
pub mod error;
pub mod lighting;

// Re-exports
pub use constants::*;
pub use crate::core::{LightingGlobals, ShadowGlobals};
pub use error::{Result, ShadowError};
pub use lighting::{Light, LightCollector, LightKind, LightShadows, VisibleLight};
pub use pipeline::{CameraRenderer, FrameDiagnostics, LoggingDiagnostics, NoDiagnostics};
pub use render::{AABB, extract_frustum_planes};
pub use render_core::{CameraView, FrustumCuller};
pub use shadows::{
    AtlasLayout, CommandRecorder, DirectionalShadowData, ShadowCasterCulling, ShadowMapPlanner,
    ShadowPassBackend, ShadowQuality,
};
pub use utils::settings::{CascadeBlend, ShadowFilter, ShadowSettings};
