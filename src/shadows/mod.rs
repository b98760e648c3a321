//! Directional shadow atlas planning
//! Cascade fitting contract, tile layout, atlas matrices, fades, quality modes and the planner.

pub mod atlas_matrix;
pub mod backend;
pub mod cascade;
pub mod fade;
pub mod gpu;
pub mod planner;
pub mod quality;
pub mod tiles;

// Re-export commonly used types
pub use atlas_matrix::to_atlas_space;
pub use backend::{AtlasHandle, CommandRecorder, ShadowCommand, ShadowPassBackend};
pub use cascade::{CascadeComputer, CascadeRequest, CascadeSplit, ShadowCasterCulling};
pub use fade::{CascadeFade, cascade_fade_data, distance_fade};
pub use gpu::{ClearOnly, GpuShadowAtlas, ShadowCasterDrawer};
pub use planner::{DirectionalShadowData, PlannerState, ShadowMapPlanner, ShadowedDirectionalLight};
pub use quality::{BlendMode, FilterMode, ShadowQuality};
pub use tiles::{AtlasLayout, TileViewport, plan_layout};
