//! Per-camera frame driving.

pub mod camera_renderer;
pub mod diagnostics;

pub use camera_renderer::{CameraRenderer, FrameGlobals, FrameStats};
pub use diagnostics::{FrameDiagnostics, LoggingDiagnostics, NoDiagnostics};
