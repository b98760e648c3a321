//! Optional per-camera diagnostics.
//!
//! Production builds use [`NoDiagnostics`]; tools that want profiling scopes and
//! editor-style hooks use [`LoggingDiagnostics`].

use std::time::{Duration, Instant};

pub const RENDER_CAMERA_SAMPLE: &str = "Render Camera";

pub trait FrameDiagnostics {
    /// Name used for sample scopes of this camera.
    fn sample_name<'a>(&self, _camera_name: &'a str) -> &'a str {
        RENDER_CAMERA_SAMPLE
    }

    fn begin_sample(&mut self, _name: &str) {}

    fn end_sample(&mut self, _name: &str) {}

    /// Hook for drawing geometry whose shaders the pipeline does not support.
    fn draw_unsupported(&mut self, _camera_name: &str) {}

    fn draw_gizmos(&mut self, _camera_name: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl FrameDiagnostics for NoDiagnostics {}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub name: String,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct LoggingDiagnostics {
    open: Vec<(String, Instant)>,
    samples: Vec<SampleRecord>,
    unsupported_draws: u32,
    gizmo_draws: u32,
}

impl LoggingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    pub fn unsupported_draws(&self) -> u32 {
        self.unsupported_draws
    }

    pub fn gizmo_draws(&self) -> u32 {
        self.gizmo_draws
    }

    pub fn open_scopes(&self) -> usize {
        self.open.len()
    }
}

impl FrameDiagnostics for LoggingDiagnostics {
    fn sample_name<'a>(&self, camera_name: &'a str) -> &'a str {
        camera_name
    }

    fn begin_sample(&mut self, name: &str) {
        tracing::trace!("begin sample {}", name);
        self.open.push((name.to_string(), Instant::now()));
    }

    fn end_sample(&mut self, name: &str) {
        match self.open.iter().rposition(|(open, _)| open == name) {
            Some(i) => {
                let (name, start) = self.open.remove(i);
                let elapsed = start.elapsed();
                tracing::debug!("sample {} took {:?}", name, elapsed);
                self.samples.push(SampleRecord { name, elapsed });
            }
            None => tracing::warn!("end_sample({}) without matching begin", name),
        }
    }

    fn draw_unsupported(&mut self, camera_name: &str) {
        self.unsupported_draws += 1;
        tracing::trace!("unsupported shader pass for {}", camera_name);
    }

    fn draw_gizmos(&mut self, camera_name: &str) {
        self.gizmo_draws += 1;
        tracing::trace!("gizmos for {}", camera_name);
    }
}
