//! Rendering-related helpers
//! Contains bounding boxes and frustum plane extraction.

pub mod frustum;

// Re-export commonly used types
pub use frustum::{AABB, extract_frustum_planes};
