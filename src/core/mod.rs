//! Core data structures shared with the shading stage
//! Contains the uniform blocks written once per frame.

pub mod uniforms;

// Re-export commonly used types
pub use uniforms::{LightingGlobals, ShadowGlobals};
