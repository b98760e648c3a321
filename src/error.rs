//! Errors for the fallible edges around the shadow planner.
//!
//! The per-frame planner never fails; these cover loading settings from disk and
//! acquiring a GPU device for the atlas backend.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ShadowError {
    #[error("failed to access settings file {}: {source}", path.display())]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode settings file {}: {source}", path.display())]
    SettingsDecode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("failed to encode settings: {0}")]
    SettingsEncode(#[source] bincode::Error),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create GPU device: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, ShadowError>;
