use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::constants::{
    MAX_ATLAS_SIZE, MAX_CASCADE_RATIOS, MAX_CASCADES, MIN_ATLAS_SIZE, MIN_CASCADE_FADE,
    MIN_DISTANCE_FADE, MIN_SHADOW_DISTANCE,
};
use crate::error::{Result, ShadowError};

pub const DEFAULT_SETTINGS_FILE: &str = "shadows.bin";

/// Shadow configuration, fixed for the duration of a frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShadowSettings {
    /// Shadow draw distance in world units
    pub max_distance: f32,
    /// Fraction of `max_distance` over which shadows fade out
    pub distance_fade: f32,
    #[serde(default)]
    pub directional: DirectionalShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DirectionalShadowSettings {
    pub atlas_size: u32, // 256 .. 8192, power of two
    pub cascade_count: u32, // 1-4
    /// Cumulative depth ratios; only the first `cascade_count - 1` are used
    pub cascade_ratios: [f32; MAX_CASCADE_RATIOS],
    pub cascade_fade: f32,
    #[serde(default)]
    pub filter: ShadowFilter,
    #[serde(default)]
    pub cascade_blend: CascadeBlend,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            cascade_count: 4,
            cascade_ratios: [0.1, 0.25, 0.5],
            cascade_fade: 0.1,
            filter: ShadowFilter::default(),
            cascade_blend: CascadeBlend::default(),
        }
    }
}

/// PCF kernel width. Discriminants are the 1-based keyword indices, 0 = no keyword.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowFilter {
    /// Hardware 2x2 comparison only
    #[default]
    Disabled = 0,
    /// PCF 3x3
    Simple = 1,
    /// PCF 5x5
    Medium = 2,
    /// PCF 7x7
    High = 3,
}

impl ShadowFilter {
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Extra texels sampled past a cascade edge, used to shrink culling spheres.
    pub fn width(self) -> f32 {
        self.index() as f32 + 1.0
    }
}

/// How the shader moves from one cascade to the next.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum CascadeBlend {
    Disabled = 0,
    #[default]
    Hard = 1,
    Soft = 2,
    Dither = 3,
}

impl CascadeBlend {
    pub fn index(self) -> u32 {
        self as u32
    }
}

impl ShadowSettings {
    /// Cascade ratios as a vector, the shape the culling step consumes.
    pub fn cascade_ratios(&self) -> Vec3 {
        Vec3::from_array(self.directional.cascade_ratios)
    }

    pub fn cascade_count(&self) -> usize {
        self.directional.cascade_count as usize
    }

    /// Returns a copy with every out-of-range value clamped to something the planner can use.
    pub fn validated(&self) -> Self {
        let mut out = self.clone();
        let dir = &mut out.directional;

        let count = dir.cascade_count.clamp(1, MAX_CASCADES as u32);
        if count != dir.cascade_count {
            tracing::warn!("Cascade count {} out of range, using {}", dir.cascade_count, count);
            dir.cascade_count = count;
        }

        let size = dir
            .atlas_size
            .clamp(MIN_ATLAS_SIZE, MAX_ATLAS_SIZE)
            .next_power_of_two();
        if size != dir.atlas_size {
            tracing::warn!("Atlas size {} is not supported, using {}", dir.atlas_size, size);
            dir.atlas_size = size;
        }

        let mut previous = 0.0_f32;
        for ratio in dir.cascade_ratios.iter_mut() {
            let clamped = ratio.clamp(previous, 1.0);
            if clamped != *ratio || !ratio.is_finite() {
                tracing::warn!("Cascade ratio {} not increasing, using {}", ratio, clamped);
                *ratio = if clamped.is_finite() { clamped } else { previous };
            }
            previous = *ratio;
        }

        let fade = dir.cascade_fade.clamp(MIN_CASCADE_FADE, 1.0);
        if fade != dir.cascade_fade {
            tracing::warn!("Cascade fade {} clamped to {}", dir.cascade_fade, fade);
            dir.cascade_fade = fade;
        }

        if !(out.max_distance >= MIN_SHADOW_DISTANCE) {
            tracing::warn!("Shadow distance {} clamped", out.max_distance);
            out.max_distance = MIN_SHADOW_DISTANCE;
        }
        let distance_fade = out.distance_fade.clamp(MIN_DISTANCE_FADE, 1.0);
        if distance_fade != out.distance_fade {
            tracing::warn!("Distance fade {} clamped to {}", out.distance_fade, distance_fade);
            out.distance_fade = distance_fade;
        }

        out
    }
}

/// Platform config location for the settings file, falling back to the working directory.
pub fn default_settings_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "shadow-atlas")
        .map(|dirs| dirs.config_dir().join(DEFAULT_SETTINGS_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

pub fn save_settings(path: &Path, settings: &ShadowSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ShadowError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| ShadowError::SettingsIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, settings).map_err(ShadowError::SettingsEncode)?;
    tracing::debug!("Saved shadow settings to {}", path.display());
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<ShadowSettings> {
    let file = File::open(path).map_err(|source| ShadowError::SettingsIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let settings: ShadowSettings =
        bincode::deserialize_from(&mut reader).map_err(|source| ShadowError::SettingsDecode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(settings.validated())
}

/// Loads settings, or returns defaults when the file is missing or unreadable.
pub fn load_settings_or_default(path: &Path) -> ShadowSettings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("{}; using default shadow settings", e);
            ShadowSettings::default()
        }
    }
}
