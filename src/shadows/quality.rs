//! Exclusive filter and cascade-blend modes.
//!
//! Each category resolves to at most one variant, so the shading stage can never
//! see two active keywords in the same group.

use crate::utils::settings::{CascadeBlend, ShadowFilter};

pub const FILTER_KEYWORDS: [&str; 3] = [
    "_DIRECTIONAL_PCF3",
    "_DIRECTIONAL_PCF5",
    "_DIRECTIONAL_PCF7",
];

pub const CASCADE_BLEND_KEYWORDS: [&str; 3] = [
    "_CASCADE_BLEND_HARD",
    "_CASCADE_BLEND_SOFT",
    "_CASCADE_BLEND_DITHER",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Pcf3x3,
    Pcf5x5,
    Pcf7x7,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [FilterMode::Pcf3x3, FilterMode::Pcf5x5, FilterMode::Pcf7x7];

    pub fn from_setting(filter: ShadowFilter) -> Option<Self> {
        match filter {
            ShadowFilter::Disabled => None,
            ShadowFilter::Simple => Some(FilterMode::Pcf3x3),
            ShadowFilter::Medium => Some(FilterMode::Pcf5x5),
            ShadowFilter::High => Some(FilterMode::Pcf7x7),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn keyword(self) -> &'static str {
        FILTER_KEYWORDS[self.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Hard,
    Soft,
    Dither,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Hard, BlendMode::Soft, BlendMode::Dither];

    pub fn from_setting(blend: CascadeBlend) -> Option<Self> {
        match blend {
            CascadeBlend::Disabled => None,
            CascadeBlend::Hard => Some(BlendMode::Hard),
            CascadeBlend::Soft => Some(BlendMode::Soft),
            CascadeBlend::Dither => Some(BlendMode::Dither),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn keyword(self) -> &'static str {
        CASCADE_BLEND_KEYWORDS[self.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowQuality {
    pub filter: Option<FilterMode>,
    pub blend: Option<BlendMode>,
}

impl ShadowQuality {
    pub fn select(filter: ShadowFilter, blend: CascadeBlend) -> Self {
        Self {
            filter: FilterMode::from_setting(filter),
            blend: BlendMode::from_setting(blend),
        }
    }

    pub fn filter_flags(&self) -> [bool; 3] {
        FilterMode::ALL.map(|mode| self.filter == Some(mode))
    }

    pub fn blend_flags(&self) -> [bool; 3] {
        BlendMode::ALL.map(|mode| self.blend == Some(mode))
    }

    /// Keywords to enable; every other keyword in both groups is disabled.
    pub fn enabled_keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filter
            .map(FilterMode::keyword)
            .into_iter()
            .chain(self.blend.map(BlendMode::keyword))
    }

    /// Shader-side indices, -1 when the group is off.
    pub fn shader_indices(&self) -> (i32, i32) {
        (
            self.filter.map_or(-1, |m| m.index() as i32),
            self.blend.map_or(-1, |m| m.index() as i32),
        )
    }
}
