//! Directional light collection for the shading stage.
//!
//! Walks the frame's visible lights, packs up to [`MAX_DIRECTIONAL_LIGHTS`]
//! colors and directions into fixed arrays and asks the shadow planner for a
//! shadow slot for each of them.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::constants::MAX_DIRECTIONAL_LIGHTS;
use crate::core::uniforms::LightingGlobals;
use crate::shadows::cascade::ShadowCasterCulling;
use crate::shadows::planner::{DirectionalShadowData, ShadowMapPlanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightShadows {
    None,
    Hard,
    Soft,
}

/// Authoring-side light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub shadows: LightShadows,
    pub shadow_strength: f32,
    /// Slope-scaled depth bias applied while drawing casters
    pub shadow_bias: f32,
    pub shadow_normal_bias: f32,
    pub shadow_near_plane: f32,
}

impl Light {
    pub fn directional_with_shadows() -> Self {
        Self {
            kind: LightKind::Directional,
            color: Vec3::ONE,
            intensity: 1.0,
            shadows: LightShadows::Hard,
            shadow_strength: 1.0,
            shadow_bias: 0.05,
            shadow_normal_bias: 0.4,
            shadow_near_plane: 0.2,
        }
    }
}

/// A light that survived camera culling this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleLight {
    pub light: Light,
    /// Linear color premultiplied by intensity
    pub final_color: Vec4,
    pub local_to_world: Mat4,
}

impl VisibleLight {
    /// Places a light so that it shines away from `direction_to_light`.
    pub fn directional(light: Light, direction_to_light: Vec3) -> Self {
        let forward = -direction_to_light.normalize_or(Vec3::Y);
        Self {
            light,
            final_color: (light.color * light.intensity).extend(1.0),
            local_to_world: Mat4::from_quat(Quat::from_rotation_arc(Vec3::Z, forward)),
        }
    }

    /// Unit vector pointing from the scene towards the light.
    pub fn direction_to_light(&self) -> Vec3 {
        -self.local_to_world.z_axis.truncate().normalize_or_zero()
    }
}

/// Fixed-size directional light arrays, rewritten every frame.
#[derive(Debug, Clone)]
pub struct LightCollector {
    colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    shadow_data: [DirectionalShadowData; MAX_DIRECTIONAL_LIGHTS],
    count: usize,
}

impl LightCollector {
    pub fn new() -> Self {
        Self {
            colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            shadow_data: [DirectionalShadowData::NONE; MAX_DIRECTIONAL_LIGHTS],
            count: 0,
        }
    }

    /// Collects directional lights in visibility order and reserves their shadows.
    pub fn setup<C: ShadowCasterCulling + ?Sized>(
        &mut self,
        visible_lights: &[VisibleLight],
        planner: &mut ShadowMapPlanner,
        culling: &C,
    ) {
        self.count = 0;
        for (visible_light_index, visible) in visible_lights.iter().enumerate() {
            if visible.light.kind != LightKind::Directional {
                continue;
            }
            if self.count >= MAX_DIRECTIONAL_LIGHTS {
                tracing::debug!(
                    "Ignoring directional light {}: limit of {} reached",
                    visible_light_index,
                    MAX_DIRECTIONAL_LIGHTS
                );
                break;
            }
            let index = self.count;
            self.colors[index] = visible.final_color;
            self.directions[index] = visible.direction_to_light().extend(0.0);
            self.shadow_data[index] =
                planner.reserve_directional_light(&visible.light, visible_light_index, culling);
            self.count += 1;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors[..self.count]
    }

    pub fn directions(&self) -> &[Vec4] {
        &self.directions[..self.count]
    }

    pub fn shadow_data(&self) -> &[DirectionalShadowData] {
        &self.shadow_data[..self.count]
    }

    pub fn globals(&self) -> LightingGlobals {
        let mut globals = LightingGlobals::zeroed_with_count(self.count as i32);
        for i in 0..self.count {
            globals.colors[i] = self.colors[i].to_array();
            globals.directions[i] = self.directions[i].to_array();
            globals.shadow_data[i] = self.shadow_data[i].to_vec4().to_array();
        }
        globals
    }
}

impl Default for LightCollector {
    fn default() -> Self {
        Self::new()
    }
}
