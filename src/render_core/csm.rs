//! Cascaded Shadow Maps (CSM) fitting on the CPU
//!
//! Splits the camera frustum into depth slices, wraps each slice in a bounding
//! sphere and fits an orthographic light camera around it. Spheres keep the
//! projection size constant while the camera rotates, and snapping the
//! projection origin to the tile's texel grid removes edge shimmer while it moves.

use glam::{Mat4, Vec3, Vec4};

use crate::constants::CASCADE_RADIUS_QUANTIZATION;
use crate::lighting::{LightKind, LightShadows, VisibleLight};
use crate::render::frustum::{AABB, extract_frustum_planes};
use crate::shadows::cascade::{
    CascadeRequest, CascadeSplit, ShadowCasterCulling, cascade_depth_range,
};

/// Camera parameters the cascades are fitted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraView {
    pub fn look_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// Visibility snapshot for one camera and frame.
#[derive(Debug, Clone)]
pub struct FrustumCuller {
    camera: CameraView,
    inv_view: Mat4,
    shadow_distance: f32,
    lights: Vec<VisibleLight>,
    caster_bounds: Vec<Option<AABB>>,
}

impl FrustumCuller {
    /// Culls `casters` against the shadowed part of the camera frustum and records,
    /// per visible light, the bounds of the casters that survive.
    pub fn new(
        camera: CameraView,
        lights: Vec<VisibleLight>,
        casters: &[AABB],
        shadow_distance: f32,
    ) -> Self {
        let shadow_distance = shadow_distance.min(camera.far).max(camera.near);
        let inv_view = camera.view.inverse();

        let corners = calculate_frustum_corners(
            camera.near,
            shadow_distance,
            camera.fov_y,
            camera.aspect,
            &inv_view,
        );
        let (center, radius) = bounding_sphere(&corners);
        let camera_planes = extract_frustum_planes(&(camera.proj() * camera.view));

        let receivers = casters
            .iter()
            .filter(|b| b.is_visible(&camera_planes) || b.intersects_sphere(center, radius))
            .fold(None, |acc: Option<AABB>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            });

        let caster_bounds = lights
            .iter()
            .map(|light| {
                let casts = light.light.kind == LightKind::Directional
                    && light.light.shadows != LightShadows::None;
                if casts { receivers } else { None }
            })
            .collect();

        tracing::trace!(
            "Culling snapshot: {} lights, {} casters, shadow distance {}",
            lights.len(),
            casters.len(),
            shadow_distance
        );

        Self {
            camera,
            inv_view,
            shadow_distance,
            lights,
            caster_bounds,
        }
    }
}

impl ShadowCasterCulling for FrustumCuller {
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<AABB> {
        self.caster_bounds.get(visible_light_index).copied().flatten()
    }

    fn compute_directional_cascade(&self, request: &CascadeRequest) -> Option<CascadeSplit> {
        let light = self.lights.get(request.visible_light_index)?;
        if light.light.kind != LightKind::Directional || request.tile_size == 0 {
            return None;
        }
        let bounds = self.shadow_caster_bounds(request.visible_light_index)?;

        let (near_ratio, far_ratio) =
            cascade_depth_range(request.cascade_index, request.cascade_count, request.ratios);
        let cascade_near = (near_ratio * self.shadow_distance).max(self.camera.near);
        let cascade_far = (far_ratio * self.shadow_distance).max(cascade_near);

        let frustum_corners = calculate_frustum_corners(
            cascade_near,
            cascade_far,
            self.camera.fov_y,
            self.camera.aspect,
            &self.inv_view,
        );
        let (center, radius) = bounding_sphere(&frustum_corners);

        // Round up radius to reduce shadow edge flickering
        let radius = (radius * CASCADE_RADIUS_QUANTIZATION).ceil() / CASCADE_RADIUS_QUANTIZATION;

        let sun_dir = light.direction_to_light();

        // Pull the eye back far enough to see every caster between it and the slice
        let caster_reach = bounds
            .corners()
            .iter()
            .map(|c| (*c - center).dot(sun_dir))
            .fold(radius, f32::max);
        let light_pos = center + sun_dir * caster_reach;

        // Use stable up vector
        let light_up = if sun_dir.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(light_pos, center, light_up);

        let proj = Mat4::orthographic_rh_gl(
            -radius,
            radius,
            -radius,
            radius,
            -request.near_plane_offset,
            caster_reach + radius,
        );
        let proj = snap_to_texel_grid(proj, view, request.tile_size as f32);

        Some(CascadeSplit {
            view,
            proj,
            culling_sphere: center.extend(radius),
            blend_culling_factor: request.blend_culling_factor,
        })
    }
}

/// Calculate the 8 corners of a frustum slice in world space
fn calculate_frustum_corners(
    near: f32,
    far: f32,
    fov_y: f32,
    aspect: f32,
    inv_view: &Mat4,
) -> [Vec3; 8] {
    let tan_half_fov = (fov_y / 2.0).tan();

    let near_height = near * tan_half_fov;
    let near_width = near_height * aspect;
    let far_height = far * tan_half_fov;
    let far_width = far_height * aspect;

    // Corners in view space (camera looking down -Z)
    let corners_view = [
        Vec3::new(-near_width, -near_height, -near),
        Vec3::new(near_width, -near_height, -near),
        Vec3::new(near_width, near_height, -near),
        Vec3::new(-near_width, near_height, -near),
        Vec3::new(-far_width, -far_height, -far),
        Vec3::new(far_width, -far_height, -far),
        Vec3::new(far_width, far_height, -far),
        Vec3::new(-far_width, far_height, -far),
    ];

    corners_view.map(|corner| inv_view.transform_point3(corner))
}

fn bounding_sphere(corners: &[Vec3; 8]) -> (Vec3, f32) {
    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    let radius = corners
        .iter()
        .map(|corner| corner.distance(center))
        .fold(0.0_f32, f32::max);
    (center, radius)
}

/// Snap the projection so the world origin lands on a texel boundary of the tile
fn snap_to_texel_grid(proj: Mat4, view: Mat4, tile_size: f32) -> Mat4 {
    let origin = (proj * view) * Vec4::W;

    let texel_size = 2.0 / tile_size;
    let snapped_x = (origin.x / texel_size).round() * texel_size;
    let snapped_y = (origin.y / texel_size).round() * texel_size;

    let mut result = proj;
    result.w_axis.x += snapped_x - origin.x;
    result.w_axis.y += snapped_y - origin.y;
    result
}
