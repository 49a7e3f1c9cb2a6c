//! Projection and triangle math for the rasterizer.

use crate::types::DisplayTransform;
use glam::{Mat4, Vec2, Vec3};

/// Modelview for a display transform: translate by `(-tx, -ty, tz)`, rotate
/// `-rx` about X, `ry + 180` about Y, `rz` about Z, then scale.
pub fn modelview(transform: &DisplayTransform) -> Mat4 {
    let [tx, ty, tz] = transform.translation;
    let [rx, ry, rz] = transform.rotation;
    Mat4::from_translation(Vec3::new(-tx, -ty, tz))
        * Mat4::from_rotation_x((-rx).to_radians())
        * Mat4::from_rotation_y((ry + 180.0).to_radians())
        * Mat4::from_rotation_z(rz.to_radians())
        * Mat4::from_scale(Vec3::from_array(transform.scale))
}

/// Orthographic projection to window coordinates with a bottom-left origin.
///
/// The view volume spans `half_extent` units each side of the origin; X is
/// mirrored. Depth is the view-space z, smaller being nearer.
pub fn project(view: Vec3, half_extent: f32, size: u32) -> Vec3 {
    let size = size as f32;
    let x_ndc = -view.x / half_extent;
    let y_ndc = view.y / half_extent;
    Vec3::new((x_ndc + 1.0) * 0.5 * size, (y_ndc + 1.0) * 0.5 * size, view.z)
}

/// Unnormalized face normal of a view-space triangle. Faces whose normal
/// has `z <= 0` point away from the viewer.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Barycentric weights of `p` for triangle `(a, b, c)`, in vertex order.
///
/// Degenerate triangles report `None` so callers skip them.
pub fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<Vec3> {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < 1e-10 {
        return None;
    }

    let inv = 1.0 / denom;
    let wc = (dot11 * dot02 - dot01 * dot12) * inv;
    let wb = (dot00 * dot12 - dot01 * dot02) * inv;
    Some(Vec3::new(1.0 - wb - wc, wb, wc))
}
