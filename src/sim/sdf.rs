//! Signed distance functions
//!
//! Shared by the narrow phase (contact normals and depths) and the
//! rasterizer (anti-aliased coverage).

use glam::Vec2;

/// Signed distance to a circle
#[inline]
pub fn sd_circle(p: Vec2, center: Vec2, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Closest point to `p` on the segment `a`-`b`
#[inline]
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Signed distance to a capsule (segment `a`-`b` inflated by `radius`)
#[inline]
pub fn sd_capsule(p: Vec2, a: Vec2, b: Vec2, radius: f32) -> f32 {
    (p - closest_point_on_segment(p, a, b)).length() - radius
}

/// Pixel coverage for a signed distance sampled at a pixel center
///
/// A one-pixel ramp centered on the surface.
#[inline]
pub fn coverage(distance: f32) -> f32 {
    (0.5 - distance).clamp(0.0, 1.0)
}
