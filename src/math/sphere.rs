//! Sphere against box tests

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// True if the sphere overlaps the box interior.
///
/// A sphere resting exactly on a face does not count. A zero radius
/// degenerates to a point-in-box test.
pub fn sphere_intersects_aabb(center: Vec3, radius: f32, aabb: &Aabb) -> bool {
    if aabb.contains_point(center) {
        return true;
    }
    center.distance_squared(aabb.clamp_point(center)) < radius * radius
}

/// Push a penetrating sphere back out of `aabb`.
///
/// The exit face is the face of the radius-grown box that `previous` was
/// furthest outside of, so a sphere moving into the box is stopped on the
/// side it came from. When `previous` is inside as well, the face of least
/// penetration is used. Returns `None` if the sphere does not intersect.
pub fn resolve_sphere_aabb(center: Vec3, radius: f32, aabb: &Aabb, previous: Vec3) -> Option<Vec3> {
    if !sphere_intersects_aabb(center, radius, aabb) {
        return None;
    }
    let grown = aabb.expanded_by(Vec3::splat(radius));

    // (separation, axis, max side)
    let mut exit = (f32::NEG_INFINITY, 0usize, false);
    for axis in 0..3 {
        let below = grown.min[axis] - previous[axis];
        if below > exit.0 {
            exit = (below, axis, false);
        }
        let above = previous[axis] - grown.max[axis];
        if above > exit.0 {
            exit = (above, axis, true);
        }
    }

    if exit.0 <= 0.0 {
        let mut least = (f32::INFINITY, 0usize, false);
        for axis in 0..3 {
            let down = center[axis] - grown.min[axis];
            if down < least.0 {
                least = (down, axis, false);
            }
            let up = grown.max[axis] - center[axis];
            if up < least.0 {
                least = (up, axis, true);
            }
        }
        exit = least;
    }

    let (_, axis, max_side) = exit;
    let mut resolved = center;
    resolved[axis] = if max_side { grown.max[axis] } else { grown.min[axis] };
    Some(resolved)
}
