//! Sphere collision against placed buildings, pruned by the grid

use crate::core::types::Vec3;
use crate::math::{resolve_sphere_aabb, sphere_intersects_aabb, Aabb};

use super::building::Building;
use super::grid::BuildingGrid;

/// Resolve a sphere moving from `previous` to `position` against the
/// buildings.
///
/// Cells are pruned with a sphere grown by the travel distance. The first
/// building hit pushes the sphere out and ends the query: buildings are
/// assumed far enough apart that one contact per query is enough.
/// Invalidated buildings are skipped. Returns the resolved position, or
/// `None` if nothing was hit.
pub fn resolve_sphere_collision(
    buildings: &[Building],
    grid: &BuildingGrid,
    position: Vec3,
    previous: Vec3,
    radius: f32,
) -> Option<Vec3> {
    if buildings.is_empty() {
        return None;
    }
    let reach = radius + position.distance(previous);
    let query = Aabb::from_sphere(position, reach);

    grid.candidates(&query, |cell| sphere_intersects_aabb(position, reach, cell))
        .find_map(|ix| {
            assert!(ix < buildings.len(), "grid index {} out of range", ix);
            let b = &buildings[ix];
            if !b.is_valid() {
                return None;
            }
            resolve_sphere_aabb(position, radius, &b.bounds, previous)
        })
}

/// True if a stationary sphere touches any valid building
pub fn sphere_hits_any(buildings: &[Building], grid: &BuildingGrid, center: Vec3, radius: f32) -> bool {
    if buildings.is_empty() {
        return false;
    }
    let query = Aabb::from_sphere(center, radius);
    grid.candidates(&query, |cell| sphere_intersects_aabb(center, radius, cell))
        .any(|ix| {
            assert!(ix < buildings.len(), "grid index {} out of range", ix);
            let b = &buildings[ix];
            b.is_valid() && sphere_intersects_aabb(center, radius, &b.bounds)
        })
}
