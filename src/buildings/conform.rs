//! Post-placement height pass: fit buildings to the terrain, or the
//! terrain to the buildings.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::terrain::HeightField;

use super::building::Building;
use super::grid::BuildingGrid;

/// How building bases meet the ground
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightMode {
    /// Extend each base down to its lowest footprint corner
    #[default]
    Conform,
    /// Flatten the terrain under each footprint to the building base
    Flatten,
}

impl HeightMode {
    /// Flatten when asked for and the terrain supports it, conform otherwise
    pub fn select<T: HeightField + ?Sized>(flatten_mesh: bool, terrain: &T) -> Self {
        match (flatten_mesh, terrain.can_flatten()) {
            (true, true) => HeightMode::Flatten,
            (true, false) => {
                log::warn!("flatten_mesh set but terrain cannot be flattened; conforming buildings instead");
                HeightMode::Conform
            }
            (false, _) => HeightMode::Conform,
        }
    }
}

/// Counters from one height pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformStats {
    pub mode: HeightMode,
    /// Buildings rejected for underwater corners or slope
    pub invalidated: usize,
}

/// Lower one building's base to its lowest footprint corner, clamped to the
/// water level. Returns false and invalidates the building if more than two
/// corners are underwater or the base dropped by more than `max_delta_z`
/// (when positive).
pub fn conform_building<T: HeightField + ?Sized>(
    building: &mut Building,
    terrain: &T,
    max_delta_z: f32,
) -> bool {
    if !building.is_valid() {
        return false;
    }
    let water = terrain.water_level();
    let zmin0 = building.bounds.min.z;
    let mut zmin = zmin0;
    let mut num_below = 0;

    for corner in building.bounds.corners_xy() {
        let z = terrain.height_at(corner.x, corner.y);
        zmin = zmin.min(z);
        num_below += (z < water) as u32;
    }
    let zmin = zmin.max(water);
    building.bounds.min.z = zmin;

    if num_below > 2 || (max_delta_z > 0.0 && zmin0 - zmin > max_delta_z) {
        building.invalidate();
        return false;
    }
    true
}

/// Conform every building in parallel. Returns the number invalidated.
pub fn conform_buildings<T: HeightField + ?Sized>(
    buildings: &mut [Building],
    terrain: &T,
    max_delta_z: f32,
) -> usize {
    buildings
        .par_iter_mut()
        .map(|b| {
            let was_valid = b.is_valid();
            (was_valid && !conform_building(b, terrain, max_delta_z)) as usize
        })
        .sum()
}

/// Flatten the terrain under every valid building to its base height
pub fn flatten_under_buildings<T: HeightField + ?Sized>(buildings: &[Building], terrain: &mut T) {
    for b in buildings.iter().filter(|b| b.is_valid()) {
        terrain.flatten_region(&b.bounds);
    }
}

/// Run the height pass for `mode`, then relax every grid cell's Z lower
/// bound to the water level so cell bounds stay a superset of their members.
pub fn apply_height_mode<T: HeightField + ?Sized>(
    mode: HeightMode,
    buildings: &mut [Building],
    grid: &mut BuildingGrid,
    terrain: &mut T,
    max_delta_z: f32,
) -> ConformStats {
    let invalidated = match mode {
        HeightMode::Conform => conform_buildings(buildings, &*terrain, max_delta_z),
        HeightMode::Flatten => {
            flatten_under_buildings(buildings, terrain);
            0
        }
    };
    grid.relax_min_z(terrain.water_level());
    ConformStats { mode, invalidated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::material::Material;
    use crate::core::types::Vec3;
    use crate::math::Aabb;
    use crate::terrain::{HeightMap, NoiseTerrain, TerrainParams};

    fn region() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::new(100.0, 100.0, 0.0))
    }

    fn building_at(min: Vec3, max: Vec3) -> Building {
        let mut b = Building::from_material(&Material::DEFAULT);
        b.bounds = Aabb::new(min, max);
        b
    }

    #[test]
    fn test_conform_lowers_base() {
        // Ground rises with x
        let terrain = HeightMap::from_fn(&region(), 11, 0.0, |x, _| x * 0.1);
        let mut b = building_at(Vec3::new(40.0, 40.0, 5.0), Vec3::new(60.0, 60.0, 20.0));
        assert!(conform_building(&mut b, &terrain, 0.0));
        assert!((b.bounds.min.z - 4.0).abs() < 1e-4);
        assert_eq!(b.bounds.max.z, 20.0);
    }

    #[test]
    fn test_slope_rejection() {
        let terrain = HeightMap::from_fn(&region(), 11, 0.0, |x, _| x * 0.5);
        // Center ground 25, lowest corner 20
        let mut steep = building_at(Vec3::new(40.0, 40.0, 25.0), Vec3::new(60.0, 60.0, 40.0));
        assert!(!conform_building(&mut steep, &terrain, 2.0));
        assert!(!steep.is_valid());

        let mut tolerated = building_at(Vec3::new(40.0, 40.0, 25.0), Vec3::new(60.0, 60.0, 40.0));
        assert!(conform_building(&mut tolerated, &terrain, 10.0));
        assert!(tolerated.is_valid());
    }

    #[test]
    fn test_valley_center_passes_slope_check() {
        // V-shaped valley: center ground 0, every corner 20 higher
        let terrain = HeightMap::from_fn(&region(), 101, -1.0, |x, _| (x - 50.0).abs() * 2.0);
        let mut b = building_at(Vec3::new(40.0, 40.0, 0.0), Vec3::new(60.0, 60.0, 15.0));

        // Only a drop below the center ground counts, so corner spread alone never rejects
        assert!(conform_building(&mut b, &terrain, 1.0));
        assert!(b.is_valid());
        assert_eq!(b.bounds.min.z, 0.0);
    }

    #[test]
    fn test_underwater_corners() {
        // Water at 10, ground 0 for y < 50 and 20 above
        let terrain = HeightMap::from_fn(&region(), 101, 10.0, |_, y| if y < 50.0 { 0.0 } else { 20.0 });

        // All four corners under water
        let mut b = building_at(Vec3::new(10.0, 40.0, 20.0), Vec3::new(20.0, 40.5, 30.0));
        assert!(!conform_building(&mut b, &terrain, 0.0));

        // Two corners under water is tolerated and the base stops at the water
        let mut b = building_at(Vec3::new(10.0, 45.0, 20.0), Vec3::new(20.0, 55.0, 30.0));
        assert!(conform_building(&mut b, &terrain, 0.0));
        assert_eq!(b.bounds.min.z, 10.0);
    }

    #[test]
    fn test_invalid_stays_invalid() {
        let terrain = HeightMap::flat(&region(), 2, 0.0, -1.0);
        let mut b = building_at(Vec3::ZERO, Vec3::ZERO);
        assert!(!conform_building(&mut b, &terrain, 0.0));
        assert!(!b.is_valid());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let terrain = NoiseTerrain::new(TerrainParams { scale: 30.0, ..Default::default() });
        let make = || -> Vec<Building> {
            (0..64)
                .map(|i| {
                    let x = (i % 8) as f32 * 12.0;
                    let y = (i / 8) as f32 * 12.0;
                    let ground = terrain.height_at(x + 4.0, y + 4.0);
                    building_at(Vec3::new(x, y, ground), Vec3::new(x + 8.0, y + 8.0, ground + 10.0))
                })
                .collect()
        };

        let mut par = make();
        let rejected = conform_buildings(&mut par, &terrain, 3.0);

        let mut seq = make();
        let mut seq_rejected = 0;
        for b in &mut seq {
            seq_rejected += !conform_building(b, &terrain, 3.0) as usize;
        }
        assert_eq!(par, seq);
        assert_eq!(rejected, seq_rejected);
    }

    #[test]
    fn test_select_mode() {
        let map = HeightMap::flat(&region(), 2, 0.0, 0.0);
        let noise = NoiseTerrain::new(TerrainParams::default());
        assert_eq!(HeightMode::select(true, &map), HeightMode::Flatten);
        assert_eq!(HeightMode::select(false, &map), HeightMode::Conform);
        assert_eq!(HeightMode::select(true, &noise), HeightMode::Conform);
    }
}
