//! Randomized building placement with rejection sampling.
//!
//! Strictly sequential: each candidate is tested against every building
//! placed before it, so later placements depend on all earlier ones.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;
use crate::terrain::HeightField;

use super::building::Building;
use super::grid::{BuildingGrid, GRID_SIZE};
use super::material::rand_uniform;
use super::params::BuildingParams;

/// Positions sampled per placement attempt before giving up on it
pub const POSITION_TRIES: u32 = 10;
/// Placement attempts per building before it is dropped
pub const PLACEMENT_TRIES: u32 = 10;
/// Fraction of a candidate's size added on every side for the overlap test
pub const OVERLAP_MARGIN: f32 = 0.1;
/// Added to the caller's generation index to seed the RNG
pub const SEED_OFFSET: u64 = 123;

/// Diagnostic counters for one generation pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementStats {
    /// Target count from the params
    pub requested: usize,
    /// Candidates that got a position and size
    pub attempts: usize,
    /// Candidates whose ground was below water
    pub underwater: usize,
    /// Candidates that reached the overlap test
    pub generated: usize,
    /// Buildings kept
    pub placed: usize,
}

/// RNG for a generation pass. Same index, same buildings.
pub fn seeded_rng(generation_index: u64) -> StdRng {
    StdRng::seed_from_u64(generation_index.wrapping_add(SEED_OFFSET))
}

/// Output of [`PlacementGenerator::run`]
#[derive(Clone, Debug)]
pub struct Placement {
    pub buildings: Vec<Building>,
    pub grid: BuildingGrid,
    pub stats: PlacementStats,
}

/// Drives placement for one params/terrain/seed combination
pub struct PlacementGenerator<'a, T: HeightField + ?Sized> {
    params: &'a BuildingParams,
    terrain: &'a T,
    rng: StdRng,
    region: Aabb,
    place_center: Vec2,
    water_level: f32,
}

impl<'a, T: HeightField + ?Sized> PlacementGenerator<'a, T> {
    pub fn new(params: &'a BuildingParams, terrain: &'a T, generation_index: u64) -> Self {
        let region = params.pos_range;
        Self {
            params,
            terrain,
            rng: seeded_rng(generation_index),
            region,
            place_center: region.center().truncate(),
            water_level: terrain.water_level(),
        }
    }

    /// Place up to `params.num` buildings
    pub fn run(mut self) -> Placement {
        let mut buildings = Vec::with_capacity(self.params.num);
        let mut grid = BuildingGrid::new(self.region, GRID_SIZE);
        let mut stats = PlacementStats {
            requested: self.params.num,
            ..Default::default()
        };

        for _ in 0..self.params.num {
            if let Some(building) = self.place_one(&buildings, &grid, &mut stats) {
                assert!(buildings.len() < u32::MAX as usize, "building index overflow");
                grid.insert(&building.bounds, buildings.len() as u32);
                buildings.push(building);
            }
        }
        stats.placed = buildings.len();

        Placement { buildings, grid, stats }
    }

    /// Uniform XY in the region, honoring the placement radius
    fn sample_position(&mut self) -> Option<Vec2> {
        let radius = self.params.place_radius;
        for _ in 0..POSITION_TRIES {
            let p = Vec2::new(
                rand_uniform(&mut self.rng, self.region.min.x, self.region.max.x),
                rand_uniform(&mut self.rng, self.region.min.y, self.region.max.y),
            );
            if radius == 0.0 || p.distance_squared(self.place_center) < radius * radius {
                return Some(p);
            }
        }
        None
    }

    fn place_one(
        &mut self,
        placed: &[Building],
        grid: &BuildingGrid,
        stats: &mut PlacementStats,
    ) -> Option<Building> {
        let material = *self.params.choose_material(&mut self.rng);
        let mut building = Building::from_material(&material);
        let size_range = self.params.size_range;

        for _ in 0..PLACEMENT_TRIES {
            let Some(xy) = self.sample_position() else { continue };
            let ground = self.terrain.height_at(xy.x, xy.y);
            let center = xy.extend(ground);

            // X/Y are half-widths around the center, Z grows up from the ground
            let size = Vec3::new(
                rand_uniform(&mut self.rng, size_range.min.x, size_range.max.x),
                rand_uniform(&mut self.rng, size_range.min.y, size_range.max.y),
                rand_uniform(&mut self.rng, size_range.min.z, size_range.max.z),
            );
            let half = Vec3::new(0.5 * size.x, 0.5 * size.y, 0.0);
            building.bounds = Aabb::new(center - half, center + half + Vec3::new(0.0, 0.0, size.z));
            stats.attempts += 1;

            if ground < self.water_level {
                stats.underwater += 1;
                log::trace!("Dropping building at {:?}: ground {} below water", xy, ground);
                return None;
            }
            stats.generated += 1;

            let test = building.bounds.expanded_by(building.bounds.size() * OVERLAP_MARGIN);
            if !overlaps_any_xy(&test, placed, grid) {
                building.side_color = material.side_color.gen_color(&mut self.rng);
                building.roof_color = material.roof_color.gen_color(&mut self.rng);
                return Some(building);
            }
        }
        None
    }
}

/// True if the footprint of `test` overlaps any building indexed in `grid`
pub fn overlaps_any_xy(test: &Aabb, buildings: &[Building], grid: &BuildingGrid) -> bool {
    grid.candidates(test, |cell| test.intersects_xy(cell))
        .any(|ix| {
            assert!(ix < buildings.len(), "grid index {} out of range", ix);
            test.intersects_xy(&buildings[ix].bounds)
        })
}

/// Convenience wrapper around [`PlacementGenerator`]
pub fn place_buildings<T: HeightField + ?Sized>(
    params: &BuildingParams,
    terrain: &T,
    generation_index: u64,
) -> Placement {
    PlacementGenerator::new(params, terrain, generation_index).run()
}
