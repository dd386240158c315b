//! Generated building population with its grid index

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::terrain::HeightField;

use super::building::Building;
use super::conform::{apply_height_mode, ConformStats, HeightMode};
use super::draw::{draw_buildings, BuildingRenderer, DrawStats, DrawView};
use super::grid::BuildingGrid;
use super::params::BuildingParams;
use super::placement::{place_buildings, PlacementStats};
use super::query::{resolve_sphere_collision, sphere_hits_any};

/// Counters for the most recent generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub placement: PlacementStats,
    pub conform: ConformStats,
}

impl GenerationStats {
    /// Buildings still valid after the height pass
    pub fn valid(&self) -> usize {
        self.placement.placed - self.conform.invalidated
    }
}

/// Buildings plus grid, built once per generation pass and read-only after.
///
/// Queries take `&self` and may run concurrently; regeneration needs
/// `&mut self`. To regenerate while readers are live, build a new set with
/// [`BuildingSet::build`] and swap it in.
#[derive(Clone, Debug, Default)]
pub struct BuildingSet {
    buildings: Vec<Building>,
    grid: Option<BuildingGrid>,
    stats: GenerationStats,
    has_normal_map: bool,
}

impl BuildingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh set
    pub fn build<T: HeightField + ?Sized>(
        params: &BuildingParams,
        terrain: &mut T,
        generation_index: u64,
    ) -> Self {
        let mut set = Self::new();
        set.generate(params, terrain, generation_index);
        set
    }

    /// Replace the contents with a new generation pass.
    ///
    /// The same params, terrain and `generation_index` give the same
    /// buildings.
    pub fn generate<T: HeightField + ?Sized>(
        &mut self,
        params: &BuildingParams,
        terrain: &mut T,
        generation_index: u64,
    ) -> &GenerationStats {
        self.clear();

        let start = Instant::now();
        let placement = place_buildings(params, &*terrain, generation_index);
        let place_time = start.elapsed();

        let mut buildings = placement.buildings;
        let mut grid = placement.grid;

        let start = Instant::now();
        let mode = HeightMode::select(params.flatten_mesh, &*terrain);
        let conform = apply_height_mode(mode, &mut buildings, &mut grid, terrain, params.max_delta_z);
        let height_time = start.elapsed();

        self.stats = GenerationStats { placement: placement.stats, conform };
        self.buildings = buildings;
        self.grid = Some(grid);
        self.has_normal_map = params.has_normal_map();

        let s = &self.stats;
        log::info!(
            "Buildings: {} requested / {} attempts / {} generated / {} kept / {} valid ({:?})",
            s.placement.requested,
            s.placement.attempts,
            s.placement.generated,
            s.placement.placed,
            s.valid(),
            mode,
        );
        log::debug!(
            "Building placement took {:.1}ms, height pass {:.1}ms ({} underwater)",
            place_time.as_secs_f64() * 1000.0,
            height_time.as_secs_f64() * 1000.0,
            s.placement.underwater,
        );
        &self.stats
    }

    pub fn clear(&mut self) {
        self.buildings.clear();
        self.grid = None;
        self.stats = GenerationStats::default();
        self.has_normal_map = false;
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Number of buildings, including invalidated ones
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn valid_buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter().filter(|b| b.is_valid())
    }

    pub fn grid(&self) -> Option<&BuildingGrid> {
        self.grid.as_ref()
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// True if any configured material uses a normal map
    pub fn has_normal_map(&self) -> bool {
        self.has_normal_map
    }

    /// See [`resolve_sphere_collision`]
    pub fn resolve_sphere_collision(&self, position: Vec3, previous: Vec3, radius: f32) -> Option<Vec3> {
        let grid = self.grid.as_ref()?;
        resolve_sphere_collision(&self.buildings, grid, position, previous, radius)
    }

    /// True if a stationary sphere touches a building
    pub fn check_sphere_collision(&self, center: Vec3, radius: f32) -> bool {
        self.grid
            .as_ref()
            .is_some_and(|grid| sphere_hits_any(&self.buildings, grid, center, radius))
    }

    /// True if the point is inside or on a building
    pub fn check_point_collision(&self, point: Vec3) -> bool {
        self.check_sphere_collision(point, 0.0)
    }

    /// Cull and draw every building through `renderer`
    pub fn draw(
        &self,
        view: &DrawView,
        shadow_pass: bool,
        world_offset: Vec3,
        renderer: &mut impl BuildingRenderer,
    ) -> DrawStats {
        draw_buildings(&self.buildings, view, shadow_pass, world_offset, self.has_normal_map, renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::draw::DrawList;
    use crate::buildings::placement::OVERLAP_MARGIN;
    use crate::math::{Aabb, Frustum};
    use crate::terrain::{HeightMap, NoiseTerrain, TerrainParams};

    fn region() -> Aabb {
        Aabb::new(Vec3::new(-500.0, -500.0, 0.0), Vec3::new(500.0, 500.0, 0.0))
    }

    fn city_params() -> BuildingParams {
        let mut params = BuildingParams::new(
            600,
            region(),
            Vec3::new(8.0, 8.0, 10.0),
            Vec3::new(30.0, 30.0, 60.0),
        );
        params.max_delta_z = 4.0;
        params
    }

    fn hilly() -> NoiseTerrain {
        NoiseTerrain::new(TerrainParams {
            seed: 7,
            scale: 300.0,
            height_scale: 80.0,
            sea_level: 25.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_generate_invariants() {
        let mut terrain = hilly();
        let set = BuildingSet::build(&city_params(), &mut terrain, 3);
        let grid = set.grid().expect("grid built");
        let stats = set.stats();

        assert!(!set.is_empty());
        assert_eq!(stats.placement.placed, set.len());
        assert_eq!(stats.valid(), set.valid_buildings().count());

        let buildings = set.buildings();
        for (i, b) in buildings.iter().enumerate() {
            if !b.is_valid() {
                continue;
            }
            let size = b.bounds.size();
            assert!(size.x > 0.0 && size.y > 0.0);
            assert!(b.bounds.min.z >= terrain.water_level());

            // Grid membership is exactly the cell range of the footprint
            let range = grid.cell_range(&b.bounds);
            for ((x, y), cell) in grid.cells() {
                let member = cell.indices().contains(&(i as u32));
                assert_eq!(member, range.contains(x, y), "building {} cell ({}, {})", i, x, y);
                if member {
                    let cb = cell.bounds().expect("member cell has bounds");
                    assert!(cb.min.cmple(b.bounds.min).all() && cb.max.cmpge(b.bounds.max).all());
                }
            }

            // Margin against every earlier valid building
            let grown = b.bounds.expanded_by(size * OVERLAP_MARGIN);
            for earlier in buildings[..i].iter().filter(|e| e.is_valid()) {
                assert!(!grown.intersects_xy(&earlier.bounds));
            }
        }
    }

    #[test]
    fn test_regenerate_is_reproducible() {
        let mut terrain = hilly();
        let params = city_params();

        let once = BuildingSet::build(&params, &mut terrain, 11);
        let mut again = BuildingSet::build(&params, &mut terrain, 11);
        again.clear();
        assert!(again.is_empty());
        again.generate(&params, &mut terrain, 11);

        assert_eq!(once.buildings(), again.buildings());
        assert_eq!(once.stats(), again.stats());
    }

    #[test]
    fn test_all_underwater_yields_nothing() {
        let mut terrain = HeightMap::flat(&region(), 4, 1.0, 5.0);
        let set = BuildingSet::build(&city_params(), &mut terrain, 0);
        assert_eq!(set.valid_buildings().count(), 0);
        assert_eq!(set.stats().placement.underwater, 600);
    }

    #[test]
    fn test_slope_rejection_marks_invalid() {
        // Steep ramp: every footprint drops more than max_delta_z from its center
        let mut terrain = HeightMap::from_fn(&region(), 65, -1000.0, |x, _| x * 2.0);
        let mut params = city_params();
        params.num = 50;
        params.max_delta_z = 1.0;
        let set = BuildingSet::build(&params, &mut terrain, 2);

        assert!(!set.is_empty());
        assert_eq!(set.stats().conform.invalidated, set.len());
        assert!(set.buildings().iter().all(|b| b.bounds == Aabb::ZERO));
        assert!(!set.check_point_collision(Vec3::ZERO));
    }

    #[test]
    fn test_flatten_mode() {
        let mut terrain = HeightMap::from_fn(&region(), 129, 2.0, |x, y| 100.0 + 0.01 * (x + y));
        let mut params = city_params();
        params.num = 1;
        params.flatten_mesh = true;
        let set = BuildingSet::build(&params, &mut terrain, 5);

        assert_eq!(set.stats().conform.mode, HeightMode::Flatten);
        assert_eq!(set.valid_buildings().count(), 1);
        let b = set.buildings()[0].bounds;
        for corner in b.corners_xy() {
            assert_eq!(terrain.height_at(corner.x, corner.y), b.min.z);
        }
        let grid = set.grid().unwrap();
        for (_, cell) in grid.cells() {
            if let Some(cb) = cell.bounds() {
                assert_eq!(cb.min.z, 2.0);
            }
        }
    }

    #[test]
    fn test_flatten_dense_city_keeps_every_base() {
        let noise = NoiseTerrain::new(TerrainParams {
            seed: 99,
            scale: 300.0,
            height_scale: 80.0,
            sea_level: 20.0,
            ..Default::default()
        });
        let mut terrain = HeightMap::sample(&noise, &region(), 257);
        let mut params = city_params();
        params.num = 500;
        params.flatten_mesh = true;
        let set = BuildingSet::build(&params, &mut terrain, 4);

        assert_eq!(set.stats().conform.mode, HeightMode::Flatten);
        assert!(set.valid_buildings().count() > 100);
        for b in set.valid_buildings() {
            for corner in b.bounds.corners_xy() {
                assert_eq!(terrain.height_at(corner.x, corner.y), b.bounds.min.z, "corner {:?}", corner);
            }
            assert_eq!(terrain.height_at(b.bounds.center().x, b.bounds.center().y), b.bounds.min.z);
        }
    }

    #[test]
    fn test_collision_and_draw_through_set() {
        let mut terrain = HeightMap::flat(&region(), 4, 0.0, -1.0);
        let mut params = city_params();
        params.num = 40;
        let set = BuildingSet::build(&params, &mut terrain, 8);
        let target = set.buildings()[0].bounds;

        // Approach the first building from -X at mid height
        let c = target.center();
        let r = 0.5;
        let previous = Vec3::new(target.min.x - r - 0.2, c.y, c.z);
        let position = Vec3::new(target.min.x - r + 0.3, c.y, c.z);
        let resolved = set.resolve_sphere_collision(position, previous, r).expect("should hit");
        assert_eq!(resolved, Vec3::new(target.min.x - r, c.y, c.z));
        assert!(!set.check_sphere_collision(resolved, 0.9 * r));
        assert!(set.check_point_collision(c));

        let eye = Vec3::new(0.0, -2000.0, 2000.0);
        let view = DrawView {
            camera_pos: eye,
            frustum: Frustum::look_at(eye, Vec3::ZERO, 1.2, 1.0, 1.0, 5000.0),
            far_clip: 5000.0,
        };
        let mut list = DrawList::new();
        let stats = set.draw(&view, false, Vec3::ZERO, &mut list);
        assert_eq!(stats.drawn, set.len());
        assert_eq!(list.calls.len(), stats.calls);
    }

    #[test]
    fn test_empty_set_queries() {
        let set = BuildingSet::new();
        let p = Vec3::splat(1.0);
        assert!(set.is_empty());
        assert!(set.resolve_sphere_collision(p, p, 1.0).is_none());
        assert!(!set.check_point_collision(p));
        let mut list = DrawList::new();
        let view = DrawView {
            camera_pos: Vec3::ZERO,
            frustum: Frustum::look_at(Vec3::ZERO, Vec3::X, 1.0, 1.0, 0.1, 100.0),
            far_clip: 100.0,
        };
        assert_eq!(set.draw(&view, false, Vec3::ZERO, &mut list), DrawStats::default());
    }
}
