//! Terrain height fields consumed by building generation

pub mod generator;
pub use generator::{NoiseTerrain, TerrainParams};

pub mod heightmap;
pub use heightmap::HeightMap;

use crate::math::Aabb;

/// Ground height source for building placement.
///
/// Z is up; `height_at` takes world X/Y. Implementations must be `Sync`
/// because per-building height conformance samples them from a thread pool.
pub trait HeightField: Sync {
    /// Ground height at world position (x, y)
    fn height_at(&self, x: f32, y: f32) -> f32;

    /// Global water height. Nothing is placed with its ground below this.
    fn water_level(&self) -> f32;

    /// Whether [`HeightField::flatten_region`] modifies the terrain
    fn can_flatten(&self) -> bool {
        false
    }

    /// Flatten the ground under the XY footprint of `region` to `region.min.z`
    fn flatten_region(&mut self, _region: &Aabb) {}
}
