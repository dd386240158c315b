//! Noise-based procedural terrain height

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::HeightField;

/// Parameters controlling terrain generation
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
    pub sea_level: f32,    // Height below which is "water"
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 100.0,
            height_scale: 64.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            sea_level: 16.0,
        }
    }
}

/// Read-only terrain using fractal Brownian motion (FBM).
///
/// Cannot be flattened; pair it with [`super::HeightMap::sample`] when
/// flatten mode is wanted.
pub struct NoiseTerrain {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl NoiseTerrain {
    /// Create a new terrain with the given parameters
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }
}

impl HeightField for NoiseTerrain {
    fn height_at(&self, x: f32, y: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let ny = (y / self.params.scale) as f64;

        // Noise is roughly in [-1, 1]; map to [0, height_scale]
        let normalized = ((self.noise.get([nx, ny]) + 1.0) / 2.0).clamp(0.0, 1.0);
        (normalized * self.params.height_scale as f64) as f32
    }

    fn water_level(&self) -> f32 {
        self.params.sea_level
    }
}
