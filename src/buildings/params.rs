//! Generation parameters

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::math::Aabb;

use super::material::Material;

/// Everything one generation pass reads. Passed by reference into
/// generation; nothing is read from ambient state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingParams {
    /// Flatten the terrain under buildings instead of conforming them to it
    pub flatten_mesh: bool,
    /// Target building count
    pub num: usize,
    /// Placement radius around the region center; 0 disables it
    pub place_radius: f32,
    /// Largest allowed drop from the center ground height to the lowest
    /// corner; 0 disables the slope check. Corners above the center ground
    /// never count against it.
    pub max_delta_z: f32,
    /// Per-axis size range. X/Y are full widths, Z is the height above ground.
    pub size_range: Aabb,
    /// Placement region; only X/Y are used
    pub pos_range: Aabb,
    /// Palette, chosen from uniformly
    pub materials: Vec<Material>,
}

impl Default for BuildingParams {
    fn default() -> Self {
        Self {
            flatten_mesh: false,
            num: 0,
            place_radius: 0.0,
            max_delta_z: 0.0,
            size_range: Aabb::ZERO,
            pos_range: Aabb::ZERO,
            materials: Vec::new(),
        }
    }
}

impl BuildingParams {
    /// Params with one default material
    pub fn new(num: usize, pos_range: Aabb, size_min: Vec3, size_max: Vec3) -> Self {
        Self {
            num,
            pos_range,
            size_range: Aabb::new(size_min, size_max),
            materials: vec![Material::DEFAULT],
            ..Default::default()
        }
    }

    /// Pick a palette entry. An empty palette behaves as the default material.
    pub fn choose_material(&self, rng: &mut impl Rng) -> &Material {
        let count = self.materials.len().max(1);
        let ix = rng.gen_range(0..count);
        self.materials.get(ix).unwrap_or(&Material::DEFAULT)
    }

    /// True if any material binds a normal map
    pub fn has_normal_map(&self) -> bool {
        self.materials.iter().any(Material::has_normal_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_palette_uses_default() {
        let params = BuildingParams::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(*params.choose_material(&mut rng), Material::DEFAULT);
    }

    #[test]
    fn test_choose_covers_palette() {
        let mut params = BuildingParams::default();
        for i in 0..3 {
            let mut m = Material::DEFAULT;
            m.side_tex.texture = Some(i);
            params.materials.push(m);
        }
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let m = params.choose_material(&mut rng);
            seen[m.side_tex.texture.unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_json_roundtrip() {
        let params = BuildingParams::new(
            10,
            Aabb::new(Vec3::ZERO, Vec3::new(100.0, 100.0, 0.0)),
            Vec3::splat(1.0),
            Vec3::splat(2.0),
        );
        let json = serde_json::to_string(&params).unwrap();
        let back: BuildingParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
