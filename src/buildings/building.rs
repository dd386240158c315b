//! A single placed building

use serde::{Deserialize, Serialize};

use crate::core::types::Vec4;
use crate::math::Aabb;

use super::material::{Material, TextureBinding};

/// Colored, textured box standing on the terrain
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// World bounds; [`Aabb::ZERO`] once invalidated
    pub bounds: Aabb,
    pub side_color: Vec4,
    pub roof_color: Vec4,
    pub side_tex: TextureBinding,
    pub roof_tex: TextureBinding,
}

impl Building {
    /// White building with the material's textures and zero bounds
    pub fn from_material(material: &Material) -> Self {
        Self {
            bounds: Aabb::ZERO,
            side_color: Vec4::ONE,
            roof_color: Vec4::ONE,
            side_tex: material.side_tex,
            roof_tex: material.roof_tex,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.bounds.is_zero()
    }

    /// Mark as culled. Permanent for the rest of the generation cycle.
    pub fn invalidate(&mut self) {
        self.bounds = Aabb::ZERO;
    }

    /// Sides, roof and floor share texture and color
    pub fn is_uniform(&self) -> bool {
        self.side_tex == self.roof_tex && self.side_color == self.roof_color
    }
}
