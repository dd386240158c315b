//! Building materials: texture bindings and color ranges

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::Vec4;

/// Uniform sample in `[min, max)`. Tolerates `min > max` and `min == max`.
#[inline]
pub(crate) fn rand_uniform(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.r#gen::<f32>()
}

/// Texture and normal map applied to one face group
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureBinding {
    pub texture: Option<u32>,
    pub normal_map: Option<u32>,
    /// UV repeats per world unit
    pub tile_scale: f32,
}

impl TextureBinding {
    pub const NONE: TextureBinding = TextureBinding {
        texture: None,
        normal_map: None,
        tile_scale: 1.0,
    };

    pub fn enabled(&self) -> bool {
        self.texture.is_some() || self.normal_map.is_some()
    }
}

impl Default for TextureBinding {
    fn default() -> Self {
        Self::NONE
    }
}

/// RGBA range a building color is drawn from
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub min: Vec4,
    pub max: Vec4,
    /// Upper bound of a random gray offset added to R, G and B
    pub grayscale_jitter: f32,
}

impl ColorRange {
    pub const WHITE: ColorRange = ColorRange {
        min: Vec4::ONE,
        max: Vec4::ONE,
        grayscale_jitter: 0.0,
    };

    /// Range collapsed to one color
    pub fn exact(color: Vec4) -> Self {
        Self { min: color, max: color, grayscale_jitter: 0.0 }
    }

    /// Draw a concrete color.
    ///
    /// Exact ranges consume no randomness for the base color. Otherwise each
    /// channel is independent. Jitter is one shared value for R, G and B.
    pub fn gen_color(&self, rng: &mut impl Rng) -> Vec4 {
        let mut color = if self.min == self.max {
            self.min
        } else {
            Vec4::new(
                rand_uniform(rng, self.min.x, self.max.x),
                rand_uniform(rng, self.min.y, self.max.y),
                rand_uniform(rng, self.min.z, self.max.z),
                rand_uniform(rng, self.min.w, self.max.w),
            )
        };
        if self.grayscale_jitter > 0.0 {
            let v = self.grayscale_jitter * rng.r#gen::<f32>();
            color.x += v;
            color.y += v;
            color.z += v;
        }
        color
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One entry of the material palette
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub side_tex: TextureBinding,
    pub roof_tex: TextureBinding,
    pub side_color: ColorRange,
    pub roof_color: ColorRange,
}

impl Material {
    /// Untextured white, used when no material is configured
    pub const DEFAULT: Material = Material {
        side_tex: TextureBinding::NONE,
        roof_tex: TextureBinding::NONE,
        side_color: ColorRange::WHITE,
        roof_color: ColorRange::WHITE,
    };

    pub fn has_normal_map(&self) -> bool {
        self.side_tex.normal_map.is_some() || self.roof_tex.normal_map.is_some()
    }
}

/// Resolves texture names from config files to texture ids
pub trait TextureLookup {
    /// `None` if the name is unknown
    fn texture_id(&mut self, name: &str, normal_map: bool) -> Option<u32>;
}

/// Name table handing out sequential ids on first use.
///
/// Normal maps and color textures share one id space.
#[derive(Clone, Debug, Default)]
pub struct TextureRegistry {
    ids: HashMap<String, u32>,
    names: Vec<String>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TextureLookup for TextureRegistry {
    fn texture_id(&mut self, name: &str, _normal_map: bool) -> Option<u32> {
        if name.is_empty() || name == "none" {
            return None;
        }
        if let Some(&id) = self.ids.get(name) {
            return Some(id);
        }
        let id = self.names.len() as u32;
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        Some(id)
    }
}
