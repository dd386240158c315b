//! Axis-aligned bounding box

use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, Vec3};

/// Axis-aligned bounding box defined by min and max corners.
///
/// Z is up. An all-zero box is used as the "invalid" marker for culled
/// buildings, see [`Aabb::ZERO`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Degenerate all-zero box
    pub const ZERO: Aabb = Aabb { min: Vec3::ZERO, max: Vec3::ZERO };

    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Cube bounding a sphere
    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        Self::from_center_half_extent(center, Vec3::splat(radius))
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Radius of the bounding sphere (half the diagonal)
    pub fn bounding_radius(&self) -> f32 {
        self.half_extent().length()
    }

    /// True for the all-zero marker box
    pub fn is_zero(&self) -> bool {
        self.min == Vec3::ZERO && self.max == Vec3::ZERO
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Overlap of the XY footprints. Touching edges do not count.
    pub fn intersects_xy(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y
    }

    /// Grow in place to contain `other`
    pub fn union_with(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Copy moved outward by `amount` on every side
    pub fn expanded_by(&self, amount: Vec3) -> Aabb {
        Aabb {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    /// Nearest point inside the box
    pub fn clamp_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// Footprint corners in (x, y): bit 0 selects max x, bit 1 selects max y
    pub fn corners_xy(&self) -> [Vec2; 4] {
        std::array::from_fn(|i| Vec2::new(
            if i & 1 != 0 { self.max.x } else { self.min.x },
            if i & 2 != 0 { self.max.y } else { self.min.y },
        ))
    }
}
