//! Sampled height grid that supports flattening

use std::ops::RangeInclusive;

use crate::core::types::Vec2;
use crate::math::Aabb;

use super::HeightField;

/// Square grid of height samples over the XY extent of `region`,
/// bilinearly interpolated. Positions outside the region are clamped to
/// its edge.
///
/// Flattened footprints are kept as pads. Inside a pad the height is
/// exactly the pad's base; samples between pads keep their terrain height,
/// so neighbouring footprints closer than one sample step never overwrite
/// each other.
#[derive(Clone, Debug)]
pub struct HeightMap {
    origin: Vec2,
    step: Vec2,
    resolution: usize,
    heights: Vec<f32>,
    water_level: f32,
    /// Flattened footprints, newest last
    pads: Vec<Aabb>,
    /// Pad indices per grid cell, row-major; empty until the first flatten
    pad_cells: Vec<Vec<u32>>,
}

impl HeightMap {
    /// Build from a height function evaluated at every sample point.
    /// `resolution` is the number of samples per side (at least 2).
    pub fn from_fn(
        region: &Aabb,
        resolution: usize,
        water_level: f32,
        height: impl Fn(f32, f32) -> f32,
    ) -> Self {
        let resolution = resolution.max(2);
        let origin = region.min.truncate();
        let step = (region.max.truncate() - origin) / (resolution - 1) as f32;

        let mut heights = Vec::with_capacity(resolution * resolution);
        for iy in 0..resolution {
            for ix in 0..resolution {
                let p = origin + step * Vec2::new(ix as f32, iy as f32);
                heights.push(height(p.x, p.y));
            }
        }

        Self {
            origin,
            step,
            resolution,
            heights,
            water_level,
            pads: Vec::new(),
            pad_cells: Vec::new(),
        }
    }

    /// Constant-height map
    pub fn flat(region: &Aabb, resolution: usize, height: f32, water_level: f32) -> Self {
        Self::from_fn(region, resolution, water_level, |_, _| height)
    }

    /// Snapshot another height field, keeping its water level
    pub fn sample(source: &impl HeightField, region: &Aabb, resolution: usize) -> Self {
        Self::from_fn(region, resolution, source.water_level(), |x, y| source.height_at(x, y))
    }

    /// Samples per side
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Raw sample at grid coordinate
    pub fn sample_at(&self, ix: usize, iy: usize) -> f32 {
        assert!(ix < self.resolution && iy < self.resolution);
        self.heights[iy * self.resolution + ix]
    }

    /// Number of flattened footprints
    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    /// Continuous grid coordinate of a world position, clamped to the grid
    fn grid_coord(&self, x: f32, y: f32) -> Vec2 {
        let max = (self.resolution - 1) as f32;
        let g = (Vec2::new(x, y) - self.origin) / self.step;
        // Zero-extent axes divide to NaN/inf; pin those to the first sample
        Vec2::new(
            if g.x.is_finite() { g.x.clamp(0.0, max) } else { 0.0 },
            if g.y.is_finite() { g.y.clamp(0.0, max) } else { 0.0 },
        )
    }

    /// Cells per side
    fn cells_per_side(&self) -> usize {
        self.resolution - 1
    }

    /// Grid cell holding a clamped grid coordinate
    fn cell_of(&self, g: Vec2) -> (usize, usize) {
        let last = self.cells_per_side() - 1;
        ((g.x.floor() as usize).min(last), (g.y.floor() as usize).min(last))
    }

    /// Sample indices along `axis` whose positions lie in `[lo, hi]`
    fn samples_within(&self, lo: f32, hi: f32, axis: usize) -> RangeInclusive<usize> {
        let last = self.resolution - 1;
        let origin = self.origin[axis];
        let step = self.step[axis];
        if step <= 0.0 || !step.is_finite() {
            // Every sample sits at the origin on a flat axis
            return if lo <= origin && origin <= hi { 0..=last } else { 1..=0 };
        }
        let a = ((lo - origin) / step).ceil().max(0.0);
        let b = ((hi - origin) / step).floor().min(last as f32);
        if a > b {
            return 1..=0;
        }
        a as usize..=b as usize
    }

    /// Base height of the newest pad containing (x, y)
    fn pad_height(&self, x: f32, y: f32) -> Option<f32> {
        if self.pads.is_empty() {
            return None;
        }
        let (cx, cy) = self.cell_of(self.grid_coord(x, y));
        self.pad_cells[cy * self.cells_per_side() + cx]
            .iter()
            .rev()
            .map(|&ix| &self.pads[ix as usize])
            .find(|pad| x >= pad.min.x && x <= pad.max.x && y >= pad.min.y && y <= pad.max.y)
            .map(|pad| pad.min.z)
    }

    fn add_pad(&mut self, region: &Aabb) {
        assert!(self.pads.len() < u32::MAX as usize, "pad index overflow");
        let cells = self.cells_per_side();
        if self.pad_cells.is_empty() {
            self.pad_cells = vec![Vec::new(); cells * cells];
        }
        let ix = self.pads.len() as u32;
        let lo = self.cell_of(self.grid_coord(region.min.x, region.min.y));
        let hi = self.cell_of(self.grid_coord(region.max.x, region.max.y));
        for cy in lo.1..=hi.1 {
            for cx in lo.0..=hi.0 {
                self.pad_cells[cy * cells + cx].push(ix);
            }
        }
        self.pads.push(*region);
    }
}

impl HeightField for HeightMap {
    fn height_at(&self, x: f32, y: f32) -> f32 {
        if let Some(z) = self.pad_height(x, y) {
            return z;
        }
        let g = self.grid_coord(x, y);
        let last = self.resolution - 1;
        let x0 = (g.x.floor() as usize).min(last);
        let y0 = (g.y.floor() as usize).min(last);
        let x1 = (x0 + 1).min(last);
        let y1 = (y0 + 1).min(last);
        let fx = g.x - x0 as f32;
        let fy = g.y - y0 as f32;

        let h00 = self.sample_at(x0, y0);
        let h10 = self.sample_at(x1, y0);
        let h01 = self.sample_at(x0, y1);
        let h11 = self.sample_at(x1, y1);

        let a = h00 + (h10 - h00) * fx;
        let b = h01 + (h11 - h01) * fx;
        a + (b - a) * fy
    }

    fn water_level(&self) -> f32 {
        self.water_level
    }

    fn can_flatten(&self) -> bool {
        true
    }

    /// Sets the samples inside the footprint to `region.min.z` and records
    /// the footprint as a pad. Samples outside the footprint are untouched.
    fn flatten_region(&mut self, region: &Aabb) {
        let xs = self.samples_within(region.min.x, region.max.x, 0);
        let ys = self.samples_within(region.min.y, region.max.y, 1);
        for iy in ys {
            for ix in xs.clone() {
                self.heights[iy * self.resolution + ix] = region.min.z;
            }
        }
        self.add_pad(region);
    }
}
