//! Uniform grid index over the placement region.
//!
//! Buildings are stored by index into the owning building list; cells never
//! copy building data. Insertion is append-only. Each cell keeps the union
//! of its members' boxes as a fast rejection test.

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;

/// Cells per side
pub const GRID_SIZE: usize = 32;

/// One grid cell: member indices plus the union of their boxes
#[derive(Clone, Debug, Default)]
pub struct GridCell {
    bounds: Aabb,
    indices: Vec<u32>,
}

impl GridCell {
    fn add(&mut self, bounds: &Aabb, index: u32) {
        if self.indices.is_empty() {
            self.bounds = *bounds;
        } else {
            self.bounds.union_with(bounds);
        }
        self.indices.push(index);
    }

    /// Union of member boxes, `None` for an empty cell
    pub fn bounds(&self) -> Option<&Aabb> {
        (!self.indices.is_empty()).then_some(&self.bounds)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Inclusive rectangle of cell coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: (usize, usize),
    pub max: (usize, usize),
}

impl CellRange {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.min.0..=self.max.0).contains(&x) && (self.min.1..=self.max.1).contains(&y)
    }

    /// Cells in row-major order
    pub fn iter(self) -> impl Iterator<Item = (usize, usize)> {
        (self.min.1..=self.max.1).flat_map(move |y| (self.min.0..=self.max.0).map(move |x| (x, y)))
    }
}

/// Square grid of [`GridCell`]s covering the XY extent of a region
#[derive(Clone, Debug)]
pub struct BuildingGrid {
    region: Aabb,
    inv_size: Vec2,
    size: usize,
    cells: Vec<GridCell>,
}

impl BuildingGrid {
    pub fn new(region: Aabb, size: usize) -> Self {
        assert!(size > 0, "grid needs at least one cell");
        let extent = region.size().truncate();
        // A flat axis maps everything to cell 0
        let inv = |e: f32| if e > 0.0 { 1.0 / e } else { 0.0 };
        Self {
            region,
            inv_size: Vec2::new(inv(extent.x), inv(extent.y)),
            size,
            cells: vec![GridCell::default(); size * size],
        }
    }

    pub fn region(&self) -> &Aabb {
        &self.region
    }

    /// Cells per side
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell(&self, x: usize, y: usize) -> &GridCell {
        assert!(x < self.size && y < self.size, "grid cell ({}, {}) out of range", x, y);
        &self.cells[y * self.size + x]
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> &mut GridCell {
        assert!(x < self.size && y < self.size, "grid cell ({}, {}) out of range", x, y);
        &mut self.cells[y * self.size + x]
    }

    /// All cells with their coordinates, row-major
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &GridCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| ((i % self.size, i / self.size), c))
    }

    /// Cell containing `pos` after clamping it into the region
    pub fn cell_for(&self, pos: Vec3) -> (usize, usize) {
        let p = self.region.clamp_point(pos).truncate();
        let v = (p - self.region.min.truncate()) * self.inv_size;
        let scale = (self.size - 1) as f32;
        let ix = ((v.x * scale) as usize, (v.y * scale) as usize);
        assert!(ix.0 < self.size && ix.1 < self.size);
        ix
    }

    /// Cells spanned by the XY footprint of `bounds`
    pub fn cell_range(&self, bounds: &Aabb) -> CellRange {
        CellRange {
            min: self.cell_for(bounds.min),
            max: self.cell_for(bounds.max),
        }
    }

    /// Add `index` to every cell its footprint spans
    pub fn insert(&mut self, bounds: &Aabb, index: u32) {
        for (x, y) in self.cell_range(bounds).iter() {
            self.cell_mut(x, y).add(bounds, index);
        }
    }

    /// Member indices of the cells spanned by `query` whose union box
    /// passes `cell_filter`. An index may repeat if it spans several cells.
    pub fn candidates<'a, F>(&'a self, query: &Aabb, cell_filter: F) -> impl Iterator<Item = usize> + 'a
    where
        F: Fn(&Aabb) -> bool + 'a,
    {
        self.cell_range(query)
            .iter()
            .map(move |(x, y)| self.cell(x, y))
            .filter(move |cell| cell.bounds().is_some_and(|b| cell_filter(b)))
            .flat_map(|cell| cell.indices.iter().map(|&ix| ix as usize))
    }

    /// Lower every cell's Z bound to `z` without rescanning members
    pub fn relax_min_z(&mut self, z: f32) {
        for cell in &mut self.cells {
            cell.bounds.min.z = cell.bounds.min.z.min(z);
        }
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = GridCell::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> BuildingGrid {
        BuildingGrid::new(Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)), GRID_SIZE)
    }

    #[test]
    fn test_cell_for_corners_and_clamp() {
        let grid = unit_grid();
        assert_eq!(grid.cell_for(Vec3::ZERO), (0, 0));
        assert_eq!(grid.cell_for(Vec3::new(1.0, 1.0, 5.0)), (31, 31));
        assert_eq!(grid.cell_for(Vec3::new(-3.0, 7.0, 0.0)), (0, 31));
        assert_eq!(grid.cell_for(Vec3::new(0.5, 0.25, 0.0)), (15, 7));
    }

    #[test]
    fn test_flat_region_maps_to_first_cell() {
        let grid = BuildingGrid::new(Aabb::new(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0)), 8);
        assert_eq!(grid.cell_for(Vec3::new(10.0, 4.0, 0.0)), (0, 7));
    }

    #[test]
    fn test_insert_membership() {
        let mut grid = unit_grid();
        let b = Aabb::new(Vec3::new(0.1, 0.1, 0.0), Vec3::new(0.2, 0.3, 1.0));
        grid.insert(&b, 0);

        let range = grid.cell_range(&b);
        assert_eq!(range.min, (3, 3));
        assert_eq!(range.max, (6, 9));
        for ((x, y), cell) in grid.cells() {
            assert_eq!(range.contains(x, y), cell.indices() == [0], "cell ({}, {})", x, y);
        }
    }

    #[test]
    fn test_cell_bounds_union() {
        let mut grid = BuildingGrid::new(Aabb::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0)), 2);
        let a = Aabb::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 3.0));
        let b = Aabb::new(Vec3::new(3.0, 0.5, 1.0), Vec3::new(4.0, 1.5, 5.0));
        grid.insert(&a, 0);
        grid.insert(&b, 1);

        let cell = grid.cell(0, 0);
        assert_eq!(cell.indices(), &[0, 1]);
        assert_eq!(cell.bounds(), Some(&Aabb::new(Vec3::new(1.0, 0.5, 0.0), Vec3::new(4.0, 2.0, 5.0))));
        assert!(grid.cell(1, 1).bounds().is_none());

        grid.relax_min_z(-2.0);
        assert_eq!(grid.cell(0, 0).bounds().unwrap().min.z, -2.0);
    }

    #[test]
    fn test_candidates_filter() {
        let mut grid = unit_grid();
        grid.insert(&Aabb::new(Vec3::new(0.1, 0.1, 0.0), Vec3::new(0.15, 0.15, 1.0)), 0);
        grid.insert(&Aabb::new(Vec3::new(0.8, 0.8, 0.0), Vec3::new(0.85, 0.85, 1.0)), 1);

        let everything = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let mut all: Vec<usize> = grid.candidates(&everything, |_| true).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all, vec![0, 1]);

        let near_first = Aabb::new(Vec3::new(0.05, 0.05, 0.0), Vec3::new(0.2, 0.2, 1.0));
        let hits: Vec<usize> = grid.candidates(&near_first, |b| b.intersects_xy(&near_first)).collect();
        assert!(hits.iter().all(|&i| i == 0));
        assert!(!hits.is_empty());
    }
}
