//! Per-building draw culling and draw-call emission.
//!
//! Iterates the whole building list; culling is per object, the grid is
//! not consulted. Actual rendering belongs to a [`BuildingRenderer`].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::types::{Vec3, Vec4};
use crate::math::Frustum;

use super::building::Building;
use super::material::TextureBinding;

/// Face mask bits: one bit per axis, both faces along that axis
pub const FACES_X: u32 = 1 << 0;
pub const FACES_Y: u32 = 1 << 1;
pub const FACES_Z: u32 = 1 << 2;
pub const FACES_SIDES: u32 = FACES_X | FACES_Y;
pub const FACES_ALL: u32 = FACES_SIDES | FACES_Z;

/// One textured, colored box draw (80 bytes, GPU-uploadable)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawCall {
    /// World-space box center, offset applied
    pub center: [f32; 3],
    /// FACES_* bits
    pub face_mask: u32,
    /// Box size
    pub size: [f32; 3],
    /// Texture repeats per world unit
    pub tile_scale: f32,
    pub color: [f32; 4],
    /// Camera to center; zero means draw all faces of the mask
    pub view_dir: [f32; 3],
    /// Texture id, -1 for none
    pub texture: i32,
    /// Normal map id, -1 for none
    pub normal_map: i32,
    pub _pad: [u32; 3],
}

impl DrawCall {
    fn new(center: Vec3, size: Vec3, tex: &TextureBinding, color: Vec4, face_mask: u32, view_dir: Vec3) -> Self {
        let id = |t: Option<u32>| t.map_or(-1, |v| v as i32);
        Self {
            center: center.to_array(),
            face_mask,
            size: size.to_array(),
            tile_scale: tex.tile_scale,
            color: color.to_array(),
            view_dir: view_dir.to_array(),
            texture: id(tex.texture),
            normal_map: id(tex.normal_map),
            _pad: [0; 3],
        }
    }

    pub fn textured(&self) -> bool {
        self.texture >= 0 || self.normal_map >= 0
    }
}

/// Rendering collaborator consuming draw calls
pub trait BuildingRenderer {
    /// Called once before any draw of a pass
    fn begin(&mut self, _shadow_pass: bool, _use_normal_maps: bool) {}

    fn draw_box(&mut self, call: &DrawCall);
}

/// Renderer that records calls, e.g. for a single buffer upload
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    pub calls: Vec<DrawCall>,
    pub shadow_pass: bool,
    pub use_normal_maps: bool,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of all recorded calls
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.calls)
    }
}

impl BuildingRenderer for DrawList {
    fn begin(&mut self, shadow_pass: bool, use_normal_maps: bool) {
        self.calls.clear();
        self.shadow_pass = shadow_pass;
        self.use_normal_maps = use_normal_maps;
    }

    fn draw_box(&mut self, call: &DrawCall) {
        self.calls.push(*call);
    }
}

/// Camera state for culling
#[derive(Clone, Copy, Debug)]
pub struct DrawView {
    pub camera_pos: Vec3,
    pub frustum: Frustum,
    /// Buildings whose center is further than this plus half their
    /// diagonal are skipped
    pub far_clip: f32,
}

/// Per-pass culling counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStats {
    pub drawn: usize,
    pub invalid: usize,
    pub distance_culled: usize,
    pub frustum_culled: usize,
    /// Draw calls issued (one or two per drawn building)
    pub calls: usize,
}

/// Cull and draw every building.
///
/// Shadow passes draw all faces untextured in one call. Otherwise a
/// building whose side and roof share texture and color takes one call,
/// and anything else draws sides and roof/floor separately.
pub fn draw_buildings(
    buildings: &[Building],
    view: &DrawView,
    shadow_pass: bool,
    world_offset: Vec3,
    use_normal_maps: bool,
    renderer: &mut impl BuildingRenderer,
) -> DrawStats {
    let mut stats = DrawStats::default();
    if buildings.is_empty() {
        return stats;
    }
    renderer.begin(shadow_pass, use_normal_maps);

    for b in buildings {
        if !b.is_valid() {
            stats.invalid += 1;
            continue;
        }
        let size = b.bounds.size();
        let pos = b.bounds.center() + world_offset;
        let dmax = view.far_clip + 0.5 * size.length();
        if view.camera_pos.distance_squared(pos) >= dmax * dmax {
            stats.distance_culled += 1;
            continue;
        }
        if !view.frustum.intersects_sphere(pos, b.bounds.bounding_radius()) {
            stats.frustum_culled += 1;
            continue;
        }

        stats.drawn += 1;
        if shadow_pass {
            renderer.draw_box(&DrawCall::new(pos, size, &TextureBinding::NONE, Vec4::ONE, FACES_ALL, Vec3::ZERO));
            stats.calls += 1;
            continue;
        }

        let view_dir = pos - view.camera_pos;
        let single_pass = b.is_uniform();
        let side_faces = if single_pass { FACES_ALL } else { FACES_SIDES };
        renderer.draw_box(&DrawCall::new(pos, size, &b.side_tex, b.side_color, side_faces, view_dir));
        stats.calls += 1;

        if !single_pass {
            renderer.draw_box(&DrawCall::new(pos, size, &b.roof_tex, b.roof_color, FACES_Z, view_dir));
            stats.calls += 1;
        }
    }
    stats
}
