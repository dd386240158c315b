//! Procedural box buildings: placement, grid index, height pass,
//! collision and draw culling.

pub mod building;
pub use building::Building;

pub mod material;
pub use material::{ColorRange, Material, TextureBinding, TextureLookup, TextureRegistry};

pub mod params;
pub use params::BuildingParams;

pub mod config;
pub use config::{ConfigError, ConfigParser, ParsedConfig, load_params, parse_params};

pub mod grid;
pub use grid::{BuildingGrid, CellRange, GridCell, GRID_SIZE};

pub mod placement;
pub use placement::{Placement, PlacementGenerator, PlacementStats, place_buildings};

pub mod conform;
pub use conform::{ConformStats, HeightMode, apply_height_mode};

pub mod query;
pub use query::{resolve_sphere_collision, sphere_hits_any};

pub mod draw;
pub use draw::{BuildingRenderer, DrawCall, DrawList, DrawStats, DrawView, draw_buildings};

pub mod set;
pub use set::{BuildingSet, GenerationStats};
