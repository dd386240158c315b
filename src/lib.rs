//! Buildgen - procedural box buildings over terrain
//!
//! Places a population of non-overlapping axis-aligned buildings over a
//! terrain region, indexes them in a uniform grid, conforms their bases to
//! the ground, and answers sphere collision and draw-culling queries.

pub mod core;
pub mod math;
pub mod terrain;
pub mod buildings;
