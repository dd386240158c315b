//! Building generator binary: places buildings over noise terrain and
//! reports what was kept.
//!
//! Usage: cargo run --release --bin generate_buildings -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Text config or JSON params dump (default: built-in city)
//!   --seed <SEED>     Terrain seed and generation index (default: 12345)
//!   --count <N>       Override the building count
//!   --size <METERS>   Region size when no config sets pos_range (default: 1000)
//!   --res <N>         Height map samples per side (default: 257)
//!   --json <PATH>     Write a JSON summary with every valid building
//!   --strict          Fail on the first config error instead of skipping it

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec3;
use serde_json::json;

use buildgen::buildings::{BuildingParams, BuildingSet, DrawList, DrawView, TextureRegistry, load_params};
use buildgen::core::{Error, Result};
use buildgen::math::{Aabb, Frustum};
use buildgen::terrain::{HeightField, HeightMap, NoiseTerrain, TerrainParams};

fn main() -> Result<()> {
    buildgen::core::logging::init_with_timestamps();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_str_arg(&args, "--config").map(PathBuf::from);
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let count = parse_usize_arg(&args, "--count");
    let size = parse_f32_arg(&args, "--size").unwrap_or(1000.0);
    let resolution = parse_usize_arg(&args, "--res").unwrap_or(257);
    let json_path = parse_str_arg(&args, "--json").map(PathBuf::from);
    let strict = args.iter().any(|a| a == "--strict");

    let half = 0.5 * size;
    let default_region = Aabb::new(Vec3::new(-half, -half, 0.0), Vec3::new(half, half, 0.0));

    let mut textures = TextureRegistry::new();
    let mut params = match &config_path {
        Some(path) => {
            let parsed = load_params(path, &mut textures)?;
            if strict {
                if let Some(err) = parsed.errors.first() {
                    return Err(Error::Config(err.clone()));
                }
            }
            parsed.params
        }
        None => default_params(default_region),
    };
    if let Some(count) = count {
        params.num = count;
    }
    if params.pos_range.size().truncate() == glam::Vec2::ZERO {
        params.pos_range = default_region;
    }

    println!("=== Buildgen Building Generator ===");
    println!("Config:    {}", config_path.as_ref().map_or("built-in".to_string(), |p| p.display().to_string()));
    println!("Seed:      {}", seed);
    println!("Buildings: {}", params.num);
    println!("Region:    {:?} .. {:?}", params.pos_range.min.truncate(), params.pos_range.max.truncate());
    println!("Textures:  {}", textures.len());
    println!();

    let start = Instant::now();
    let noise = NoiseTerrain::new(TerrainParams {
        seed,
        scale: 300.0,
        height_scale: 80.0,
        sea_level: 20.0,
        ..Default::default()
    });
    let mut terrain = HeightMap::sample(&noise, &params.pos_range, resolution);
    log::info!(
        "Sampled {}x{} height map in {:.1}ms",
        terrain.resolution(),
        terrain.resolution(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let set = BuildingSet::build(&params, &mut terrain, seed as u64);
    let stats = *set.stats();

    // Walk a sphere across the region at head height and count contacts
    let region = params.pos_range;
    let steps = 2000;
    let radius = 0.5;
    let mut contacts = 0;
    let mut previous = Vec3::new(region.min.x, region.center().y, 0.0);
    previous.z = terrain.height_at(previous.x, previous.y) + 1.8;
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        let x = region.min.x + t * region.size().x;
        let mut position = Vec3::new(x, previous.y, terrain.height_at(x, previous.y) + 1.8);
        if let Some(resolved) = set.resolve_sphere_collision(position, previous, radius) {
            contacts += 1;
            position = resolved;
        }
        previous = position;
    }
    log::info!("Collision sweep: {} contacts over {} steps", contacts, steps);

    // One overhead view of the whole region
    let eye = region.center() + Vec3::new(0.0, -region.size().y, region.size().x.max(region.size().y));
    let far_clip = 4.0 * region.size().length().max(1.0);
    let view = DrawView {
        camera_pos: eye,
        frustum: Frustum::look_at(eye, region.center(), 1.0, 16.0 / 9.0, 1.0, far_clip),
        far_clip,
    };
    let mut draws = DrawList::new();
    let draw_stats = set.draw(&view, false, Vec3::ZERO, &mut draws);
    log::info!(
        "Draw pass: {} drawn, {} culled, {} calls ({} bytes)",
        draw_stats.drawn,
        draw_stats.distance_culled + draw_stats.frustum_culled,
        draw_stats.calls,
        draws.as_bytes().len()
    );

    println!();
    println!("Requested: {}", stats.placement.requested);
    println!("Placed:    {}", stats.placement.placed);
    println!("Valid:     {}", stats.valid());
    println!("Mode:      {:?}", stats.conform.mode);

    if let Some(path) = json_path {
        let summary = json!({
            "seed": seed,
            "params": &params,
            "stats": stats,
            "draw": draw_stats,
            "collision_contacts": contacts,
            "buildings": set.valid_buildings().collect::<Vec<_>>(),
        });
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        println!("Summary:   {}", path.display());
    }

    Ok(())
}

/// Mid-rise city block used when no config is given
fn default_params(region: Aabb) -> BuildingParams {
    let mut params = BuildingParams::new(
        500,
        region,
        Vec3::new(8.0, 8.0, 10.0),
        Vec3::new(30.0, 30.0, 60.0),
    );
    params.max_delta_z = 4.0;
    params
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
