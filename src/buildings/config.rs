//! Text config format for building generation.
//!
//! Whitespace separated `keyword value...` pairs, `#` to end of line is a
//! comment. Material options edit a "current" material which `add_material`
//! appends to the palette. Parsing is best-effort: a bad option is logged
//! and recorded, and parsing resumes at the next token.
//!
//! ```text
//! num 500
//! pos_range -100 100 -100 100 0 0
//! size_range 4 12 4 12 6 30
//! side_tid brick.jpg
//! side_color_min 0.6 0.5 0.4 1
//! side_color_max 0.9 0.8 0.7 1
//! add_material
//! ```

use std::path::Path;

use thiserror::Error;

use crate::core::types::{Vec3, Vec4};
use crate::core::Result;
use crate::math::Aabb;

use super::material::{ColorRange, Material, TextureBinding, TextureLookup};
use super::params::BuildingParams;

/// One rejected option
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("line {line}: unrecognized buildings keyword `{keyword}`")]
    UnknownKeyword { keyword: String, line: usize },

    #[error("line {line}: missing value for `{keyword}`")]
    MissingValue { keyword: String, line: usize },

    #[error("line {line}: bad value `{value}` for `{keyword}`, expected {expected}")]
    BadValue {
        keyword: String,
        line: usize,
        value: String,
        expected: &'static str,
    },
}

/// Parsed params plus every option that was rejected on the way
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    pub params: BuildingParams,
    pub errors: Vec<ConfigError>,
}

impl ParsedConfig {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

type Tokens<'t> = Box<dyn Iterator<Item = (usize, &'t str)> + 't>;

fn tokenize<'t>(text: &'t str) -> Tokens<'t> {
    Box::new(text.lines().enumerate().flat_map(|(i, line)| {
        let line = line.split('#').next().unwrap_or("");
        line.split_whitespace().map(move |tok| (i + 1, tok))
    }))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Stateful parser; feed it one or more texts, then [`ConfigParser::finish`].
pub struct ConfigParser<'a, L: TextureLookup> {
    textures: &'a mut L,
    params: BuildingParams,
    cur_mat: Material,
    errors: Vec<ConfigError>,
}

impl<'a, L: TextureLookup> ConfigParser<'a, L> {
    pub fn new(textures: &'a mut L) -> Self {
        Self {
            textures,
            params: BuildingParams::default(),
            cur_mat: Material::DEFAULT,
            errors: Vec::new(),
        }
    }

    pub fn parse_str(&mut self, text: &str) {
        let mut tokens = tokenize(text);
        while let Some((line, keyword)) = tokens.next() {
            self.parse_option(keyword, line, &mut tokens);
        }
    }

    /// Adds the current material if the palette is still empty
    pub fn finish(mut self) -> ParsedConfig {
        if self.params.materials.is_empty() {
            self.add_cur_mat();
        }
        ParsedConfig { params: self.params, errors: self.errors }
    }

    fn add_cur_mat(&mut self) {
        self.params.materials.push(self.cur_mat);
    }

    fn record(&mut self, err: ConfigError) {
        log::warn!("Error reading buildings config option: {}", err);
        self.errors.push(err);
    }

    fn parse_option(&mut self, keyword: &str, line: usize, tokens: &mut Tokens<'_>) {
        match keyword {
            // global parameters
            "flatten_mesh" => {
                if let Some(v) = self.value(keyword, line, tokens, "0/1", parse_bool) {
                    self.params.flatten_mesh = v;
                }
            }
            "num" => {
                if let Some(v) = self.value(keyword, line, tokens, "an unsigned integer", |s| s.parse().ok()) {
                    self.params.num = v;
                }
            }
            "size_range" => {
                if let Some(c) = self.cube(keyword, line, tokens) {
                    self.params.size_range = c;
                }
            }
            "pos_range" => {
                if let Some(c) = self.cube(keyword, line, tokens) {
                    self.params.pos_range = c;
                }
            }
            "place_radius" => {
                if let Some(v) = self.float(keyword, line, tokens) {
                    self.params.place_radius = v;
                }
            }
            "max_delta_z" => {
                if let Some(v) = self.float(keyword, line, tokens) {
                    self.params.max_delta_z = v;
                }
            }
            // material textures
            "side_tscale" => {
                if let Some(v) = self.float(keyword, line, tokens) {
                    self.cur_mat.side_tex.tile_scale = v;
                }
            }
            "roof_tscale" => {
                if let Some(v) = self.float(keyword, line, tokens) {
                    self.cur_mat.roof_tex.tile_scale = v;
                }
            }
            "side_tid" | "side_nm_tid" | "roof_tid" | "roof_nm_tid" => {
                let Some(name) = self.word(keyword, line, tokens) else { return };
                let normal_map = keyword.contains("_nm_");
                let id = self.textures.texture_id(name, normal_map);
                let binding: &mut TextureBinding = if keyword.starts_with("side") {
                    &mut self.cur_mat.side_tex
                } else {
                    &mut self.cur_mat.roof_tex
                };
                if normal_map {
                    binding.normal_map = id;
                } else {
                    binding.texture = id;
                }
            }
            // material colors
            "side_color" | "side_color_min" | "side_color_max" | "side_color_grayscale_rand"
            | "roof_color" | "roof_color_min" | "roof_color_max" | "roof_color_grayscale_rand" => {
                let jitter = keyword.ends_with("grayscale_rand");
                let parsed = if jitter {
                    self.float(keyword, line, tokens).map(|v| (Vec4::ZERO, v))
                } else {
                    self.color(keyword, line, tokens).map(|c| (c, 0.0))
                };
                let Some((color, v)) = parsed else { return };
                let range: &mut ColorRange = if keyword.starts_with("side") {
                    &mut self.cur_mat.side_color
                } else {
                    &mut self.cur_mat.roof_color
                };
                if jitter {
                    range.grayscale_jitter = v;
                } else if keyword.ends_with("_min") {
                    range.min = color;
                } else if keyword.ends_with("_max") {
                    range.max = color;
                } else {
                    range.min = color;
                    range.max = color;
                }
            }
            // special commands
            "add_material" => self.add_cur_mat(),
            _ => self.record(ConfigError::UnknownKeyword {
                keyword: keyword.to_string(),
                line,
            }),
        }
    }

    fn word<'t>(&mut self, keyword: &str, line: usize, tokens: &mut Tokens<'t>) -> Option<&'t str> {
        match tokens.next() {
            Some((_, tok)) => Some(tok),
            None => {
                self.record(ConfigError::MissingValue { keyword: keyword.to_string(), line });
                None
            }
        }
    }

    fn value<T>(
        &mut self,
        keyword: &str,
        line: usize,
        tokens: &mut Tokens<'_>,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let (value_line, tok) = match tokens.next() {
            Some(t) => t,
            None => {
                self.record(ConfigError::MissingValue { keyword: keyword.to_string(), line });
                return None;
            }
        };
        let parsed = parse(tok);
        if parsed.is_none() {
            self.record(ConfigError::BadValue {
                keyword: keyword.to_string(),
                line: value_line,
                value: tok.to_string(),
                expected,
            });
        }
        parsed
    }

    fn float(&mut self, keyword: &str, line: usize, tokens: &mut Tokens<'_>) -> Option<f32> {
        self.value(keyword, line, tokens, "a number", |s| s.parse().ok())
    }

    fn floats<const N: usize>(&mut self, keyword: &str, line: usize, tokens: &mut Tokens<'_>) -> Option<[f32; N]> {
        let mut out = [0.0; N];
        for v in out.iter_mut() {
            *v = self.float(keyword, line, tokens)?;
        }
        Some(out)
    }

    /// `x1 x2 y1 y2 z1 z2`
    fn cube(&mut self, keyword: &str, line: usize, tokens: &mut Tokens<'_>) -> Option<Aabb> {
        let [x1, x2, y1, y2, z1, z2] = self.floats::<6>(keyword, line, tokens)?;
        Some(Aabb::new(Vec3::new(x1, y1, z1), Vec3::new(x2, y2, z2)))
    }

    /// `r g b a`
    fn color(&mut self, keyword: &str, line: usize, tokens: &mut Tokens<'_>) -> Option<Vec4> {
        self.floats::<4>(keyword, line, tokens).map(Vec4::from_array)
    }
}

/// Parse a config text in one go
pub fn parse_params(text: &str, textures: &mut impl TextureLookup) -> ParsedConfig {
    let mut parser = ConfigParser::new(textures);
    parser.parse_str(text);
    parser.finish()
}

/// Load params from a text config, or from a JSON dump of
/// [`BuildingParams`] when the extension is `.json`.
///
/// Only I/O and JSON failures are errors; bad text options end up in
/// [`ParsedConfig::errors`].
pub fn load_params(path: &Path, textures: &mut impl TextureLookup) -> Result<ParsedConfig> {
    let text = std::fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        let params: BuildingParams = serde_json::from_str(&text)?;
        return Ok(ParsedConfig { params, errors: Vec::new() });
    }
    let parsed = parse_params(&text, textures);
    log::info!(
        "Loaded buildings config {}: {} materials, {} errors",
        path.display(),
        parsed.params.materials.len(),
        parsed.errors.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::material::TextureRegistry;
    use tempfile::TempDir;

    const SAMPLE: &str = "
        # city block
        num 250
        flatten_mesh 1
        pos_range -100 100 -50 50 0 0
        size_range 4 12 4 12 6 30
        place_radius 80
        max_delta_z 2.5

        side_tid brick.jpg
        side_nm_tid brick_nm.jpg
        side_tscale 0.25
        side_color_min 0.5 0.4 0.3 1
        side_color_max 0.9 0.8 0.7 1
        side_color_grayscale_rand 0.1
        roof_color 0.2 0.2 0.2 1
        add_material

        roof_tid tar.png
        add_material
    ";

    #[test]
    fn test_parse_sample() {
        let mut textures = TextureRegistry::new();
        let parsed = parse_params(SAMPLE, &mut textures);
        assert!(parsed.is_clean(), "{:?}", parsed.errors);

        let p = &parsed.params;
        assert_eq!(p.num, 250);
        assert!(p.flatten_mesh);
        assert_eq!(p.pos_range, Aabb::new(Vec3::new(-100.0, -50.0, 0.0), Vec3::new(100.0, 50.0, 0.0)));
        assert_eq!(p.size_range.max, Vec3::new(12.0, 12.0, 30.0));
        assert_eq!(p.place_radius, 80.0);
        assert_eq!(p.max_delta_z, 2.5);
        assert_eq!(p.materials.len(), 2);

        let first = &p.materials[0];
        assert_eq!(first.side_tex.texture, Some(0));
        assert_eq!(first.side_tex.normal_map, Some(1));
        assert_eq!(first.side_tex.tile_scale, 0.25);
        assert_eq!(first.side_color.min, Vec4::new(0.5, 0.4, 0.3, 1.0));
        assert_eq!(first.side_color.grayscale_jitter, 0.1);
        assert_eq!(first.roof_color.min, first.roof_color.max);
        assert!(p.has_normal_map());

        // Second material inherits the edited current material
        let second = &p.materials[1];
        assert_eq!(second.side_tex, first.side_tex);
        assert_eq!(second.roof_tex.texture, Some(2));
    }

    #[test]
    fn test_default_material_added() {
        let mut textures = TextureRegistry::new();
        let parsed = parse_params("num 3", &mut textures);
        assert_eq!(parsed.params.materials, vec![Material::DEFAULT]);
    }

    #[test]
    fn test_errors_do_not_stop_parsing() {
        let mut textures = TextureRegistry::new();
        let text = "num lots\nbogus_option\nplace_radius 12\nmax_delta_z";
        let parsed = parse_params(text, &mut textures);

        assert_eq!(parsed.params.num, 0);
        assert_eq!(parsed.params.place_radius, 12.0);
        assert_eq!(parsed.errors.len(), 3);
        assert!(matches!(&parsed.errors[0], ConfigError::BadValue { line: 1, .. }));
        assert!(matches!(&parsed.errors[1], ConfigError::UnknownKeyword { keyword, line: 2 } if keyword == "bogus_option"));
        assert!(matches!(&parsed.errors[2], ConfigError::MissingValue { line: 4, .. }));
    }

    #[test]
    fn test_load_text_and_json() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut textures = TextureRegistry::new();

        let text_path = dir.path().join("buildings.txt");
        std::fs::write(&text_path, SAMPLE).expect("write failed");
        let parsed = load_params(&text_path, &mut textures).expect("load failed");
        assert_eq!(parsed.params.num, 250);

        let json_path = dir.path().join("buildings.json");
        std::fs::write(&json_path, serde_json::to_string_pretty(&parsed.params).unwrap())
            .expect("write failed");
        let reloaded = load_params(&json_path, &mut textures).expect("load failed");
        assert_eq!(reloaded.params, parsed.params);

        assert!(load_params(&dir.path().join("missing.txt"), &mut textures).is_err());
    }
}
