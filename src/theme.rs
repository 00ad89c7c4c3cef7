//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color, mapped onto the
//! garden's block kinds.

use crate::Palette;
use flowergarden::{FlowerKind, ResourceKind};
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours for every block kind plus the UI chrome.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Seed, soil, water, sun, rock.
    pub resources: [Color; 5],
    /// One per flower, in `FlowerKind::ALL` order.
    pub flowers: [Color; 7],
    /// Garden background.
    pub bg: Color,
    /// Border and the spawn row.
    pub div_line: Color,
    pub main_fg: Color,
    pub title: Color,
    /// Hints and help text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// (theme key, fallback) per resource, in `Theme::resources` order.
const RESOURCE_KEYS: [(&str, Color); 5] = [
    ("mem_box", rgb(0x98C379)),
    ("used_end", rgb(0xBE5046)),
    ("cpu_box", rgb(0x61AFEF)),
    ("title", rgb(0xE5C07B)),
    ("inactive_fg", rgb(0x5C6370)),
];

/// (theme key, fallback) per flower, in `FlowerKind::ALL` order.
const FLOWER_KEYS: [(&str, Color); 7] = [
    ("main_fg", rgb(0xDCDFE4)),
    ("cpu_end", rgb(0xE06C75)),
    ("net_box", rgb(0xC678DD)),
    ("cpu_mid", rgb(0xD19A66)),
    ("hi_fg", rgb(0x56B6C2)),
    ("proc_box", rgb(0xA9D1F5)),
    ("temp_end", rgb(0xF0A6CA)),
];

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            resources: RESOURCE_KEYS.map(|(_, c)| c),
            flowers: FLOWER_KEYS.map(|(_, c)| c),
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => {
                let mut theme = Self::onedark_default();
                theme.apply_palette(palette);
                return Ok(theme);
            }
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        log::debug!("loaded theme from {}", path.display());
        Ok(theme)
    }

    /// Override block colours for high-contrast or colorblind play. Flowers keep their colours;
    /// the glyph already tells them apart.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.resources = [
                    rgb(0x00FF00),
                    rgb(0xFF6600),
                    rgb(0x0088FF),
                    rgb(0xFFFF00),
                    rgb(0xAAAAAA),
                ];
            }
            Palette::Colorblind => {
                // Wong-style set, no red/green pair.
                self.resources = [
                    rgb(0x009E73),
                    rgb(0xD55E00),
                    rgb(0x0072B2),
                    rgb(0xF0E442),
                    rgb(0x999999),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str, fallback: Color| {
            map.get(key)
                .and_then(|v| parse_hex(v).ok())
                .unwrap_or(fallback)
        };
        let defaults = Self::onedark_default();
        Self {
            resources: RESOURCE_KEYS.map(|(key, c)| get(key, c)),
            flowers: FLOWER_KEYS.map(|(key, c)| get(key, c)),
            bg: get("meter_bg", defaults.bg),
            div_line: get("div_line", defaults.div_line),
            main_fg: get("main_fg", defaults.main_fg),
            title: get("title", defaults.title),
            inactive_fg: get("inactive_fg", defaults.inactive_fg),
        }
    }

    pub fn color(&self, kind: ResourceKind) -> Color {
        match kind {
            ResourceKind::Seed => self.resources[0],
            ResourceKind::Soil => self.resources[1],
            ResourceKind::Water => self.resources[2],
            ResourceKind::Sun => self.resources[3],
            ResourceKind::Rock => self.resources[4],
            ResourceKind::Flower(flower) => self.flowers[flower_index(flower)],
        }
    }
}

fn flower_index(flower: FlowerKind) -> usize {
    FlowerKind::ALL
        .iter()
        .position(|&f| f == flower)
        .unwrap_or(0)
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
