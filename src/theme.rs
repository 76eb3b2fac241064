//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours for the field, the stack and the chrome around it.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Stacked pancakes cycle through these, bottom up.
    pub pancake: [Color; 4],
    /// The oscillating block.
    pub falling: Color,
    pub plate: Color,
    /// Perfectly aligned pancakes.
    pub perfect: Color,
    /// Tolerance outline around the falling block.
    pub outline: Color,
    /// Field background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, time).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (hints).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const fn hex(rgb: u32) -> Color {
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

impl Theme {
    /// One Dark based defaults: warm yellows and oranges for the batter.
    pub fn onedark_default() -> Self {
        Self {
            pancake: [hex(0xE5C07B), hex(0xD19A66), hex(0xE0B46E), hex(0xC8924F)],
            falling: hex(0xE5C07B),
            plate: hex(0xABB2BF),
            perfect: hex(0x98C379),
            outline: hex(0xE06C75),
            bg: hex(0x31353F),
            div_line: hex(0x3F444F),
            main_fg: hex(0xABB2BF),
            title: hex(0xE5C07B),
            inactive_fg: hex(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override stack colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pancake = [hex(0xFFFF00), hex(0xFF8800), hex(0xFFFF00), hex(0xFF8800)];
                self.falling = hex(0xFFFFFF);
                self.perfect = hex(0x00FF00);
                self.outline = hex(0xFF0000);
            }
            crate::Palette::Colorblind => {
                // Blue/orange contrast; perfect never relies on green alone.
                self.pancake = [hex(0xEE7733), hex(0xCC6622), hex(0xEE7733), hex(0xCC6622)];
                self.falling = hex(0xBBBB00);
                self.perfect = hex(0x0077BB);
                self.outline = hex(0xEE3377);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        let batter = get("title").or_else(|| get("cpu_mid")).unwrap_or(d.pancake[0]);
        let crust = get("temp_mid")
            .or_else(|| get("proc_misc"))
            .unwrap_or(d.pancake[1]);
        Self {
            pancake: [batter, crust, batter, crust],
            falling: get("hi_fg").unwrap_or(d.falling),
            plate: get("main_fg").unwrap_or(d.plate),
            perfect: get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.perfect),
            outline: get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.outline),
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Colour of the stacked pancake at `level` (1 = lowest above the plate).
    #[inline]
    pub fn pancake_color(&self, level: usize) -> Color {
        self.pancake[level % self.pancake.len()]
    }
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
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#E5C07B").unwrap();
        assert!(matches!(c, Color::Rgb(0xE5, 0xC0, 0x7B)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_hex_const_matches_parser() {
        assert_eq!(hex(0x98C379), parse_hex("#98C379").unwrap());
    }

    #[test]
    fn test_theme_file_overrides_batter() {
        let map = parse_theme_file("theme[title]=\"#FF0000\"\ntheme[meter_bg]='#000000'\n");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.pancake_color(0), Color::Rgb(255, 0, 0));
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.perfect, Theme::default().perfect);
    }
}
