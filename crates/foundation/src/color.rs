use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linear RGBA color, each channel in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("unsupported color syntax: {0}")]
    Syntax(String),
    #[error("color channel out of range: {0}")]
    Channel(String),
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            a.clamp(0.0, 1.0),
        )
    }

    /// Returns a copy with alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::Syntax(s.to_string()));
        }

        let (body, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(ColorParseError::Syntax(s.to_string()));
        };
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| ColorParseError::Syntax(s.to_string()))?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(ColorParseError::Syntax(s.to_string()));
        }

        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u8>()
                .map_err(|_| ColorParseError::Channel(part.to_string()))?;
        }
        let alpha = if has_alpha {
            let a = parts[3]
                .parse::<f32>()
                .map_err(|_| ColorParseError::Channel(parts[3].to_string()))?;
            if !(0.0..=1.0).contains(&a) {
                return Err(ColorParseError::Channel(parts[3].to_string()));
            }
            a
        } else {
            1.0
        };

        Ok(Color::from_rgba8(rgb[0], rgb[1], rgb[2], alpha))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgba8(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            1.0,
        )),
        6 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 1.0)),
        8 => Some(Color::from_rgba8(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            f32::from(byte(6)?) / 255.0,
        )),
        _ => None,
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, _] = self.to_rgba8();
        write!(f, "rgba({r},{g},{b},{})", self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, ColorParseError};

    #[test]
    fn parses_css_rgba() {
        let c: Color = "rgba(0,0,255,1)".parse().unwrap();
        assert_eq!(c, Color::new(0.0, 0.0, 1.0, 1.0));
        let c: Color = "rgb(255, 0, 0)".parse().unwrap();
        assert_eq!(c, Color::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#000000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#00000000".parse::<Color>().unwrap(), Color::TRANSPARENT);
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        assert!(matches!(
            "rgba(1,2,3,1.5)".parse::<Color>(),
            Err(ColorParseError::Channel(_))
        ));
        assert!(matches!(
            "blue".parse::<Color>(),
            Err(ColorParseError::Syntax(_))
        ));
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let c = Color::new(0.2, 0.4, 0.6, 0.5).with_opacity(0.5);
        assert_eq!(c, Color::new(0.2, 0.4, 0.6, 0.25));
    }

    #[test]
    fn serde_uses_css_strings() {
        let c: Color = serde_json::from_str("\"rgba(0,255,0,1)\"").unwrap();
        assert_eq!(c, Color::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"rgba(0,255,0,1)\"");
    }
}
