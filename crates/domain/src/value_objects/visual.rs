//! Visual state value objects: tint colors, light profiles, and the
//! snapshot-able visual state of a subject's token.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a tint color
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TintParseError {
    #[error("Empty tint color")]
    Empty,
    #[error("Invalid tint color '{0}': expected #RRGGBB")]
    InvalidFormat(String),
}

/// An RGB tint applied to a token texture, stored as "#RRGGBB".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TintColor {
    r: u8,
    g: u8,
    b: u8,
}

impl TintColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a "#RRGGBB" hex string.
    pub fn parse(input: &str) -> Result<Self, TintParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TintParseError::Empty);
        }
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TintParseError::InvalidFormat(input.to_string()));
        }
        let parse_pair = |s: &str| u8::from_str_radix(s, 16);
        match (
            parse_pair(&hex[0..2]),
            parse_pair(&hex[2..4]),
            parse_pair(&hex[4..6]),
        ) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self { r, g, b }),
            _ => Err(TintParseError::InvalidFormat(input.to_string())),
        }
    }

    /// The neutral tint (no recoloring).
    pub fn white() -> Self {
        Self::new(0xff, 0xff, 0xff)
    }
}

impl fmt::Display for TintColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Light emitted by a token: dim/bright radii plus a color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightProfile {
    pub dim_radius: f32,
    pub bright_radius: f32,
    pub color: TintColor,
}

impl LightProfile {
    /// No light emitted.
    pub fn none() -> Self {
        Self {
            dim_radius: 0.0,
            bright_radius: 0.0,
            color: TintColor::white(),
        }
    }

    pub fn glow(dim_radius: f32, bright_radius: f32, color: TintColor) -> Self {
        Self {
            dim_radius,
            bright_radius,
            color,
        }
    }
}

/// The mutable visual attributes of a subject's token that timed effects
/// snapshot before applying and restore on revert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    pub tint: TintColor,
    pub light: LightProfile,
    pub elevation: i32,
}

impl VisualState {
    /// A token at ground level with no tint or light.
    pub fn neutral() -> Self {
        Self {
            tint: TintColor::white(),
            light: LightProfile::none(),
            elevation: 0,
        }
    }
}
