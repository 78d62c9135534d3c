//! Pass colors, written as CSS-style `rgb(r, g, b)` triples.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PassError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED: &[(&str, PassColor)] = &[
    ("black", PassColor::rgb(0, 0, 0)),
    ("white", PassColor::rgb(255, 255, 255)),
    ("red", PassColor::rgb(255, 0, 0)),
    ("green", PassColor::rgb(0, 128, 0)),
    ("blue", PassColor::rgb(0, 0, 255)),
    ("gray", PassColor::rgb(128, 128, 128)),
    ("grey", PassColor::rgb(128, 128, 128)),
    ("silver", PassColor::rgb(192, 192, 192)),
    ("orange", PassColor::rgb(255, 165, 0)),
    ("yellow", PassColor::rgb(255, 255, 0)),
    ("purple", PassColor::rgb(128, 0, 128)),
    ("navy", PassColor::rgb(0, 0, 128)),
];

impl PassColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

fn invalid(input: &str) -> PassError {
    PassError::type_error(format!("Invalid color value {input:?}"))
}

fn parse_hex(input: &str, hex: &str) -> Result<PassColor> {
    let expand = |c: char| -> Result<u8> {
        let v = c.to_digit(16).ok_or_else(|| invalid(input))? as u8;
        Ok(v * 16 + v)
    };
    let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid(input));
    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        3 => Ok(PassColor::rgb(expand(chars[0])?, expand(chars[1])?, expand(chars[2])?)),
        6 if hex.is_ascii() => Ok(PassColor::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
        _ => Err(invalid(input)),
    }
}

impl FromStr for PassColor {
    type Err = PassError;

    fn from_str(input: &str) -> Result<Self> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(input, hex);
        }
        if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
            let parts = body
                .split(',')
                .map(|p| p.trim().parse::<u8>().map_err(|_| invalid(input)))
                .collect::<Result<Vec<u8>>>()?;
            return match parts.as_slice() {
                [r, g, b] => Ok(PassColor::rgb(*r, *g, *b)),
                _ => Err(invalid(input)),
            };
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, c)| *c)
            .ok_or_else(|| invalid(input))
    }
}

impl fmt::Display for PassColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for PassColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PassColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
