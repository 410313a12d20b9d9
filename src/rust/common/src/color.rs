//! 色定義と変換（RGB / HSL / HEX / CSS色名）

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TestimonialError};

/// RGB色（各チャンネル 0-255）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// HSL色
///
/// `h` は [0,360)、`s` と `l` は [0,1]。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub const fn black() -> Self {
        Rgb::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Rgb::new(255, 255, 255)
    }

    /// `0xRRGGBB` 形式の整数から生成
    pub const fn from_u32(value: u32) -> Self {
        Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// `#rrggbb` 形式（小文字）
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// チャンネルごとの補色（255 - c）
    pub fn inverted(&self) -> Self {
        Rgb::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// 相対輝度（ガンマ補正なしの sRGB 加重和）
    pub fn luminance(&self) -> f64 {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    pub fn to_hsl(&self) -> Hsl {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;

        let cmax = r.max(g).max(b);
        let cmin = r.min(g).min(b);
        let delta = cmax - cmin;

        let h = if delta == 0.0 {
            0.0
        } else if cmax == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if cmax == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let l = (cmax + cmin) / 2.0;
        let s = if delta == 0.0 {
            0.0
        } else {
            delta / (1.0 - (2.0 * l - 1.0).abs())
        };

        Hsl { h, s, l }
    }
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Hsl {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 1.0),
            l: l.clamp(0.0, 1.0),
        }
    }

    /// 明度 0.5 未満を「暗い」色とみなす
    pub fn is_dark(&self) -> bool {
        self.l < 0.5
    }

    pub fn to_rgb(&self) -> Rgb {
        let h = self.h.rem_euclid(360.0);
        let c = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = self.l - c / 2.0;

        let (r, g, b) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Rgb::new(to_channel(r + m), to_channel(g + m), to_channel(b + m))
    }
}

fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = TestimonialError;

    fn from_str(s: &str) -> Result<Self> {
        parse_color(s).ok_or_else(|| TestimonialError::InvalidColor(s.to_string()))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 色文字列を解析する
///
/// 対応形式: `#RRGGBB` / `RRGGBB` / `#RGB` / `rgb(r,g,b)` / `r,g,b` / CSS色名
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    let lower = value.to_lowercase();

    if let Some(rgb) = named_color(&lower) {
        return Some(rgb);
    }

    match lower.as_str() {
        hex if hex.starts_with('#') && hex.len() == 7 => parse_hex_color(hex),
        hex if hex.starts_with('#') && hex.len() == 4 => parse_hex_color_short(hex),
        // CSVの行は先頭の # なしで保存されている
        hex if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            parse_hex_color(&format!("#{}", hex))
        }
        rgb if rgb.starts_with("rgb(") && rgb.ends_with(')') => {
            parse_rgb_string(&rgb[4..rgb.len() - 1])
        }
        rgb if rgb.contains(',') => parse_rgb_string(rgb),
        _ => None,
    }
}

/// 色文字列を解析し、失敗時は既定色に置き換える
///
/// 呼び出し側の入力検証用。エンジン内部へエラーを伝播させない。
pub fn parse_color_or(value: &str, fallback: Rgb) -> Rgb {
    match parse_color(value) {
        Some(rgb) => rgb,
        None => {
            tracing::warn!("Invalid color '{}', using {}", value, fallback);
            fallback
        }
    }
}

/// HEX色をRGBに変換（6桁 #RRGGBB）
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    if !hex.starts_with('#') || hex.len() != 7 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
    let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
    let b = u8::from_str_radix(&hex[5..7], 16).ok()?;

    Some(Rgb::new(r, g, b))
}

/// HEX色をRGBに変換（3桁 #RGB）
pub fn parse_hex_color_short(hex: &str) -> Option<Rgb> {
    if !hex.starts_with('#') || hex.len() != 4 || !hex.is_ascii() {
        return None;
    }

    let digit = |c: char| -> Option<u8> {
        let v = c.to_digit(16)? as u8;
        Some(v * 16 + v)
    };

    let mut chars = hex.chars().skip(1);
    let r = digit(chars.next()?)?;
    let g = digit(chars.next()?)?;
    let b = digit(chars.next()?)?;

    Some(Rgb::new(r, g, b))
}

/// RGB文字列をパース（"255,0,0"形式）
fn parse_rgb_string(rgb: &str) -> Option<Rgb> {
    let parts: Vec<&str> = rgb.split(',').map(|s| s.trim()).collect();
    if parts.len() != 3 {
        return None;
    }

    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;

    Some(Rgb::new(r, g, b))
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "cyan" | "aqua" => Rgb::new(0, 255, 255),
        "magenta" | "fuchsia" => Rgb::new(255, 0, 255),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "silver" => Rgb::new(192, 192, 192),
        "orange" => Rgb::new(255, 165, 0),
        "purple" => Rgb::new(128, 0, 128),
        "pink" => Rgb::new(255, 192, 203),
        "brown" => Rgb::new(165, 42, 42),
        "navy" => Rgb::new(0, 0, 128),
        "teal" => Rgb::new(0, 128, 128),
        "gold" => Rgb::new(255, 215, 0),
        "coral" => Rgb::new(255, 127, 80),
        "ivory" => Rgb::new(255, 255, 240),
        "beige" => Rgb::new(245, 245, 220),
        "lavender" => Rgb::new(230, 230, 250),
        "crimson" => Rgb::new(220, 20, 60),
        "burlywood" => Rgb::new(222, 184, 135),
        "saddlebrown" => Rgb::new(139, 69, 19),
        "seashell" => Rgb::new(255, 245, 238),
        _ => return None,
    };
    Some(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_formats() {
        assert_eq!(parse_color("#FF4081"), Some(Rgb::new(0xFF, 0x40, 0x81)));
        assert_eq!(parse_color("ff4081"), Some(Rgb::new(0xFF, 0x40, 0x81)));
        assert_eq!(parse_color("#fff"), Some(Rgb::white()));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_color("10,20,30"), Some(Rgb::new(10, 20, 30)));
        assert_eq!(parse_color("Navy"), Some(Rgb::new(0, 0, 128)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#GGGGGG"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn test_parse_color_or_fallback() {
        assert_eq!(parse_color_or("nope", Rgb::white()), Rgb::white());
        assert_eq!(parse_color_or("#000000", Rgb::white()), Rgb::black());
    }

    #[test]
    fn test_hex_roundtrip_and_serde() {
        let c = Rgb::new(0x21, 0x96, 0xF3);
        assert_eq!(c.to_hex(), "#2196f3");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#2196f3\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(serde_json::from_str::<Rgb>("\"not-a-color\"").is_err());
    }

    #[test]
    fn test_white_hsl() {
        let hsl = Rgb::white().to_hsl();
        assert_eq!(hsl.h, 0.0);
        assert_eq!(hsl.s, 0.0);
        assert_eq!(hsl.l, 1.0);
        assert!(!hsl.is_dark());
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(Rgb::new(255, 0, 0).to_hsl().h, 0.0);
        assert!((Rgb::new(0, 255, 0).to_hsl().h - 120.0).abs() < 1e-9);
        assert!((Rgb::new(0, 0, 255).to_hsl().h - 240.0).abs() < 1e-9);
        // マゼンタ側（g < b）でも色相は正の値になる
        assert!((Rgb::new(255, 0, 128).to_hsl().h - 329.88).abs() < 0.1);
    }

    #[test]
    fn test_hsl_roundtrip_stability() {
        let mut samples = Vec::new();
        for r in (0..=255u16).step_by(17) {
            for g in (0..=255u16).step_by(51) {
                for b in (0..=255u16).step_by(15) {
                    samples.push(Rgb::new(r as u8, g as u8, b as u8));
                }
            }
        }
        samples.push(Rgb::new(1, 0, 0));
        samples.push(Rgb::new(254, 255, 255));

        for c in samples {
            let first = c.to_hsl();
            let second = first.to_rgb().to_hsl();
            let hue_diff = (first.h - second.h).abs();
            let hue_diff = hue_diff.min(360.0 - hue_diff);
            assert!(hue_diff <= 1.0, "hue drift for {}: {} vs {}", c, first.h, second.h);
            assert!((first.s - second.s).abs() <= 0.01, "saturation drift for {}", c);
            assert!((first.l - second.l).abs() <= 0.01, "lightness drift for {}", c);
        }
    }

    #[test]
    fn test_inverted() {
        assert_eq!(Rgb::new(0xEE, 0xEE, 0xEE).inverted(), Rgb::new(0x11, 0x11, 0x11));
        assert_eq!(Rgb::white().inverted(), Rgb::black());
    }
}
