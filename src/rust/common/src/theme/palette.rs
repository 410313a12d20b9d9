//! パレットファミリー定義（起動時に一度だけ読み込む読み取り専用テーブル）

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::color::Rgb;
use crate::config::load_structured;
use crate::error::{Result, TestimonialError};

/// 構図サイズラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionSize {
    Large,
    Medium,
    Small,
    Minimal,
}

impl CompositionSize {
    pub const ALL: [CompositionSize; 4] = [
        CompositionSize::Large,
        CompositionSize::Medium,
        CompositionSize::Small,
        CompositionSize::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionSize::Large => "large",
            CompositionSize::Medium => "medium",
            CompositionSize::Small => "small",
            CompositionSize::Minimal => "minimal",
        }
    }

    /// 図形サイズ表の参照キー（minimal は small と同じサイズを使う）
    pub fn size_key(&self) -> CompositionSize {
        match self {
            CompositionSize::Minimal => CompositionSize::Small,
            other => *other,
        }
    }
}

impl FromStr for CompositionSize {
    type Err = TestimonialError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "large" => Ok(CompositionSize::Large),
            "medium" => Ok(CompositionSize::Medium),
            "small" => Ok(CompositionSize::Small),
            "minimal" => Ok(CompositionSize::Minimal),
            _ => Err(TestimonialError::InvalidArgument(format!(
                "Unknown composition label: {}",
                s
            ))),
        }
    }
}

/// 図形2つの相対サイズ（キャンバス短辺に対する比率）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizePair {
    pub shape1: f64,
    pub shape2: f64,
}

impl SizePair {
    pub const fn new(shape1: f64, shape2: f64) -> Self {
        SizePair { shape1, shape2 }
    }

    pub fn total(&self) -> f64 {
        self.shape1 + self.shape2
    }
}

/// 構図ごとの図形サイズ表（minimal は small を共有するため持たない）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<SizePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<SizePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<SizePair>,
}

/// 構図ごとの余白表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal: Option<u32>,
}

/// パレットファミリー
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteFamily {
    pub backgrounds: Vec<Rgb>,
    pub texts: Vec<Rgb>,
    pub accents: Vec<Rgb>,
    pub shapes: Vec<Rgb>,
    #[serde(default)]
    pub sizes: SizeTable,
    #[serde(default)]
    pub margins: MarginTable,
}

impl PaletteFamily {
    pub fn size_pair(&self, composition: CompositionSize) -> Option<SizePair> {
        match composition.size_key() {
            CompositionSize::Large => self.sizes.large,
            CompositionSize::Medium => self.sizes.medium,
            _ => self.sizes.small,
        }
    }

    pub fn margin(&self, composition: CompositionSize) -> Option<u32> {
        match composition {
            CompositionSize::Large => self.margins.large,
            CompositionSize::Medium => self.margins.medium,
            CompositionSize::Small => self.margins.small,
            CompositionSize::Minimal => self.margins.minimal,
        }
    }
}

/// パレットファミリーのテーブル
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaletteTable {
    #[serde(default)]
    pub families: BTreeMap<String, PaletteFamily>,
}

impl PaletteTable {
    /// ファイルから読み込む（JSON / TOML / YAML）
    pub fn from_file(path: &str) -> Result<Self> {
        let table: PaletteTable = load_structured(path)?;
        tracing::info!("Loaded {} palette families from {}", table.families.len(), path);
        Ok(table)
    }

    /// 指定があればファイルから、なければ組み込みテーブルを使う
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PaletteFamily> {
        self.families.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.families.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// 組み込みのパレットテーブル
    pub fn builtin() -> Self {
        let mut families = BTreeMap::new();

        families.insert(
            "warm".to_string(),
            family(
                &[0xFFF5E6, 0xFFF8F0, 0xFDF2E9, 0xFFEFD5],
                &[0x5D2E0C, 0x8B4513, 0x4A2511, 0xCC4A1B],
                &[0xFF7F50, 0xFF8C42, 0xE65100, 0xFF6B6B],
                &[0xFFB347, 0xFFA07A, 0xF4A460, 0xFFDAB9],
                [SizePair::new(0.28, 0.25), SizePair::new(0.22, 0.18), SizePair::new(0.16, 0.14)],
                [40, 48, 56, 64],
            ),
        );
        families.insert(
            "cool".to_string(),
            family(
                &[0xF5F7FA, 0xE8F4F9, 0xE3F2FD, 0xF0F8FF],
                &[0x1B4965, 0x2C3E50, 0x0D47A1, 0x1565C0],
                &[0x3498DB, 0x42C6FF, 0x00BCD4, 0x4D94FF],
                &[0xB6E1FF, 0x7AB8FF, 0x90CAF9, 0xB3E5FC],
                [SizePair::new(0.27, 0.24), SizePair::new(0.21, 0.18), SizePair::new(0.15, 0.13)],
                [40, 48, 56, 64],
            ),
        );
        families.insert(
            "nature".to_string(),
            family(
                &[0xF5F7F0, 0xE8F5E9, 0xF1F8E9, 0xFAFAF0],
                &[0x2E5902, 0x2E7D32, 0x1B5E20, 0x33691E],
                &[0x4CAF50, 0x8BC34A, 0xFFA000, 0x689F38],
                &[0xC5E1A5, 0xA5D6A7, 0xDCEDC8, 0x81C784],
                [SizePair::new(0.30, 0.24), SizePair::new(0.23, 0.19), SizePair::new(0.17, 0.14)],
                [36, 44, 52, 60],
            ),
        );
        families.insert(
            "elegant".to_string(),
            family(
                &[0x1A1A1A, 0x1E1E1E, 0x2C2C2C, 0x121212],
                &[0xFFFFFF, 0xFAFAFA, 0xF5F5F5, 0xE0E0E0],
                &[0xFFD700, 0xD4AF37, 0xC9A227, 0xB8860B],
                &[0x3A3A3A, 0x4A4A4A, 0x8C7853, 0x5C5C5C],
                [SizePair::new(0.26, 0.22), SizePair::new(0.20, 0.17), SizePair::new(0.14, 0.12)],
                [48, 56, 64, 72],
            ),
        );

        PaletteTable { families }
    }
}

/// sizes は large / medium / small、margins は large / medium / small / minimal の順
fn family(
    backgrounds: &[u32],
    texts: &[u32],
    accents: &[u32],
    shapes: &[u32],
    sizes: [SizePair; 3],
    margins: [u32; 4],
) -> PaletteFamily {
    let colors = |values: &[u32]| values.iter().map(|v| Rgb::from_u32(*v)).collect::<Vec<_>>();

    let [large, medium, small] = sizes;
    let [m_large, m_medium, m_small, m_minimal] = margins;

    PaletteFamily {
        backgrounds: colors(backgrounds),
        texts: colors(texts),
        accents: colors(accents),
        shapes: colors(shapes),
        sizes: SizeTable {
            large: Some(large),
            medium: Some(medium),
            small: Some(small),
        },
        margins: MarginTable {
            large: Some(m_large),
            medium: Some(m_medium),
            small: Some(m_small),
            minimal: Some(m_minimal),
        },
    }
}
