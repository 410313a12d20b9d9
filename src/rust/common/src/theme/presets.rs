//! デザインプリセット（背景・文字・アクセントの3色の組）とカラースキーム一覧

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::config::load_structured;
use crate::error::Result;

/// デザイン設定テーブルの1行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignPreset {
    #[serde(alias = "bgco")]
    pub bg: Rgb,
    #[serde(alias = "textco")]
    pub text: Rgb,
    pub accent: Rgb,
}

impl DesignPreset {
    pub const fn new(bg: u32, text: u32, accent: u32) -> Self {
        DesignPreset {
            bg: Rgb::from_u32(bg),
            text: Rgb::from_u32(text),
            accent: Rgb::from_u32(accent),
        }
    }

    /// 設定テーブルが空のときのデザイン
    pub const fn fallback() -> Self {
        DesignPreset::new(0xFFFFFF, 0x000000, 0xFF4081)
    }
}

/// デザイン設定テーブル
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetTable {
    #[serde(default)]
    pub presets: Vec<DesignPreset>,
}

impl PresetTable {
    /// ファイルから読み込む（JSON / TOML / YAML）
    pub fn from_file(path: &str) -> Result<Self> {
        let table: PresetTable = load_structured(path)?;
        tracing::info!("Loaded {} design presets from {}", table.presets.len(), path);
        Ok(table)
    }

    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// 組み込みのプリセット（Light / Dark / Colorful パレットと同じ12組）
    pub fn builtin() -> Self {
        let presets = palette_groups()
            .into_iter()
            .flat_map(|group| group.schemes)
            .collect();
        PresetTable { presets }
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// ランダムに1行を選ぶ。空なら既定のデザイン
    pub fn random_design<R: Rng + ?Sized>(&self, rng: &mut R) -> DesignPreset {
        match self.presets.choose(rng) {
            Some(preset) => *preset,
            None => {
                tracing::warn!("No design configurations available, using default");
                DesignPreset::fallback()
            }
        }
    }
}

/// 名前付きカラースキーム
#[derive(Debug, Clone, Serialize)]
pub struct NamedScheme {
    pub name: &'static str,
    #[serde(flatten)]
    pub colors: DesignPreset,
}

/// パレットグループ（Light / Dark / Colorful）
#[derive(Debug, Clone, Serialize)]
pub struct PaletteGroup {
    pub name: &'static str,
    pub schemes: Vec<DesignPreset>,
}

/// カラーホイールのカテゴリ
#[derive(Debug, Clone, Serialize)]
pub struct WheelCategory {
    pub name: &'static str,
    pub colors: Vec<Rgb>,
}

pub fn preset_schemes() -> Vec<NamedScheme> {
    let scheme = |name, bg, text, accent| NamedScheme {
        name,
        colors: DesignPreset::new(bg, text, accent),
    };

    vec![
        scheme("Professional (Blue/White)", 0xFFFFFF, 0x333333, 0x2196F3),
        scheme("Creative (Purple/Light)", 0xF8F5FF, 0x4A154B, 0x9C27B0),
        scheme("Nature (Green/Cream)", 0xF5F7F0, 0x2E5902, 0x4CAF50),
        scheme("Modern (Gray/White)", 0xFFFFFF, 0x424242, 0x9E9E9E),
        scheme("Elegant (Gold/Dark)", 0x1A1A1A, 0xFFFFFF, 0xFFD700),
        scheme("Tech (Cyan/Dark)", 0x1E1E1E, 0xFFFFFF, 0x00BCD4),
        scheme("Warm (Orange/Light)", 0xFFF5E6, 0xCC4A1B, 0xFF9800),
        scheme("Cool (Blue/Gray)", 0xF5F7FA, 0x2C3E50, 0x3498DB),
    ]
}

pub fn palette_groups() -> Vec<PaletteGroup> {
    vec![
        PaletteGroup {
            name: "Light",
            schemes: vec![
                DesignPreset::new(0xFFFFFF, 0x000000, 0xFF4081),
                DesignPreset::new(0xF5F5F5, 0x333333, 0x2196F3),
                DesignPreset::new(0xE8F4F9, 0x1B4965, 0xFFC107),
                DesignPreset::new(0xFFF5E6, 0x8B4513, 0x4CAF50),
            ],
        },
        PaletteGroup {
            name: "Dark",
            schemes: vec![
                DesignPreset::new(0x1A1A1A, 0xFFFFFF, 0xFF6B6B),
                DesignPreset::new(0x2C3E50, 0xECF0F1, 0x3498DB),
                DesignPreset::new(0x2D2D2D, 0xE0E0E0, 0x00BFA5),
                DesignPreset::new(0x1E1E1E, 0xFAFAFA, 0xFFD700),
            ],
        },
        PaletteGroup {
            name: "Colorful",
            schemes: vec![
                DesignPreset::new(0xFFE5E5, 0xFF0000, 0x4A90E2),
                DesignPreset::new(0xE8F5E9, 0x2E7D32, 0xFFA000),
                DesignPreset::new(0xE3F2FD, 0x1565C0, 0xFF4081),
                DesignPreset::new(0xFFF3E0, 0xE65100, 0x9C27B0),
            ],
        },
    ]
}

pub fn color_wheel() -> Vec<WheelCategory> {
    let category = |name, values: [u32; 8]| WheelCategory {
        name,
        colors: values.iter().map(|v| Rgb::from_u32(*v)).collect(),
    };

    vec![
        category("Basic", [0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, 0xFFFFFF, 0x000000]),
        category("Warm", [0xFF4D4D, 0xFF8C42, 0xFFDC5E, 0xFFA07A, 0xFFB6C1, 0xFF69B4, 0xFF7F50, 0xFF6B6B]),
        category("Cool", [0x4D94FF, 0x42C6FF, 0x5EFFF7, 0x7AB8FF, 0xB6E1FF, 0x69B4FF, 0x50C8FF, 0x6B9FFF]),
        category("Neutral", [0xF5F5F5, 0xE0E0E0, 0xBDBDBD, 0x9E9E9E, 0x757575, 0x616161, 0x424242, 0x212121]),
        category("Pastel", [0xFFB3BA, 0xBAFFC9, 0xBAE1FF, 0xFFFFBA, 0xFFDFBA, 0xE0BBE4, 0x957DAD, 0xD4A5A5]),
    ]
}
