//! カラーテーマエンジン
//!
//! 背景色と文字色の組、またはパレットファミリーから読みやすいテーマを作る。
//! すべての操作は入力（と注入された乱数源）だけに依存する純粋な計算。

pub mod palette;
pub mod presets;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::color::{Hsl, Rgb};
use crate::error::{Result, TestimonialError};

pub use palette::{CompositionSize, PaletteFamily, PaletteTable, SizePair};
pub use presets::{DesignPreset, PresetTable};

/// 読みやすさの基準となるコントラスト比
pub const MIN_CONTRAST: f64 = 4.5;

const MARGIN_MIN: u32 = 32;
const MARGIN_MAX: u32 = 72;
const MARGIN_STEP: u32 = 8;

/// 生成されたテーマ（生成後は変更しない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub background: Rgb,
    pub text: Rgb,
    pub accent: Rgb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_accent: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_colors: Option<[Rgb; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape1_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape2_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<u32>,
}

impl Theme {
    /// 3色だけのテーマ
    pub fn basic(background: Rgb, text: Rgb, accent: Rgb) -> Self {
        Theme {
            background,
            text,
            accent,
            secondary_accent: None,
            shape_colors: None,
            shape1_size: None,
            shape2_size: None,
            margin: None,
        }
    }

    /// 手続き生成が失敗したときの固定テーマ
    pub fn fallback() -> Self {
        Theme {
            background: Rgb::from_u32(0xFFFFFF),
            text: Rgb::from_u32(0x000000),
            accent: Rgb::from_u32(0x2196F3),
            secondary_accent: Some(Rgb::from_u32(0x1976D2)),
            shape_colors: None,
            shape1_size: Some(0.25),
            shape2_size: Some(0.22),
            margin: Some(40),
        }
    }

    pub fn size_pair(&self) -> Option<SizePair> {
        Some(SizePair::new(self.shape1_size?, self.shape2_size?))
    }
}

/// 手続き生成の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProceduralTheme {
    pub theme: Theme,
    /// ログやプロンプト用のファミリー名（失敗時は "default"）
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<CompositionSize>,
}

impl ProceduralTheme {
    pub fn fallback() -> Self {
        ProceduralTheme {
            theme: Theme::fallback(),
            family: "default".to_string(),
            composition: None,
        }
    }
}

/// WCAG形式のコントラスト比（ガンマ補正なしの輝度を使う）
///
/// 引数の順序に依存せず、常に 1.0 以上。
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.luminance();
    let lb = b.luminance();
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// 背景の補色相からアクセント色を作る
///
/// コントラストが足りなければ明度を一度だけ 0.7（暗い背景）/ 0.3（明るい背景）に
/// 置き換える。それでも足りない場合もそのまま返す。
pub fn derive_accent(background: Rgb, _text: Rgb) -> Rgb {
    let bg = background.to_hsl();

    let hue = (bg.h + 180.0) % 360.0;
    let saturation = (bg.s + 0.3).min(1.0);

    let accent = Hsl::new(hue, saturation, 0.5).to_rgb();
    if contrast_ratio(accent, background) >= MIN_CONTRAST {
        return accent;
    }

    let lightness = if bg.is_dark() { 0.7 } else { 0.3 };
    let adjusted = Hsl::new(hue, saturation, lightness).to_rgb();
    debug!(
        "Accent {} below contrast threshold against {}, adjusted to {}",
        accent, background, adjusted
    );
    adjusted
}

/// 文字色のコントラストが足りなければ背景の補色（255 - c）に置き換える
///
/// `derive_accent` の色相回転とは別の戦略のまま残している。
pub fn ensure_readable_text(background: Rgb, text: Rgb) -> Rgb {
    if contrast_ratio(text, background) < MIN_CONTRAST {
        background.inverted()
    } else {
        text
    }
}

/// 明示的な背景色・文字色の組から完全なテーマを作る
pub fn derive_theme(background: Rgb, text: Rgb) -> Theme {
    let accent = derive_accent(background, text);
    let text = ensure_readable_text(background, text);
    Theme::basic(background, text, accent)
}

/// 図形サイズの合計に応じて余白を調整し、[32, 72] に収める
pub fn adjust_margin(margin: u32, sizes: SizePair) -> u32 {
    let total = sizes.total();
    let adjusted = if total > 0.45 {
        margin.saturating_sub(MARGIN_STEP).max(MARGIN_MIN)
    } else if total < 0.35 {
        (margin + MARGIN_STEP).min(MARGIN_MAX)
    } else {
        margin
    };
    adjusted.clamp(MARGIN_MIN, MARGIN_MAX)
}

/// テーマ生成エンジン
///
/// パレットテーブルは起動時に読み込んだ読み取り専用データを共有する。
#[derive(Debug, Clone)]
pub struct ThemeEngine {
    palettes: Arc<PaletteTable>,
}

impl Default for ThemeEngine {
    fn default() -> Self {
        ThemeEngine::new(Arc::new(PaletteTable::builtin()))
    }
}

impl ThemeEngine {
    pub fn new(palettes: Arc<PaletteTable>) -> Self {
        ThemeEngine { palettes }
    }

    pub fn palettes(&self) -> &PaletteTable {
        &self.palettes
    }

    /// パレットファミリーからテーマを手続き生成する
    ///
    /// 明示的に指定されたファミリー名・構図ラベルが未知なら `InvalidArgument`。
    /// それ以外の内部的な失敗は固定テーマ（"default"）に置き換える。
    pub fn generate_procedural_theme<R: Rng + ?Sized>(
        &self,
        family: Option<&str>,
        composition: Option<&str>,
        rng: &mut R,
    ) -> Result<ProceduralTheme> {
        let composition = composition
            .map(|label| label.parse::<CompositionSize>())
            .transpose()?;

        if let Some(name) = family {
            if !self.palettes.contains(name) {
                return Err(TestimonialError::InvalidArgument(format!(
                    "Unknown palette family: {}",
                    name
                )));
            }
        }

        match self.assemble(family, composition, rng) {
            Ok(generated) => {
                debug!(
                    "Generated procedural theme from '{}' ({:?})",
                    generated.family, generated.composition
                );
                Ok(generated)
            }
            Err(reason) => {
                warn!("Procedural theme generation failed ({}), using default theme", reason);
                Ok(ProceduralTheme::fallback())
            }
        }
    }

    fn assemble<R: Rng + ?Sized>(
        &self,
        family: Option<&str>,
        composition: Option<CompositionSize>,
        rng: &mut R,
    ) -> std::result::Result<ProceduralTheme, String> {
        let name = match family {
            Some(name) => name.to_string(),
            None => self
                .palettes
                .names()
                .choose(rng)
                .map(|name| name.to_string())
                .ok_or("palette table is empty")?,
        };
        let palette = self
            .palettes
            .get(&name)
            .ok_or_else(|| format!("palette family '{}' disappeared", name))?;

        let composition = match composition {
            Some(composition) => composition,
            None => *CompositionSize::ALL
                .choose(rng)
                .ok_or("no composition labels")?,
        };

        let pick = |candidates: &[Rgb], what: &str, rng: &mut R| {
            candidates
                .choose(rng)
                .copied()
                .ok_or_else(|| format!("family '{}' has no {} colors", name, what))
        };

        let background = pick(&palette.backgrounds, "background", &mut *rng)?;
        let text = pick(&palette.texts, "text", &mut *rng)?;
        let accent = pick(&palette.accents, "accent", &mut *rng)?;
        let secondary_accent = pick(&palette.accents, "accent", &mut *rng)?;
        let shape1 = pick(&palette.shapes, "shape", &mut *rng)?;
        let shape2 = pick(&palette.shapes, "shape", &mut *rng)?;

        let sizes = palette
            .size_pair(composition)
            .ok_or_else(|| format!("family '{}' has no sizes for {}", name, composition.as_str()))?;
        let margin = palette
            .margin(composition)
            .ok_or_else(|| format!("family '{}' has no margin for {}", name, composition.as_str()))?;

        Ok(ProceduralTheme {
            theme: Theme {
                background,
                text,
                accent,
                secondary_accent: Some(secondary_accent),
                shape_colors: Some([shape1, shape2]),
                shape1_size: Some(sizes.shape1),
                shape2_size: Some(sizes.shape2),
                margin: Some(adjust_margin(margin, sizes)),
            },
            family: name,
            composition: Some(composition),
        })
    }

    /// デザイン設定テーブルからランダムに1行選び、アクセントと文字色を整える
    pub fn theme_from_presets<R: Rng + ?Sized>(&self, presets: &PresetTable, rng: &mut R) -> Theme {
        match presets.presets.choose(rng) {
            Some(preset) => derive_theme(preset.bg, preset.text),
            None => {
                warn!("No design presets available, using default color theme");
                Theme::basic(Rgb::white(), Rgb::black(), Rgb::from_u32(0x2196F3))
            }
        }
    }
}
