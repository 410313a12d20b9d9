//! 共通APIモデル定義

use serde::{Deserialize, Serialize};

use crate::color::{parse_color_or, Rgb};
use crate::svg::{ShapePattern, ShapePlacement};
use crate::theme::presets::{NamedScheme, PaletteGroup, WheelCategory};
use crate::theme::DesignPreset;

/// フォントサイズの許容範囲
pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 144;

/// リクエストの色指定（文字列のまま受け取り、解釈できなければ既定色にする）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ColorInput {
    #[serde(default, alias = "bgco")]
    pub bg: Option<String>,
    #[serde(default, alias = "textco")]
    pub text: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
}

impl ColorInput {
    /// 背景は白、文字とアクセントは黒を既定値にして解釈する
    pub fn resolve(&self) -> DesignPreset {
        let resolve = |value: &Option<String>, fallback: Rgb| match value {
            Some(value) => parse_color_or(value, fallback),
            None => fallback,
        };

        DesignPreset {
            bg: resolve(&self.bg, Rgb::white()),
            text: resolve(&self.text, Rgb::black()),
            accent: resolve(&self.accent, Rgb::black()),
        }
    }
}

/// 手続き生成テーマの指定（クエリパラメータとしても使う）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProceduralQuery {
    pub family: Option<String>,
    pub composition: Option<String>,
}

impl ProceduralQuery {
    /// 空欄は未指定として扱う
    pub fn family(&self) -> Option<&str> {
        non_blank(&self.family)
    }

    pub fn composition(&self) -> Option<&str> {
        non_blank(&self.composition)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn default_has_quotes() -> bool {
    true
}

/// 描画オプション（/generate-testimonial と /update-design で共通）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DesignOptions {
    #[serde(default)]
    pub colors: ColorInput,

    /// 装飾パターン（未知の名前は400）
    #[serde(default)]
    pub shapes: Vec<ShapePattern>,

    #[serde(default)]
    pub placement: ShapePlacement,

    pub font_size: Option<u32>,

    #[serde(default = "default_has_quotes")]
    pub has_quotes: bool,

    /// アップロード済みフォントのファイル名
    pub font: Option<String>,

    /// 指定された場合は colors の代わりに手続き生成テーマを使う
    pub procedural: Option<ProceduralQuery>,
}

impl Default for DesignOptions {
    fn default() -> Self {
        DesignOptions {
            colors: ColorInput::default(),
            shapes: Vec::new(),
            placement: ShapePlacement::default(),
            font_size: None,
            has_quotes: default_has_quotes(),
            font: None,
            procedural: None,
        }
    }
}

/// フォントサイズを [12, 144] に収める
pub fn clamp_font_size(requested: Option<u32>, default: u32) -> u32 {
    requested
        .unwrap_or(default)
        .clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// POST /generate-testimonial
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateTestimonialRequest {
    pub topic: String,
    #[serde(flatten)]
    pub design: DesignOptions,
}

/// POST /update-design
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateDesignRequest {
    pub text: String,
    #[serde(flatten)]
    pub design: DesignOptions,
}

/// 描画結果のレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct SvgResponse {
    pub request_id: String,
    pub background_svg: String,
    pub shapes_svg: String,
    pub text_svg: String,
    pub combined_svg: String,
    pub text_content: String,
    pub colors: DesignPreset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<String>,
}

/// GET /color-schemes
#[derive(Debug, Serialize)]
pub struct ColorSchemesResponse {
    pub presets: Vec<NamedScheme>,
    pub color_wheel: Vec<WheelCategory>,
    pub palette_groups: Vec<PaletteGroup>,
}

/// GET /shape-patterns の1要素
#[derive(Debug, Serialize, Deserialize)]
pub struct ShapePatternInfo {
    pub name: String,
    pub description: String,
    pub preview_svg: String,
}

/// POST /derive-accent
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeriveAccentRequest {
    pub bg: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeriveAccentResponse {
    pub background: Rgb,
    pub text: Rgb,
    pub accent: Rgb,
    /// コントラスト不足なら背景の補色
    pub readable_text: Rgb,
    pub text_contrast: f64,
    pub accent_contrast: f64,
}

/// GET /health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub palette_families: usize,
    pub design_presets: usize,
    pub writer: String,
}

/// APIレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// APIエラー
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&crate::error::TestimonialError> for ApiError {
    fn from(err: &crate::error::TestimonialError) -> Self {
        ApiError {
            code: err.error_code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}
