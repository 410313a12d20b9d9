//! テスティモニアル画像生成サービス 共通ライブラリ
//!
//! カラーテーマエンジン、SVGレイヤー描画、文面生成、HTTPハンドラーを提供

pub mod error;
pub mod color;
pub mod theme;
pub mod config;
pub mod text;
pub mod svg;
pub mod fonts;
pub mod writer;
pub mod state;
pub mod api;

// バージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

// 主要な型の再エクスポート
pub use error::{TestimonialError, Result};
pub use color::{Hsl, Rgb, parse_color, parse_color_or};
pub use theme::{
    Theme,
    ThemeEngine,
    ProceduralTheme,
    CompositionSize,
    PaletteFamily,
    PaletteTable,
    DesignPreset,
    PresetTable,
    contrast_ratio,
    derive_accent,
    ensure_readable_text,
    derive_theme,
};
pub use config::Settings;
pub use svg::{Canvas, DesignRequest, RenderedDesign, ShapePattern, ShapePlacement, render_design};
pub use fonts::{EmbeddedFont, FontStore};
pub use writer::{TestimonialWriter, StaticWriter, generate_testimonial};
pub use state::AppState;

#[cfg(feature = "http-endpoints")]
pub use writer::ChatCompletionWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "testimonial-common");
    }
}
