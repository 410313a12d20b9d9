//! SVGレイヤー描画
//!
//! 背景・図形・テキストの3レイヤーを個別のSVG文書として描き、最後に1つにまとめる。
//! 描画に必要な値はすべて `DesignRequest` で受け取り、共有状態は持たない。

pub mod document;
pub mod shapes;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

pub use document::{Paint, SvgDocument};
pub use shapes::{draw_composition, ShapePattern, ShapePlacement};

use crate::color::Rgb;
use crate::config::CanvasConfig;
use crate::fonts::EmbeddedFont;
use crate::text::{estimate_width, wrap_text, DEFAULT_PADDING, LINE_HEIGHT_RATIO};
use crate::theme::Theme;

/// キャンバスサイズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub const fn new(width: u32, height: u32) -> Self {
        Canvas { width, height }
    }

    pub fn size_f64(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }

    pub fn center(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    pub fn shorter_side(&self) -> f64 {
        f64::from(self.width.min(self.height))
    }
}

impl From<&CanvasConfig> for Canvas {
    fn from(config: &CanvasConfig) -> Self {
        Canvas::new(config.width, config.height)
    }
}

/// テキストレイヤーの描画パラメータ
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub color: Rgb,
    pub font_size: u32,
    pub font_family: String,
    pub has_quotes: bool,
    pub embedded_font: Option<EmbeddedFont>,
}

/// 1回の描画要求（描画中に変更されない）
#[derive(Debug, Clone)]
pub struct DesignRequest {
    pub canvas: Canvas,
    pub theme: Theme,
    pub text: String,
    pub patterns: Vec<ShapePattern>,
    pub placement: Option<ShapePlacement>,
    pub text_style: TextStyle,
}

/// 描画結果
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDesign {
    pub background_svg: String,
    pub shapes_svg: String,
    pub text_svg: String,
    pub combined_svg: String,
}

fn background_document(canvas: Canvas, color: Rgb) -> SvgDocument {
    let (width, height) = canvas.size_f64();
    let mut doc = SvgDocument::new(canvas.width, canvas.height);
    doc.rect(0.0, 0.0, width, height, Paint::fill(color));
    doc
}

/// 背景レイヤー
pub fn render_background(canvas: Canvas, color: Rgb) -> String {
    background_document(canvas, color).finish()
}

/// 装飾パターンレイヤー（指定順に重ねる）
pub fn render_shapes<R: Rng + ?Sized>(
    canvas: Canvas,
    color: Rgb,
    patterns: &[ShapePattern],
    rng: &mut R,
) -> String {
    let mut doc = SvgDocument::new(canvas.width, canvas.height);
    for pattern in patterns {
        pattern.draw(&mut doc, canvas, color, rng);
    }
    doc.finish()
}

/// 構図図形レイヤー
pub fn render_composition(canvas: Canvas, theme: &Theme, placement: ShapePlacement) -> String {
    let mut doc = SvgDocument::new(canvas.width, canvas.height);
    draw_composition(&mut doc, canvas, theme, placement);
    doc.finish()
}

/// テキストレイヤー
///
/// 折り返した行を縦横中央に配置する。行の高さはフォントサイズの1.2倍。
pub fn render_text(canvas: Canvas, text: &str, style: &TextStyle) -> String {
    text_document(canvas, text, style).finish()
}

fn text_document(canvas: Canvas, text: &str, style: &TextStyle) -> SvgDocument {
    let mut doc = SvgDocument::new(canvas.width, canvas.height);

    let font_family = match &style.embedded_font {
        Some(font) => {
            doc.style(&font.font_face_css());
            font.family.as_str()
        }
        None => style.font_family.as_str(),
    };

    let text = if style.has_quotes {
        format!("\"{}\"", text)
    } else {
        text.to_string()
    };

    let font_size = f64::from(style.font_size);
    let line_height = font_size * LINE_HEIGHT_RATIO;
    let (width, height) = canvas.size_f64();

    let lines = wrap_text(&text, style.font_size, canvas.width, DEFAULT_PADDING);
    let total_height = lines.len() as f64 * line_height;
    let mut y = (height - total_height) / 2.0;

    for line in &lines {
        let x = (width - estimate_width(line, style.font_size)) / 2.0;
        doc.text(x, y + font_size, line, style.color, style.font_size, font_family);
        y += line_height;
    }

    doc
}

/// 全レイヤーを描画して合成する
pub fn render_design<R: Rng + ?Sized>(request: &DesignRequest, rng: &mut R) -> RenderedDesign {
    let canvas = request.canvas;
    let theme = &request.theme;

    let background = background_document(canvas, theme.background);

    let mut shapes = SvgDocument::new(canvas.width, canvas.height);
    if let Some(placement) = request.placement {
        draw_composition(&mut shapes, canvas, theme, placement);
    }
    for pattern in &request.patterns {
        pattern.draw(&mut shapes, canvas, theme.accent, rng);
    }
    let text = text_document(canvas, &request.text, &request.text_style);

    let combined_svg = SvgDocument::compose(canvas.width, canvas.height, &[&background, &shapes, &text]);
    let background_svg = background.finish();
    let shapes_svg = shapes.finish();
    let text_svg = text.finish();

    debug!(
        "Rendered design {}x{} with {} patterns ({} bytes)",
        canvas.width,
        canvas.height,
        request.patterns.len(),
        combined_svg.len()
    );

    RenderedDesign {
        background_svg,
        shapes_svg,
        text_svg,
        combined_svg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CANVAS: Canvas = Canvas::new(1400, 900);

    fn style() -> TextStyle {
        TextStyle {
            color: Rgb::black(),
            font_size: 48,
            font_family: "Poppins-Medium".to_string(),
            has_quotes: false,
            embedded_font: None,
        }
    }

    fn request() -> DesignRequest {
        DesignRequest {
            canvas: CANVAS,
            theme: Theme::basic(Rgb::white(), Rgb::black(), Rgb::from_u32(0x2196F3)),
            text: "Great service & fast delivery".to_string(),
            patterns: vec![ShapePattern::Circles, ShapePattern::Corners],
            placement: None,
            text_style: style(),
        }
    }

    #[test]
    fn test_render_background() {
        let svg = render_background(CANVAS, Rgb::from_u32(0x1A1A1A));
        assert!(svg.contains(r##"<rect x="0" y="0" width="1400" height="900" fill="#1a1a1a"/>"##));
    }

    #[test]
    fn test_render_text_single_line_is_centered() {
        let svg = render_text(CANVAS, "Hello", &style());
        // 5文字 * 48 * 0.6 = 144 → x = (1400 - 144) / 2 = 628
        // 1行 * 57.6 → y = (900 - 57.6) / 2 + 48 = 469.2
        assert!(svg.contains(r#"<text x="628" y="469.2""#));
        assert!(svg.contains(r#"font-family="Poppins-Medium""#));
    }

    #[test]
    fn test_render_text_with_quotes() {
        let mut style = style();
        style.has_quotes = true;
        let svg = render_text(CANVAS, "Hello", &style);
        assert!(svg.contains(r#">"Hello"</text>"#));
    }

    #[test]
    fn test_render_text_wraps_lines() {
        let text = "This product exceeded all my expectations and the customer service team went above and beyond";
        let svg = render_text(CANVAS, text, &style());
        assert_eq!(svg.matches("<text").count(), wrap_text(text, 48, 1400, 100).len());
        assert!(svg.matches("<text").count() > 1);
    }

    #[test]
    fn test_render_text_embeds_font() {
        let mut style = style();
        style.embedded_font = Some(EmbeddedFont::from_bytes(
            "Brand",
            crate::fonts::FontFormat::TrueType,
            b"font-bytes",
        ));
        let svg = render_text(CANVAS, "Hello", &style);
        assert!(svg.contains("@font-face"));
        assert!(svg.contains(r#"font-family="Brand""#));
    }

    #[test]
    fn test_render_text_escapes_font_family() {
        let mut style = style();
        style.embedded_font = Some(EmbeddedFont::from_bytes(
            "Tom&Jerry<b>",
            crate::fonts::FontFormat::TrueType,
            b"x",
        ));
        let svg = render_text(CANVAS, "Hello", &style);
        assert!(!svg.contains("'Tom&Jerry<b>'"));
        assert!(svg.contains("font-family: 'Tom&amp;Jerry&lt;b"));
        assert!(svg.contains(r#"font-family="Tom&amp;Jerry&lt;b"#));
    }

    #[test]
    fn test_render_design_combines_layers_in_order() {
        let rendered = render_design(&request(), &mut StdRng::seed_from_u64(5));
        let combined = &rendered.combined_svg;

        assert_eq!(combined.matches("<svg").count(), 1);
        let bg = combined.find("<rect").unwrap();
        let shape = combined.find("<circle").unwrap();
        let text = combined.find("<text").unwrap();
        assert!(bg < shape && shape < text);
        assert!(combined.contains("Great service &amp; fast delivery"));
        assert!(rendered.shapes_svg.contains("<line"));
    }

    #[test]
    fn test_render_design_with_composition() {
        let mut request = request();
        request.theme = Theme::fallback();
        request.patterns.clear();
        request.placement = Some(ShapePlacement::Centered);

        let rendered = render_design(&request, &mut StdRng::seed_from_u64(5));
        assert!(rendered.shapes_svg.contains(r#"<circle cx="700" cy="450""#));
        assert_eq!(
            render_composition(CANVAS, &request.theme, ShapePlacement::Centered),
            rendered.shapes_svg
        );
    }

    #[test]
    fn test_render_shapes_empty_selection() {
        let svg = render_shapes(CANVAS, Rgb::black(), &[], &mut StdRng::seed_from_u64(5));
        assert_eq!(svg, SvgDocument::new(1400, 900).finish());
    }
}
