//! 装飾図形パターンと構図配置

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::document::{num, Paint, SvgDocument};
use super::Canvas;
use crate::color::Rgb;
use crate::theme::Theme;

/// 装飾パターンの不透明度
const PATTERN_OPACITY: f64 = 0.5;

/// 構図図形の不透明度
const COMPOSITION_OPACITY: f64 = 0.6;

/// 装飾図形パターン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapePattern {
    #[serde(alias = "circles")]
    Circles,
    #[serde(alias = "dots")]
    Dots,
    #[serde(alias = "waves")]
    Waves,
    #[serde(alias = "corners")]
    Corners,
    #[serde(alias = "square")]
    Square,
    #[serde(alias = "curve")]
    Curve,
}

impl ShapePattern {
    pub const ALL: [ShapePattern; 6] = [
        ShapePattern::Circles,
        ShapePattern::Dots,
        ShapePattern::Waves,
        ShapePattern::Corners,
        ShapePattern::Square,
        ShapePattern::Curve,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ShapePattern::Circles => "Circles",
            ShapePattern::Dots => "Dots",
            ShapePattern::Waves => "Waves",
            ShapePattern::Corners => "Corners",
            ShapePattern::Square => "Square",
            ShapePattern::Curve => "Curve",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ShapePattern::Circles => "Concentric circles in the top-left and bottom-right corners",
            ShapePattern::Dots => "Scattered dot grids in three sizes",
            ShapePattern::Waves => "Horizontal sine waves every 200px",
            ShapePattern::Corners => "L-shaped brackets in each corner",
            ShapePattern::Square => "Centered outlined square with corner crosses",
            ShapePattern::Curve => "Centered half arc with four small swirls",
        }
    }

    /// パターンを描画する（Dots のみ乱数を使う）
    pub fn draw<R: Rng + ?Sized>(&self, doc: &mut SvgDocument, canvas: Canvas, color: Rgb, rng: &mut R) {
        match self {
            ShapePattern::Circles => draw_circles(doc, canvas, color),
            ShapePattern::Dots => draw_dots(doc, canvas, color, rng),
            ShapePattern::Waves => draw_waves(doc, canvas, color),
            ShapePattern::Corners => draw_corners(doc, canvas, color),
            ShapePattern::Square => draw_square(doc, canvas, color),
            ShapePattern::Curve => draw_curve(doc, canvas, color),
        }
    }
}

/// 構図図形の配置方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapePlacement {
    /// キャンバス中央に同心配置
    #[default]
    Centered,
    /// 余白の内側を3x3に分割し、左上と右下のセルに配置
    Grid,
}

fn draw_circles(doc: &mut SvgDocument, canvas: Canvas, color: Rgb) {
    let (width, height) = canvas.size_f64();
    let paint = Paint::fill(color).with_fill_opacity(PATTERN_OPACITY);

    for r in (10..=70).step_by(20) {
        let r = f64::from(r);
        doc.circle(20.0 + r, 20.0 + r, r, paint);
        doc.circle(width - 20.0 - r, height - 20.0 - r, r, paint);
    }
}

fn draw_dots<R: Rng + ?Sized>(doc: &mut SvgDocument, canvas: Canvas, color: Rgb, rng: &mut R) {
    let paint = Paint::fill(color).with_fill_opacity(PATTERN_OPACITY);

    for (size, spacing) in [(3.0, 40usize), (5.0, 60), (7.0, 80)] {
        for x in (0..canvas.width).step_by(spacing) {
            for y in (0..canvas.height).step_by(spacing) {
                // 約7割のドットだけ残す
                if rng.gen::<f64>() > 0.3 {
                    let half = size / 2.0;
                    doc.circle(f64::from(x) + half, f64::from(y) + half, half, paint);
                }
            }
        }
    }
}

fn draw_waves(doc: &mut SvgDocument, canvas: Canvas, color: Rgb) {
    let waves = [(20.0, 0.02, 2.0), (30.0, 0.01, 3.0), (40.0, 0.015, 4.0)];

    for (amplitude, frequency, thickness) in waves {
        let paint = Paint::stroke(color, thickness).with_stroke_opacity(PATTERN_OPACITY);
        for offset in (0..canvas.height).step_by(200) {
            let points: Vec<(f64, f64)> = (0..canvas.width)
                .step_by(2)
                .map(|x| {
                    let x = f64::from(x);
                    (x, f64::from(offset) + amplitude * (frequency * x).sin())
                })
                .collect();
            if points.len() > 1 {
                doc.polyline(&points, paint);
            }
        }
    }
}

fn draw_corners(doc: &mut SvgDocument, canvas: Canvas, color: Rgb) {
    let (width, height) = canvas.size_f64();
    let size = 150.0;

    for thickness in [3.0, 5.0, 7.0] {
        let paint = Paint::stroke(color, thickness).with_stroke_opacity(PATTERN_OPACITY);
        // 左上
        doc.line((0.0, size), (0.0, 0.0), paint);
        doc.line((0.0, 0.0), (size, 0.0), paint);
        // 右上
        doc.line((width - size, 0.0), (width, 0.0), paint);
        doc.line((width, 0.0), (width, size), paint);
        // 左下
        doc.line((0.0, height - size), (0.0, height), paint);
        doc.line((0.0, height), (size, height), paint);
        // 右下
        doc.line((width - size, height), (width, height), paint);
        doc.line((width, height), (width, height - size), paint);
    }
}

fn draw_square(doc: &mut SvgDocument, canvas: Canvas, color: Rgb) {
    let (cx, cy) = canvas.center();
    let side = canvas.shorter_side() * 0.6;
    let left = cx - side / 2.0;
    let top = cy - side / 2.0;
    let paint = Paint::stroke(color, 3.0);

    doc.rect(left, top, side, side, paint);

    let corner = side * 0.2;
    for (x, y) in [(left, top), (left + side, top), (left, top + side), (left + side, top + side)] {
        doc.line((x - corner, y), (x + corner, y), paint);
        doc.line((x, y - corner), (x, y + corner), paint);
    }
}

fn draw_curve(doc: &mut SvgDocument, canvas: Canvas, color: Rgb) {
    let (cx, cy) = canvas.center();
    let radius = canvas.shorter_side() * 0.3;

    // 右端から下側を通って左端まで
    doc.path(&arc_path(cx, cy, radius, 0.0), Paint::stroke(color, 3.0));

    let swirl = radius * 0.2;
    for angle in [0.0, 90.0, 180.0, 270.0] {
        let rad = angle * PI / 180.0;
        let x = cx + radius * rad.cos();
        let y = cy + radius * rad.sin();
        doc.path(&arc_path(x, y, swirl, angle), Paint::stroke(color, 2.0));
    }
}

/// `start_deg` から時計回りに180度の円弧
fn arc_path(cx: f64, cy: f64, r: f64, start_deg: f64) -> String {
    let start = start_deg * PI / 180.0;
    let end = start + PI;
    format!(
        "M {} {} A {r} {r} 0 0 1 {} {}",
        num(cx + r * start.cos()),
        num(cy + r * start.sin()),
        num(cx + r * end.cos()),
        num(cy + r * end.sin()),
        r = num(r)
    )
}

/// テーマの図形サイズに従って主図形2つ（正方形と円）を描く
///
/// サイズを持たないテーマでは何も描かず `false` を返す。
pub fn draw_composition(doc: &mut SvgDocument, canvas: Canvas, theme: &Theme, placement: ShapePlacement) -> bool {
    let sizes = match theme.size_pair() {
        Some(sizes) => sizes,
        None => return false,
    };

    let [color1, color2] = theme
        .shape_colors
        .unwrap_or([theme.accent, theme.secondary_accent.unwrap_or(theme.accent)]);
    let shorter = canvas.shorter_side();
    let side = sizes.shape1 * shorter;
    let radius = sizes.shape2 * shorter / 2.0;

    let (center1, center2) = match placement {
        ShapePlacement::Centered => (canvas.center(), canvas.center()),
        ShapePlacement::Grid => {
            let (width, height) = canvas.size_f64();
            let margin = f64::from(theme.margin.unwrap_or(0));
            let cell_w = (width - 2.0 * margin).max(0.0) / 3.0;
            let cell_h = (height - 2.0 * margin).max(0.0) / 3.0;
            (
                (margin + cell_w / 2.0, margin + cell_h / 2.0),
                (margin + cell_w * 2.5, margin + cell_h * 2.5),
            )
        }
    };

    doc.rect(
        center1.0 - side / 2.0,
        center1.1 - side / 2.0,
        side,
        side,
        Paint::fill(color1).with_fill_opacity(COMPOSITION_OPACITY),
    );
    doc.circle(
        center2.0,
        center2.1,
        radius,
        Paint::fill(color2).with_fill_opacity(COMPOSITION_OPACITY),
    );
    true
}
