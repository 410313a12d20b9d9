//! SVG文書の組み立て
//!
//! 要素は `SvgDocument` に溜めておき、`finish` / `compose` の時点で
//! `xmlwriter` を使って `<svg>` ルートごと書き出す。

use xmlwriter::{Indent, Options, XmlWriter};

use crate::color::Rgb;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// 塗りと線の属性
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Paint {
    pub fill: Option<Rgb>,
    pub fill_opacity: Option<f64>,
    pub stroke: Option<Rgb>,
    pub stroke_width: Option<f64>,
    pub stroke_opacity: Option<f64>,
}

impl Paint {
    pub fn fill(color: Rgb) -> Self {
        Paint {
            fill: Some(color),
            ..Default::default()
        }
    }

    /// 線のみ（fill="none"）
    pub fn stroke(color: Rgb, width: f64) -> Self {
        Paint {
            stroke: Some(color),
            stroke_width: Some(width),
            ..Default::default()
        }
    }

    pub fn with_fill_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }

    pub fn with_stroke_opacity(mut self, opacity: f64) -> Self {
        self.stroke_opacity = Some(opacity);
        self
    }

    fn apply(&self, element: &mut Element) {
        match self.fill {
            Some(fill) => element.attr("fill", fill.to_hex()),
            None => element.attr("fill", "none"),
        }
        if let Some(opacity) = self.fill_opacity {
            element.attr("fill-opacity", num(opacity));
        }
        if let Some(stroke) = self.stroke {
            element.attr("stroke", stroke.to_hex());
        }
        if let Some(width) = self.stroke_width {
            element.attr("stroke-width", num(width));
        }
        if let Some(opacity) = self.stroke_opacity {
            element.attr("stroke-opacity", num(opacity));
        }
    }
}

/// 座標値を小数点以下2桁までの短い表記にする
pub fn num(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// 書き出し前の要素
#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    text: Option<String>,
}

impl Element {
    fn new(name: &'static str) -> Self {
        Element {
            name,
            attributes: Vec::new(),
            text: None,
        }
    }

    fn attr(&mut self, name: &'static str, value: impl Into<String>) {
        self.attributes.push((name, value.into()));
    }

    fn write(&self, xml: &mut XmlWriter) {
        xml.start_element(self.name);
        for (name, value) in &self.attributes {
            // 引用符は xmlwriter が置き換える
            xml.write_attribute(name, &escape_attribute(value));
        }
        if let Some(text) = &self.text {
            xml.write_text(&escape_text(text));
        }
        xml.end_element();
    }
}

// xmlwriter はテキスト中の `<` しか置き換えない
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;")
}

fn writer() -> XmlWriter {
    XmlWriter::new(Options {
        use_single_quote: false,
        indent: Indent::None,
        attributes_indent: Indent::None,
    })
}

/// SVG文書ビルダー
#[derive(Debug, Clone, Default)]
pub struct SvgDocument {
    width: u32,
    height: u32,
    style: String,
    elements: Vec<Element>,
}

impl SvgDocument {
    pub fn new(width: u32, height: u32) -> Self {
        SvgDocument {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_empty() && self.elements.is_empty()
    }

    /// `<style>` 要素にCSSを追加
    pub fn style(&mut self, css: &str) -> &mut Self {
        self.style.push_str(css);
        self
    }

    fn push(&mut self, mut element: Element, paint: Paint) -> &mut Self {
        paint.apply(&mut element);
        self.elements.push(element);
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: Paint) -> &mut Self {
        let mut rect = Element::new("rect");
        rect.attr("x", num(x));
        rect.attr("y", num(y));
        rect.attr("width", num(width));
        rect.attr("height", num(height));
        self.push(rect, paint)
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: Paint) -> &mut Self {
        let mut circle = Element::new("circle");
        circle.attr("cx", num(cx));
        circle.attr("cy", num(cy));
        circle.attr("r", num(r));
        self.push(circle, paint)
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), paint: Paint) -> &mut Self {
        let mut line = Element::new("line");
        line.attr("x1", num(from.0));
        line.attr("y1", num(from.1));
        line.attr("x2", num(to.0));
        line.attr("y2", num(to.1));
        self.push(line, paint)
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], paint: Paint) -> &mut Self {
        let points = points
            .iter()
            .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
            .collect::<Vec<_>>()
            .join(" ");
        let mut polyline = Element::new("polyline");
        polyline.attr("points", points);
        self.push(polyline, paint)
    }

    pub fn path(&mut self, d: &str, paint: Paint) -> &mut Self {
        let mut path = Element::new("path");
        path.attr("d", d);
        self.push(path, paint)
    }

    /// テキスト要素
    pub fn text(
        &mut self,
        x: f64,
        y: f64,
        content: &str,
        color: Rgb,
        font_size: u32,
        font_family: &str,
    ) -> &mut Self {
        let mut text = Element::new("text");
        text.attr("x", num(x));
        text.attr("y", num(y));
        text.attr("fill", color.to_hex());
        text.attr("font-size", font_size.to_string());
        text.attr("font-family", font_family);
        text.text = Some(content.to_string());
        self.elements.push(text);
        self
    }

    /// ルート要素を含む文字列を返す
    pub fn finish(&self) -> String {
        let mut xml = writer();
        start_root(&mut xml, self.width, self.height);
        write_style(&mut xml, &self.style);
        for element in &self.elements {
            element.write(&mut xml);
        }
        xml.end_document()
    }

    /// 複数のレイヤーを1つの文書にまとめる
    ///
    /// 各レイヤーは `<g>` として順に重ね、CSSは先頭の `<style>` に集める。
    /// 要素のないレイヤーは書き出さない。
    pub fn compose(width: u32, height: u32, layers: &[&SvgDocument]) -> String {
        let mut xml = writer();
        start_root(&mut xml, width, height);

        let style: String = layers.iter().map(|layer| layer.style.as_str()).collect();
        write_style(&mut xml, &style);

        for layer in layers.iter().filter(|layer| !layer.elements.is_empty()) {
            xml.start_element("g");
            for element in &layer.elements {
                element.write(&mut xml);
            }
            xml.end_element();
        }
        xml.end_document()
    }
}

fn start_root(xml: &mut XmlWriter, width: u32, height: u32) {
    xml.start_element("svg");
    xml.write_attribute("width", &width);
    xml.write_attribute("height", &height);
    xml.write_attribute_fmt("viewBox", format_args!("0 0 {} {}", width, height));
    xml.write_attribute("xmlns", SVG_NS);
}

fn write_style(xml: &mut XmlWriter, css: &str) {
    if css.is_empty() {
        return;
    }
    xml.start_element("style");
    xml.write_text(&escape_text(css));
    xml.end_element();
}
