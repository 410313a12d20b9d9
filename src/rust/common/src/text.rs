//! テキスト処理ユーティリティ
//!
//! SVG用のテキスト折り返し処理

/// 1文字あたりの幅（フォントサイズに対する比率）の近似値
pub const CHAR_WIDTH_RATIO: f64 = 0.6;

/// 行の高さ（フォントサイズに対する比率）
pub const LINE_HEIGHT_RATIO: f64 = 1.2;

/// 折り返し時の左右の余白
pub const DEFAULT_PADDING: u32 = 100;

/// 文字数からおおよその描画幅を求める
pub fn estimate_width(text: &str, font_size: u32) -> f64 {
    text.chars().count() as f64 * f64::from(font_size) * CHAR_WIDTH_RATIO
}

/// テキストを単語単位で折り返す
///
/// 有効幅は `max_width - 2 * padding`。1単語だけで幅を超える場合はその単語を1行にする。
pub fn wrap_text(text: &str, font_size: u32, max_width: u32, padding: u32) -> Vec<String> {
    let effective_width = f64::from(max_width) - 2.0 * f64::from(padding);

    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        let line = current.join(" ");

        if estimate_width(&line, font_size) > effective_width {
            if current.len() == 1 {
                lines.push(line);
                current.clear();
            } else {
                current.pop();
                lines.push(current.join(" "));
                current.clear();
                current.push(word);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    lines
}
