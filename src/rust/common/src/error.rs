//! 共通エラー型定義

use thiserror::Error;

/// テスティモニアル生成サービス共通エラー型
#[derive(Debug, Error)]
pub enum TestimonialError {
    /// 無効な色指定
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// 無効な引数（未知のパレットファミリー、構図ラベルなど）
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO エラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// テキスト生成APIのエラー
    #[error("Text generation error: {0}")]
    TextGeneration(String),

    /// フォントファイルの拒否
    #[error("フォントファイルを受け付けられません: {0}")]
    FontRejected(String),

    #[error("フォントファイルサイズが大きすぎます: {0} バイト（最大: {1} バイト）")]
    FontTooLarge(usize, usize),
}

/// Result型のエイリアス
pub type Result<T> = std::result::Result<T, TestimonialError>;

impl TestimonialError {
    /// HTTPステータスコードを返す
    pub fn status_code(&self) -> u16 {
        match self {
            TestimonialError::InvalidColor(_) |
            TestimonialError::InvalidArgument(_) |
            TestimonialError::FontRejected(_) => 400,
            TestimonialError::FontTooLarge(_, _) => 413,
            TestimonialError::TextGeneration(_) => 502,
            TestimonialError::Config(_) |
            TestimonialError::Io(_) => 500,
        }
    }

    /// エラーコードを返す（APIレスポンス用）
    pub fn error_code(&self) -> &str {
        match self {
            TestimonialError::InvalidColor(_) => "INVALID_COLOR",
            TestimonialError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TestimonialError::Config(_) => "CONFIG_ERROR",
            TestimonialError::Io(_) => "IO_ERROR",
            TestimonialError::TextGeneration(_) => "TEXT_GENERATION_ERROR",
            TestimonialError::FontRejected(_) => "FONT_REJECTED",
            TestimonialError::FontTooLarge(_, _) => "FONT_TOO_LARGE",
        }
    }
}
