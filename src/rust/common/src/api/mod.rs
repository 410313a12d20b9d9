//! 共通APIモジュール

pub mod models;
pub mod handlers;

// 再エクスポート
pub use models::{ApiResponse, ApiError, ProceduralQuery};
pub use handlers::{
    error_response,
    process_generate_testimonial,
    process_update_design,
    process_color_schemes,
    process_shape_patterns,
    process_random_design,
    process_random_theme,
    process_procedural_theme,
    process_derive_accent,
    process_health,
};

// フォントアップロード（http-endpoints有効時のみ）
#[cfg(feature = "http-endpoints")]
pub use handlers::upload_font;
