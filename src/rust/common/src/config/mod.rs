//! 共通設定管理モジュール

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use crate::error::{TestimonialError, Result};

/// サーバー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// バインドするホストアドレス
    pub host: String,

    /// ポート番号
    pub port: u16,

    /// ワーカースレッド数
    pub workers: Option<usize>,

    /// リクエストタイムアウト（秒）
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: None,
            request_timeout_secs: 30,
        }
    }
}

/// ロギング設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// ログレベル
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// API設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// CORS許可オリジン
    pub cors_origins: Vec<String>,

    /// 最大リクエストボディサイズ（バイト）
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// キャンバス（出力画像）設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,

    /// SVGのfont-familyに使うフォント名
    pub font_family: String,

    /// 既定のフォントサイズ
    pub font_size: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            width: 1400,
            height: 900,
            font_family: "Poppins-Medium".to_string(),
            font_size: 48,
        }
    }
}

/// 文章生成API設定（OpenAI互換のチャット補完エンドポイント）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriterConfig {
    pub api_url: String,

    /// 未設定の場合は固定文面を使う
    pub api_key: Option<String>,

    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// リクエストタイムアウト（秒）
    pub timeout_secs: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: None,
            model: "mixtral-8x7b-32768".to_string(),
            temperature: 0.7,
            max_tokens: 150,
            timeout_secs: 30,
        }
    }
}

/// フォント保存設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub fonts_dir: String,

    /// アップロード可能な最大フォントサイズ（バイト）
    pub max_font_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            fonts_dir: "testimonial_output/fonts".to_string(),
            max_font_bytes: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// 出力設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// 合成SVGをファイルにも保存する
    pub save_combined: bool,
    pub images_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            save_combined: false,
            images_dir: "testimonial_output/images".to_string(),
        }
    }
}

/// パレット・デザイン設定テーブルのファイル（未指定なら組み込みテーブル）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaletteConfig {
    pub palette_file: Option<String>,
    pub presets_file: Option<String>,
}

/// アプリケーション設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// サーバー設定
    #[serde(default)]
    pub server: ServerConfig,

    /// ロギング設定
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API設定
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub writer: WriterConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub palettes: PaletteConfig,
}

impl Settings {
    /// 設定を読み込む
    ///
    /// 読み込み優先順位：
    /// 1. 環境変数
    /// 2. 設定ファイル（指定された場合）
    /// 3. デフォルト値
    pub fn new() -> Result<Self> {
        let mut settings = Self::default();

        // 設定ファイルパスを環境変数から取得
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            settings = Self::from_file(&config_path)?;
        }

        // 環境変数で上書き
        settings.override_from_env();

        Ok(settings)
    }

    /// 設定ファイルから読み込む
    pub fn from_file(path: &str) -> Result<Self> {
        load_structured(path)
    }

    /// 環境変数で設定を上書き
    fn override_from_env(&mut self) {
        // サーバー設定
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(workers) = env::var("WORKERS") {
            if let Ok(workers) = workers.parse() {
                self.server.workers = Some(workers);
            }
        }

        // ロギング設定
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.logging.level = log_level;
        }

        // API設定
        if let Ok(cors_origins) = env::var("CORS_ORIGINS") {
            self.api.cors_origins = cors_origins.split(',')
                .map(|s| s.trim().to_string())
                .collect();
        }

        // 文章生成API
        if let Ok(api_key) = env::var("LLM_API_KEY") {
            if !api_key.trim().is_empty() {
                self.writer.api_key = Some(api_key);
            }
        }
        if let Ok(api_url) = env::var("LLM_API_URL") {
            self.writer.api_url = api_url;
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            self.writer.model = model;
        }

        // ファイル
        if let Ok(fonts_dir) = env::var("FONTS_DIR") {
            self.storage.fonts_dir = fonts_dir;
        }
        if let Ok(palette_file) = env::var("PALETTE_FILE") {
            self.palettes.palette_file = Some(palette_file);
        }
        if let Ok(presets_file) = env::var("PRESETS_FILE") {
            self.palettes.presets_file = Some(presets_file);
        }
    }

    /// 設定を検証
    pub fn validate(&self) -> Result<()> {
        // ポート番号の検証
        if self.server.port == 0 {
            return Err(TestimonialError::Config("Invalid port number: 0".to_string()));
        }

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(TestimonialError::Config(format!(
                "Invalid canvas size: {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }

        if !(12..=144).contains(&self.canvas.font_size) {
            return Err(TestimonialError::Config(format!(
                "Default font size must be between 12 and 144: {}",
                self.canvas.font_size
            )));
        }

        if self.writer.timeout_secs == 0 {
            return Err(TestimonialError::Config("Writer timeout cannot be 0".to_string()));
        }

        Ok(())
    }

    /// 設定をファイルに保存
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| TestimonialError::Config(format!("Failed to serialize to JSON: {}", e)))?
        } else if path.ends_with(".toml") {
            toml::to_string_pretty(self)
                .map_err(|e| TestimonialError::Config(format!("Failed to serialize to TOML: {}", e)))?
        } else if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::to_string(self)
                .map_err(|e| TestimonialError::Config(format!("Failed to serialize to YAML: {}", e)))?
        } else {
            return Err(TestimonialError::Config("Unsupported config file format".to_string()));
        };

        std::fs::write(path, content)
            .map_err(|e| TestimonialError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// 拡張子に応じて JSON / TOML / YAML ファイルを読み込む
///
/// 設定ファイル、パレットテーブル、デザイン設定テーブルで共通に使う。
pub(crate) fn load_structured<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TestimonialError::Config(format!("Failed to read {}: {}", path, e)))?;

    // JSON形式
    if path.ends_with(".json") {
        serde_json::from_str(&content)
            .map_err(|e| TestimonialError::Config(format!("Failed to parse JSON {}: {}", path, e)))
    }
    // TOML形式
    else if path.ends_with(".toml") {
        toml::from_str(&content)
            .map_err(|e| TestimonialError::Config(format!("Failed to parse TOML {}: {}", path, e)))
    }
    // YAML形式
    else if path.ends_with(".yaml") || path.ends_with(".yml") {
        serde_yaml::from_str(&content)
            .map_err(|e| TestimonialError::Config(format!("Failed to parse YAML {}: {}", path, e)))
    } else {
        Err(TestimonialError::Config(format!("Unsupported file format: {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.canvas.width, 1400);
        assert_eq!(settings.canvas.height, 900);
        assert_eq!(settings.canvas.font_size, 48);
        assert_eq!(settings.writer.max_tokens, 150);
        assert!(settings.writer.api_key.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.canvas.width = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.canvas.font_size = 200;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.writer.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_reload_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.server.port = 9100;
        settings.palettes.palette_file = Some("palettes.yaml".to_string());

        for name in ["settings.json", "settings.toml", "settings.yaml"] {
            let path = dir.path().join(name);
            let path = path.to_str().unwrap();
            settings.save_to_file(path).unwrap();

            let loaded = Settings::from_file(path).unwrap();
            assert_eq!(loaded.server.port, 9100);
            assert_eq!(loaded.palettes.palette_file.as_deref(), Some("palettes.yaml"));
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[canvas]\nwidth = 1080\nheight = 1080\nfont_family = \"Inter\"\nfont_size = 40\n").unwrap();

        let loaded = Settings::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.canvas.width, 1080);
        assert_eq!(loaded.server.port, 8000);
        assert_eq!(loaded.storage.fonts_dir, "testimonial_output/fonts");
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "port=1").unwrap();

        let err = Settings::from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, TestimonialError::Config(_)));
        assert!(Settings::default().save_to_file(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_file("/nonexistent/settings.json").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
