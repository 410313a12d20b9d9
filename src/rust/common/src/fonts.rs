//! アップロードされたフォントの保存と埋め込み

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::error::{Result, TestimonialError};

/// 受け付けるフォント形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontFormat {
    #[serde(rename = "ttf")]
    TrueType,
    #[serde(rename = "otf")]
    OpenType,
}

impl FontFormat {
    /// ファイル名の拡張子から判定する
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name).extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "ttf" => Some(FontFormat::TrueType),
            "otf" => Some(FontFormat::OpenType),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FontFormat::TrueType => "font/ttf",
            FontFormat::OpenType => "font/otf",
        }
    }

    /// `@font-face` の format() に書く名前
    pub fn css_format(&self) -> &'static str {
        match self {
            FontFormat::TrueType => "truetype",
            FontFormat::OpenType => "opentype",
        }
    }
}

/// SVGに埋め込むフォント
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedFont {
    pub family: String,
    pub format: FontFormat,
    /// Base64エンコード済みのフォントデータ
    pub data: String,
}

impl EmbeddedFont {
    pub fn from_bytes(family: &str, format: FontFormat, bytes: &[u8]) -> Self {
        EmbeddedFont {
            family: family.to_string(),
            format,
            data: STANDARD.encode(bytes),
        }
    }

    pub fn font_face_css(&self) -> String {
        format!(
            "@font-face {{ font-family: '{}'; src: url(data:{};base64,{}) format('{}'); }}",
            self.family,
            self.format.mime_type(),
            self.data,
            self.format.css_format()
        )
    }
}

/// 保存済みフォントの情報
#[derive(Debug, Clone, Serialize)]
pub struct StoredFont {
    pub file_name: String,
    pub family: String,
    pub format: FontFormat,
    pub size: usize,
}

/// フォント保存ディレクトリ
#[derive(Debug, Clone)]
pub struct FontStore {
    root: PathBuf,
    max_bytes: usize,
}

impl FontStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        FontStore {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn from_settings(config: &StorageConfig) -> Self {
        Self::new(&config.fonts_dir, config.max_font_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// ファイル名を検証し、形式とファミリー名（拡張子を除いた名前）を返す
    fn validate_name(file_name: &str) -> Result<(FontFormat, String)> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(TestimonialError::FontRejected(format!(
                "不正なファイル名: {}",
                file_name
            )));
        }

        let format = FontFormat::from_file_name(file_name).ok_or_else(|| {
            TestimonialError::FontRejected(format!(
                "対応していない形式です（.ttf / .otf のみ）: {}",
                file_name
            ))
        })?;

        let family = Path::new(file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| TestimonialError::FontRejected(format!("不正なファイル名: {}", file_name)))?
            .to_string();

        // ファミリー名は CSS と SVG 属性にそのまま入るので英数字と空白、`_`、`-` に限る
        if !family
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        {
            return Err(TestimonialError::FontRejected(format!(
                "フォント名に使えない文字が含まれています: {}",
                file_name
            )));
        }

        Ok((format, family))
    }

    /// フォントを保存する
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFont> {
        let (format, family) = Self::validate_name(file_name)?;

        if bytes.is_empty() {
            return Err(TestimonialError::FontRejected("空のファイルです".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(TestimonialError::FontTooLarge(bytes.len(), self.max_bytes));
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(file_name);
        tokio::fs::write(&path, bytes).await?;

        info!("Saved font {} ({} bytes) to {}", file_name, bytes.len(), path.display());

        Ok(StoredFont {
            file_name: file_name.to_string(),
            family,
            format,
            size: bytes.len(),
        })
    }

    /// 保存済みフォントを読み込む。存在しなければ `None`
    pub async fn load(&self, file_name: &str) -> Result<Option<EmbeddedFont>> {
        let (format, family) = Self::validate_name(file_name)?;
        let path = self.root.join(file_name);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Loaded font {} ({} bytes)", file_name, bytes.len());
                Ok(Some(EmbeddedFont::from_bytes(&family, format, &bytes)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_format() {
        assert_eq!(FontFormat::from_file_name("Brand.TTF"), Some(FontFormat::TrueType));
        assert_eq!(FontFormat::from_file_name("brand.otf"), Some(FontFormat::OpenType));
        assert_eq!(FontFormat::from_file_name("brand.woff"), None);
        assert_eq!(FontFormat::from_file_name("brand"), None);
    }

    #[test]
    fn test_font_face_css() {
        let font = EmbeddedFont::from_bytes("Brand", FontFormat::TrueType, b"abc");
        assert_eq!(font.data, "YWJj");
        assert_eq!(
            font.font_face_css(),
            "@font-face { font-family: 'Brand'; src: url(data:font/ttf;base64,YWJj) format('truetype'); }"
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FontStore::new(dir.path().join("fonts"), 1024);

        let stored = store.save("Brand.ttf", b"font-data").await.unwrap();
        store.save("Open Sans_Bold-2.otf", b"font-data").await.unwrap();
        assert_eq!(stored.family, "Brand");
        assert_eq!(stored.size, 9);

        let loaded = store.load("Brand.ttf").await.unwrap().unwrap();
        assert_eq!(loaded.family, "Brand");
        assert_eq!(loaded.format, FontFormat::TrueType);
        assert_eq!(loaded.data, STANDARD.encode(b"font-data"));

        assert!(store.load("Missing.ttf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FontStore::new(dir.path(), 1024);

        for name in [
            "../evil.ttf",
            "sub/font.ttf",
            "sub\\font.ttf",
            "font.exe",
            "",
            ".ttf",
            "Tom&Jerry.ttf",
            "a<b.ttf",
            "it's.otf",
        ] {
            let err = store.save(name, b"data").await.unwrap_err();
            assert_eq!(err.error_code(), "FONT_REJECTED", "name {:?}", name);
        }
    }

    #[tokio::test]
    async fn test_rejects_large_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FontStore::new(dir.path(), 4);

        let err = store.save("Brand.otf", b"12345").await.unwrap_err();
        assert!(matches!(err, TestimonialError::FontTooLarge(5, 4)));
        assert_eq!(err.status_code(), 413);

        let err = store.save("Brand.otf", b"").await.unwrap_err();
        assert_eq!(err.error_code(), "FONT_REJECTED");
    }
}
