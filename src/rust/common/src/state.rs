//! HTTPハンドラー間で共有する読み取り専用の状態

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::fonts::FontStore;
use crate::svg::Canvas;
use crate::theme::{PaletteTable, PresetTable, ThemeEngine};
use crate::writer::{writer_from_settings, TestimonialWriter};

/// アプリケーション状態
///
/// 起動時に一度だけ組み立て、以降は変更しない。
pub struct AppState {
    pub settings: Settings,
    pub engine: ThemeEngine,
    pub presets: Arc<PresetTable>,
    pub writer: Arc<dyn TestimonialWriter>,
    pub fonts: FontStore,
}

impl AppState {
    /// 設定からパレット・プリセットを読み込んで状態を作る
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let palettes = PaletteTable::load(settings.palettes.palette_file.as_deref())?;
        let presets = PresetTable::load(settings.palettes.presets_file.as_deref())?;
        let writer: Arc<dyn TestimonialWriter> = Arc::from(writer_from_settings(&settings.writer));

        info!(
            "Loaded {} palette families and {} design presets, writer: {}",
            palettes.families.len(),
            presets.presets.len(),
            writer.name()
        );

        Ok(Self::new(settings, palettes, presets, writer))
    }

    pub fn new(
        settings: Settings,
        palettes: PaletteTable,
        presets: PresetTable,
        writer: Arc<dyn TestimonialWriter>,
    ) -> Self {
        let fonts = FontStore::from_settings(&settings.storage);
        AppState {
            settings,
            engine: ThemeEngine::new(Arc::new(palettes)),
            presets: Arc::new(presets),
            writer,
            fonts,
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::from(&self.settings.canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_settings_uses_builtin_tables() {
        let state = AppState::from_settings(Settings::default()).unwrap();
        assert_eq!(state.engine.palettes().families.len(), 4);
        assert_eq!(state.presets.presets.len(), 12);
        assert_eq!(state.writer.name(), "static");
        assert_eq!(state.canvas(), Canvas::new(1400, 900));
    }

    #[test]
    fn test_missing_palette_file_is_an_error() {
        let mut settings = Settings::default();
        settings.palettes.palette_file = Some("/nonexistent/palettes.json".to_string());
        assert!(AppState::from_settings(settings).is_err());
    }
}
