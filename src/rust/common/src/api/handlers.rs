//! 共通APIハンドラー実装

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[cfg(feature = "http-endpoints")]
use actix_multipart::{Field, Multipart};
#[cfg(feature = "http-endpoints")]
use futures_util::stream::StreamExt as _;

use super::models::{
    clamp_font_size, ApiError, ApiResponse, ColorSchemesResponse, DeriveAccentRequest,
    DeriveAccentResponse, DesignOptions, GenerateTestimonialRequest, HealthResponse,
    ProceduralQuery, ShapePatternInfo, SvgResponse, UpdateDesignRequest,
};
use crate::color::{parse_color_or, Rgb};
use crate::error::{Result, TestimonialError};
use crate::state::AppState;
use crate::svg::{render_design, render_shapes, Canvas, DesignRequest, ShapePattern, TextStyle};
use crate::theme::presets::{color_wheel, palette_groups, preset_schemes};
use crate::theme::{contrast_ratio, derive_accent, ensure_readable_text, DesignPreset, Theme};
use crate::writer::generate_testimonial;

/// プレビュー用キャンバス
const PREVIEW_CANVAS: Canvas = Canvas::new(200, 200);

/// エラーをAPIレスポンスに変換
pub fn error_response(err: &TestimonialError) -> HttpResponse {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ApiResponse::<()>::error(ApiError::from(err)))
}

/// POST /generate-testimonial ハンドラーの共通処理
pub async fn process_generate_testimonial(
    request: GenerateTestimonialRequest,
    state: web::Data<AppState>,
) -> HttpResponse {
    let start_time = Instant::now();
    let topic = request.topic.trim();
    info!("Processing generate-testimonial request: topic='{}'", topic);

    if topic.is_empty() {
        return error_response(&TestimonialError::InvalidArgument(
            "Please enter a topic".to_string(),
        ));
    }

    let text = generate_testimonial(state.writer.as_ref(), topic).await;

    match render_request(text, &request.design, &state, "").await {
        Ok(response) => {
            info!(
                "Testimonial {} rendered in {}ms",
                response.request_id,
                start_time.elapsed().as_millis()
            );
            HttpResponse::Ok().json(ApiResponse::success(response))
        }
        Err(e) => {
            error!("Failed to render testimonial: {}", e);
            error_response(&e)
        }
    }
}

/// POST /update-design ハンドラーの共通処理
pub async fn process_update_design(
    request: UpdateDesignRequest,
    state: web::Data<AppState>,
) -> HttpResponse {
    let text = request.text.trim();
    info!("Processing update-design request ({} chars)", text.chars().count());

    if text.is_empty() {
        return error_response(&TestimonialError::InvalidArgument(
            "Please enter testimonial text".to_string(),
        ));
    }

    match render_request(text.to_string(), &request.design, &state, "_edited").await {
        Ok(response) => HttpResponse::Ok().json(ApiResponse::success(response)),
        Err(e) => {
            error!("Failed to render design: {}", e);
            error_response(&e)
        }
    }
}

/// 文面と描画オプションから全レイヤーを描画する
async fn render_request(
    text: String,
    design: &DesignOptions,
    state: &AppState,
    file_suffix: &str,
) -> Result<SvgResponse> {
    let request_id = Uuid::new_v4().to_string();
    let canvas = state.canvas();
    let font_size = clamp_font_size(design.font_size, state.settings.canvas.font_size);
    let mut rng = StdRng::from_entropy();

    let (theme, family) = match &design.procedural {
        Some(query) => {
            let generated = state.engine.generate_procedural_theme(
                query.family(),
                query.composition(),
                &mut rng,
            )?;
            (generated.theme, Some(generated.family))
        }
        None => {
            let colors = design.colors.resolve();
            (Theme::basic(colors.bg, colors.text, colors.accent), None)
        }
    };

    let embedded_font = match &design.font {
        Some(name) => {
            let font = state.fonts.load(name).await?;
            if font.is_none() {
                warn!("Font {} not found, using {}", name, state.settings.canvas.font_family);
            }
            font
        }
        None => None,
    };

    let text_style = TextStyle {
        color: theme.text,
        font_size,
        font_family: state.settings.canvas.font_family.clone(),
        has_quotes: design.has_quotes,
        embedded_font,
    };
    let request = DesignRequest {
        canvas,
        theme,
        text,
        patterns: design.shapes.clone(),
        placement: Some(design.placement),
        text_style,
    };

    debug!(
        "Rendering {}: bg={} text={} accent={} shapes={:?}",
        request_id, request.theme.background, request.theme.text, request.theme.accent, request.patterns
    );

    let rendered = render_design(&request, &mut rng);

    let saved_path = if state.settings.output.save_combined {
        Some(save_combined_svg(&state.settings.output.images_dir, &rendered.combined_svg, file_suffix).await?)
    } else {
        None
    };

    Ok(SvgResponse {
        request_id,
        background_svg: rendered.background_svg,
        shapes_svg: rendered.shapes_svg,
        text_svg: rendered.text_svg,
        combined_svg: rendered.combined_svg,
        text_content: request.text,
        colors: DesignPreset {
            bg: request.theme.background,
            text: request.theme.text,
            accent: request.theme.accent,
        },
        family,
        saved_path,
    })
}

/// 合成SVGを出力ディレクトリに保存する
async fn save_combined_svg(images_dir: &str, svg: &str, suffix: &str) -> Result<String> {
    tokio::fs::create_dir_all(images_dir).await?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = Path::new(images_dir).join(format!("testimonial_combined_{}{}.svg", timestamp, suffix));
    tokio::fs::write(&path, svg).await?;
    info!("Saved combined SVG to {}", path.display());
    Ok(path.display().to_string())
}

/// GET /color-schemes
pub async fn process_color_schemes() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(ColorSchemesResponse {
        presets: preset_schemes(),
        color_wheel: color_wheel(),
        palette_groups: palette_groups(),
    }))
}

/// GET /shape-patterns
pub async fn process_shape_patterns() -> HttpResponse {
    let mut rng = StdRng::from_entropy();
    let accent = Rgb::from_u32(0x2196F3);

    let patterns: Vec<ShapePatternInfo> = ShapePattern::ALL
        .iter()
        .map(|pattern| ShapePatternInfo {
            name: pattern.name().to_string(),
            description: pattern.description().to_string(),
            preview_svg: render_shapes(PREVIEW_CANVAS, accent, &[*pattern], &mut rng),
        })
        .collect();

    HttpResponse::Ok().json(ApiResponse::success(patterns))
}

/// GET /random-design
pub async fn process_random_design(state: web::Data<AppState>) -> HttpResponse {
    let design = state.presets.random_design(&mut StdRng::from_entropy());
    debug!("Random design: bg={} text={} accent={}", design.bg, design.text, design.accent);
    HttpResponse::Ok().json(ApiResponse::success(design))
}

/// GET /random-theme
pub async fn process_random_theme(state: web::Data<AppState>) -> HttpResponse {
    let theme = state
        .engine
        .theme_from_presets(&state.presets, &mut StdRng::from_entropy());
    HttpResponse::Ok().json(ApiResponse::success(theme))
}

/// GET /procedural-theme
pub async fn process_procedural_theme(
    query: ProceduralQuery,
    state: web::Data<AppState>,
) -> HttpResponse {
    info!(
        "Processing procedural-theme request: family={:?} composition={:?}",
        query.family, query.composition
    );

    match state.engine.generate_procedural_theme(
        query.family(),
        query.composition(),
        &mut StdRng::from_entropy(),
    ) {
        Ok(generated) => HttpResponse::Ok().json(ApiResponse::success(generated)),
        Err(e) => {
            warn!("Procedural theme rejected: {}", e);
            error_response(&e)
        }
    }
}

/// POST /derive-accent
pub async fn process_derive_accent(request: DeriveAccentRequest) -> HttpResponse {
    let background = parse_color_or(&request.bg, Rgb::white());
    let text = parse_color_or(&request.text, Rgb::black());

    let accent = derive_accent(background, text);
    let readable_text = ensure_readable_text(background, text);

    HttpResponse::Ok().json(ApiResponse::success(DeriveAccentResponse {
        background,
        text,
        accent,
        readable_text,
        text_contrast: contrast_ratio(readable_text, background),
        accent_contrast: contrast_ratio(accent, background),
    }))
}

/// GET /health
pub async fn process_health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        palette_families: state.engine.palettes().families.len(),
        design_presets: state.presets.presets.len(),
        writer: state.writer.name().to_string(),
    }))
}

/// フォントアップロード
/// POST /upload-font
#[cfg(feature = "http-endpoints")]
pub async fn upload_font(
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> std::result::Result<HttpResponse, actix_web::Error> {
    let mut font: Option<(String, Vec<u8>)> = None;

    info!("Processing font upload request");

    // multipart/form-data 処理
    while let Some(field_result) = payload.next().await {
        let mut field = field_result.map_err(|e| {
            error!("Multipart field error: {}", e);
            actix_web::error::ErrorBadRequest(format!("Multipart error: {}", e))
        })?;

        let field_name = field.name().to_string();
        debug!("Processing field: {}", field_name);

        match field_name.as_str() {
            "file" => {
                let file_name = field
                    .content_disposition()
                    .get_filename()
                    .map(|name| name.to_string())
                    .unwrap_or_default();
                let data = read_field_data(&mut field, state.settings.storage.max_font_bytes).await?;
                info!("Font file received: {} ({} bytes)", file_name, data.len());
                font = Some((file_name, data));
            }
            _ => {
                debug!("Unknown field ignored: {}", field_name);
                read_field_data(&mut field, state.settings.storage.max_font_bytes).await?;
            }
        }
    }

    let (file_name, data) = match font {
        Some(font) => font,
        None => {
            error!("No font file provided in multipart request");
            return Ok(error_response(&TestimonialError::FontRejected(
                "フォントファイルがありません".to_string(),
            )));
        }
    };

    match state.fonts.save(&file_name, &data).await {
        Ok(stored) => Ok(HttpResponse::Ok().json(ApiResponse::success(stored))),
        Err(e) => {
            warn!("Font upload rejected: {}", e);
            Ok(error_response(&e))
        }
    }
}

/// フィールドデータを読み取る補助関数
///
/// 上限を1バイトでも超えた時点で読み込みをやめる（保存側で413にする）。
#[cfg(feature = "http-endpoints")]
async fn read_field_data(field: &mut Field, limit: usize) -> std::result::Result<Vec<u8>, actix_web::Error> {
    let mut data = Vec::new();

    while let Some(chunk_result) = field.next().await {
        let chunk = chunk_result.map_err(|e| {
            error!("Field chunk read error: {}", e);
            actix_web::error::ErrorBadRequest(format!("Field read error: {}", e))
        })?;
        if data.len() > limit {
            continue;
        }
        data.extend_from_slice(&chunk);
    }

    debug!("Read field data: {} bytes", data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::theme::{PaletteTable, PresetTable};
    use crate::writer::StaticWriter;
    use actix_web::{test as actix_test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn state_with(settings: Settings) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            settings,
            PaletteTable::builtin(),
            PresetTable::builtin(),
            Arc::new(StaticWriter),
        ))
    }

    fn state() -> web::Data<AppState> {
        state_with(Settings::default())
    }

    macro_rules! app {
        ($state:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data($state)
                    .route(
                        "/generate-testimonial",
                        web::post().to(|req: web::Json<GenerateTestimonialRequest>, state: web::Data<AppState>| {
                            process_generate_testimonial(req.into_inner(), state)
                        }),
                    )
                    .route(
                        "/update-design",
                        web::post().to(|req: web::Json<UpdateDesignRequest>, state: web::Data<AppState>| {
                            process_update_design(req.into_inner(), state)
                        }),
                    )
                    .route(
                        "/procedural-theme",
                        web::get().to(|query: web::Query<ProceduralQuery>, state: web::Data<AppState>| {
                            process_procedural_theme(query.into_inner(), state)
                        }),
                    )
                    .route(
                        "/derive-accent",
                        web::post().to(|req: web::Json<DeriveAccentRequest>| process_derive_accent(req.into_inner())),
                    )
                    .route("/random-design", web::get().to(process_random_design))
                    .route("/random-theme", web::get().to(process_random_theme))
                    .route("/color-schemes", web::get().to(process_color_schemes))
                    .route("/shape-patterns", web::get().to(process_shape_patterns))
                    .route("/health", web::get().to(process_health)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_generate_testimonial_with_static_writer() {
        let app = app!(state());
        let req = actix_test::TestRequest::post()
            .uri("/generate-testimonial")
            .set_json(serde_json::json!({
                "topic": "coffee",
                "colors": {"bg": "#1A1A1A", "text": "#FFFFFF", "accent": "#FFD700"},
                "shapes": ["Circles"],
                "font_size": 500
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        let data = &body["data"];
        assert!(data["text_content"].as_str().unwrap().starts_with("This coffee exceeded"));
        assert_eq!(data["colors"]["bg"], "#1a1a1a");
        let combined = data["combined_svg"].as_str().unwrap();
        assert!(combined.contains(r##"fill="#1a1a1a""##));
        assert!(combined.contains(r#"font-size="144""#));
        assert!(combined.contains(r#">"This"#));
        assert!(data["saved_path"].is_null());
    }

    #[actix_web::test]
    async fn test_generate_testimonial_requires_topic() {
        let app = app!(state());
        let req = actix_test::TestRequest::post()
            .uri("/generate-testimonial")
            .set_json(serde_json::json!({"topic": "   "}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_update_design_falls_back_on_bad_colors() {
        let app = app!(state());
        let req = actix_test::TestRequest::post()
            .uri("/update-design")
            .set_json(serde_json::json!({
                "text": "Edited text",
                "has_quotes": false,
                "colors": {"bg": "nonsense", "text": "zz", "accent": "#12"}
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["colors"]["bg"], "#ffffff");
        assert_eq!(body["data"]["colors"]["text"], "#000000");
        assert_eq!(body["data"]["colors"]["accent"], "#000000");
        assert_eq!(body["data"]["text_content"], "Edited text");
    }

    #[actix_web::test]
    async fn test_update_design_with_procedural_theme() {
        let app = app!(state());
        let req = actix_test::TestRequest::post()
            .uri("/update-design")
            .set_json(serde_json::json!({
                "text": "Lovely",
                "procedural": {"family": "elegant", "composition": "medium"},
                "placement": "grid"
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["family"], "elegant");
        let shapes = body["data"]["shapes_svg"].as_str().unwrap();
        assert!(shapes.contains("<rect"));
        assert!(shapes.contains("<circle"));
    }

    #[actix_web::test]
    async fn test_update_design_saves_combined_svg() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.output.save_combined = true;
        settings.output.images_dir = dir.path().to_str().unwrap().to_string();

        let app = app!(state_with(settings));
        let req = actix_test::TestRequest::post()
            .uri("/update-design")
            .set_json(serde_json::json!({"text": "Saved"}))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        let saved = body["data"]["saved_path"].as_str().unwrap();
        assert!(saved.ends_with("_edited.svg"));
        let content = std::fs::read_to_string(saved).unwrap();
        assert_eq!(content, body["data"]["combined_svg"].as_str().unwrap());
    }

    #[actix_web::test]
    async fn test_procedural_theme_endpoint() {
        let app = app!(state());

        let req = actix_test::TestRequest::get()
            .uri("/procedural-theme?family=warm&composition=large")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["family"], "warm");
        assert_eq!(body["data"]["composition"], "large");
        assert_eq!(body["data"]["theme"]["shape1_size"], 0.28);
        assert_eq!(body["data"]["theme"]["margin"], 32);

        let req = actix_test::TestRequest::get()
            .uri("/procedural-theme?family=nonexistent-family")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

        // 空の値は省略と同じ扱い
        let req = actix_test::TestRequest::get()
            .uri("/procedural-theme?family=&composition=")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["data"]["family"].is_string());
    }

    #[actix_web::test]
    async fn test_derive_accent_endpoint() {
        let app = app!(state());
        let req = actix_test::TestRequest::post()
            .uri("/derive-accent")
            .set_json(serde_json::json!({"bg": "#FFFFFF", "text": "#EEEEEE"}))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["readable_text"], "#000000");
        assert!((body["data"]["text_contrast"].as_f64().unwrap() - 21.0).abs() < 1e-9);

        // 解釈できない色は背景なら白、文字なら黒として扱う
        let req = actix_test::TestRequest::post()
            .uri("/derive-accent")
            .set_json(serde_json::json!({"bg": "not-a-color", "text": "zz"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["data"]["background"], "#ffffff");
        assert_eq!(body["data"]["text"], "#000000");
        assert_eq!(body["data"]["readable_text"], "#000000");
    }

    #[actix_web::test]
    async fn test_catalogue_endpoints() {
        let app = app!(state());

        let req = actix_test::TestRequest::get().uri("/color-schemes").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["presets"].as_array().unwrap().len(), 8);
        assert_eq!(body["data"]["palette_groups"].as_array().unwrap().len(), 3);

        let req = actix_test::TestRequest::get().uri("/shape-patterns").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let patterns = body["data"].as_array().unwrap();
        assert_eq!(patterns.len(), 6);
        assert!(patterns.iter().all(|p| p["preview_svg"].as_str().unwrap().starts_with("<svg")));

        let req = actix_test::TestRequest::get().uri("/random-design").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["bg"].as_str().unwrap().starts_with('#'));

        let req = actix_test::TestRequest::get().uri("/random-theme").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["accent"].is_string());

        let req = actix_test::TestRequest::get().uri("/health").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["palette_families"], 4);
        assert_eq!(body["data"]["writer"], "static");
    }

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&TestimonialError::FontTooLarge(10, 5));
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let resp = error_response(&TestimonialError::TextGeneration("down".to_string()));
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
