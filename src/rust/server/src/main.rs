//! テスティモニアル画像生成サーバー

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use testimonial_common::{
    api::{
        process_color_schemes, process_derive_accent, process_generate_testimonial,
        process_health, process_procedural_theme, process_random_design, process_random_theme,
        process_shape_patterns, process_update_design, ProceduralQuery,
    },
    api::models::{DeriveAccentRequest, GenerateTestimonialRequest, UpdateDesignRequest},
    AppState, Result, Settings, VERSION,
};

#[cfg(feature = "http-endpoints")]
use testimonial_common::api::upload_font;

#[actix_web::main]
async fn main() -> Result<()> {
    // 設定読み込み（ログレベルを決めるため先に読む）
    let settings = Settings::new()?;

    // ログ初期化（RUST_LOG があれば優先）
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {}", e);
    }

    // ビルド番号を取得
    const BUILD_NUMBER: &str = env!("BUILD_NUMBER");
    info!("testimonial server starting (version {}, build #{})", VERSION, BUILD_NUMBER);

    settings.validate()?;
    info!("Configuration validated successfully");

    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);
    let workers = settings.server.workers;
    let cors_origins = settings.api.cors_origins.clone();
    let max_body_size = settings.api.max_body_size;

    // アプリケーション状態（パレット・プリセット・文面生成元）
    let app_state = web::Data::new(AppState::from_settings(settings)?);

    info!("Starting HTTP server on {}", bind_address);

    // HTTPサーバー構築
    let mut server = HttpServer::new(move || {
        let cors = if cors_origins.iter().any(|origin| origin == "*") {
            Cors::default().allow_any_origin()
        } else {
            cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        };

        let app = App::new()
            .app_data(app_state.clone())
            .app_data(web::JsonConfig::default().limit(max_body_size))
            .wrap(middleware::Logger::default())
            .wrap(
                cors.allow_any_method()
                    .allow_any_header()
                    .max_age(3600)
            )
            // ヘルスチェック
            .route("/health", web::get().to(process_health))

            // 描画
            .route("/generate-testimonial", web::post().to(
                |req: web::Json<GenerateTestimonialRequest>, state: web::Data<AppState>|
                process_generate_testimonial(req.into_inner(), state)
            ))
            .route("/update-design", web::post().to(
                |req: web::Json<UpdateDesignRequest>, state: web::Data<AppState>|
                process_update_design(req.into_inner(), state)
            ))

            // テーマ・カタログ
            .route("/color-schemes", web::get().to(process_color_schemes))
            .route("/shape-patterns", web::get().to(process_shape_patterns))
            .route("/random-design", web::get().to(process_random_design))
            .route("/random-theme", web::get().to(process_random_theme))
            .route("/procedural-theme", web::get().to(
                |query: web::Query<ProceduralQuery>, state: web::Data<AppState>|
                process_procedural_theme(query.into_inner(), state)
            ))
            .route("/derive-accent", web::post().to(
                |req: web::Json<DeriveAccentRequest>|
                process_derive_accent(req.into_inner())
            ));

        // フォントアップロード
        #[cfg(feature = "http-endpoints")]
        let app = app.route("/upload-font", web::post().to(
            |payload: actix_multipart::Multipart, state: web::Data<AppState>|
            upload_font(payload, state)
        ));

        app
    });

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    let server = server.bind(&bind_address)?.run();
    info!("Server running at http://{}", bind_address);

    // サーバーをグレースフルシャットダウンで実行
    let server_handle = server.handle();

    // シャットダウンハンドラー
    let shutdown_task = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
        info!("Server stopped");
    };

    // サーバーとシャットダウンタスクを並行実行
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_task => {
            info!("Shutdown completed");
        }
    }

    Ok(())
}
