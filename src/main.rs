use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use badgetrack::api::AppState;
use badgetrack::clock::{Clock, SystemClock};
use badgetrack::config::Config;
use badgetrack::db::init_db;
use badgetrack::docs::ApiDoc;
use badgetrack::engine::SessionEngine;
use badgetrack::routes;
use badgetrack::schedule::Schedule;
use badgetrack::store::mysql::MySqlStore;
use badgetrack::utils::card_filter;
use badgetrack::utils::identity_cache;

use std::sync::Arc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "badgetrack is up"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    // Bad schedule or timezone is fatal here, before anything binds.
    let schedule = Schedule::from_json_file(&config.schedule_path)
        .expect("SCHEDULE_PATH must point to a valid schedule");
    let engine = SessionEngine::new(
        Arc::new(schedule),
        config.timezone,
        config.presence_threshold,
    );

    let pool = init_db(&config.database_url).await;
    let store = MySqlStore::new(pool.clone());
    store
        .ensure_schema()
        .await
        .expect("Failed to initialize database schema");

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = card_filter::warmup_card_filter(&pool_for_filter_warmup, 100).await {
            eprintln!("Failed to warmup card filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm up registered badges in batches of 250
        if let Err(e) = identity_cache::warmup_identity_cache(&pool_for_cache_warmup, 250).await {
            eprintln!("Failed to warmup identity cache: {:?}", e);
        }
    });

    let state = Data::new(AppState {
        store,
        engine,
        clock: Arc::new(SystemClock) as Arc<dyn Clock>,
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .service(index)
            .configure(|cfg| routes::configure::<MySqlStore>(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
