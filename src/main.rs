mod auth;
mod config;
mod db;
mod errors;
mod server;
mod state;
mod stats;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging (stderr so process managers capture it)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("tradebook server starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Init database
    let db_pool = match db::init_db(&cfg.data_dir) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("database init error: {e}");
            std::process::exit(1);
        }
    };

    let port = cfg.server_port;
    let static_dir = cfg.static_dir.clone();
    let app_state = AppState::new(cfg, db_pool);

    let app = axum::Router::new()
        // Account operations
        .route("/api/register", axum::routing::post(server::accounts::register))
        .route("/api/login", axum::routing::post(server::accounts::login))
        .route("/api/settings/profile", axum::routing::put(server::accounts::update_profile))
        .route("/api/settings/password", axum::routing::put(server::accounts::change_password))
        // Trade lifecycle
        .route(
            "/api/trades",
            axum::routing::get(server::routes::list_trades).post(server::routes::create_trade),
        )
        .route(
            "/api/trades/{id}",
            axum::routing::put(server::routes::update_trade)
                .delete(server::routes::delete_trade),
        )
        // Statistics
        .route("/api/stats/summary", axum::routing::get(server::routes::get_summary))
        .route("/api/stats/weekdays", axum::routing::get(server::routes::get_weekdays))
        .route("/api/stats/series", axum::routing::get(server::routes::get_series))
        // Operational
        .route("/api/counters", axum::routing::get(server::routes::get_counters))
        // Browser client bundle
        .fallback_service(
            tower_http::services::ServeDir::new(&static_dir)
                .fallback(tower_http::services::ServeFile::new(static_dir.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
