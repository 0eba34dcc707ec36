use portfolio_api::config::config;
use portfolio_api::database::pool;
use portfolio_api::state::AppState;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_api=info,tower_http=info".into()),
        )
        .init();

    let cfg = config();
    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    let db_pool = match pool::connect(&cfg.database.url, cfg.database.max_connections).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let app = portfolio_api::app(AppState { pool: db_pool });

    let addr = format!("0.0.0.0:{}", cfg.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
