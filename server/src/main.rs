use std::net::SocketAddr;

use color_eyre::eyre::WrapErr;
use tracing::{info, warn};

use newsletter_navigator::{
    routes,
    telemetry::{setup_sentry, setup_tracing},
    AppState, Config,
};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    // Initialize Sentry for error tracking
    let _sentry_guard = setup_sentry();

    // Create and run the tokio runtime
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(async { run_application(dotenv.is_ok()).await })
}

async fn run_application(loaded_dotenv: bool) -> color_eyre::Result<()> {
    setup_tracing()?;

    if !loaded_dotenv {
        warn!("No .env file loaded, using the process environment only");
    }

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    let port = config.port;
    let app_state = AppState::new(config)?;

    info!(
        redirect_url = %app_state.config.google.redirect_url,
        cookie_secure = app_state.config.session.cookie_secure,
        payments = app_state.config.stripe.secret_key.is_some(),
        "Configuration loaded"
    );

    run_server(routes::routes(app_state), port).await
}

async fn run_server(app: axum::Router, port: u16) -> color_eyre::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server failed")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
