//! Application entry point for the `aura-dashboard` backend service.
//!
//! Starts tracing, loads `.env` and the environment, starts the reading
//! sources, then serves the `routes` gateway until Ctrl-C. Sources stop when
//! the server does.
//!
//! `AURA_BASE_URL` is required; `FIREBASE_DATABASE_URL` enables the live push
//! feed. See `config.rs` for every variable.
use std::{env, net::SocketAddr};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use aura_dashboard::{config, routes, Dashboard};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    let dashboard = Dashboard::start(cfg)
        .map_err(|e| anyhow::anyhow!("Failed to start dashboard sources: {}", e))?;

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(dashboard.state());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard.shutdown();
    Ok(())
}

// ---

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Install the global `tracing` subscriber. Call once, before any logging.
///
/// `RUST_LOG` wins when set; otherwise `AURA_LOG_LEVEL` picks the level and
/// HTTP client internals are held at `warn`. `AURA_SPAN_EVENTS` selects
/// `full`, `enter_exit` or close-only span events. `FORCE_COLOR` overrides TTY
/// detection for ANSI output.
fn init_tracing() {
    // ---
    let span_events = match env::var("AURA_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let ansi = env::var("FORCE_COLOR")
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or_else(|| std::io::stdout().is_terminal());

    let env_filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => {
            let level = env::var("AURA_LOG_LEVEL")
                .ok()
                .filter(|l| ["trace", "debug", "info", "warn", "error"].contains(&l.as_str()))
                .unwrap_or_else(|| "debug".to_string());
            EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
        }
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(ansi)
        .compact()
        .init();
}
