//! scoring-mirror binary entrypoint: polls the scoring system and serves the status surface.

use std::{env, net::SocketAddr};

use anyhow::Context;
use scoring_mirror::{app::App, config::AppConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app = App::from_config(&config).context("building scoring system client")?;
    let tasks = app.spawn_tasks();

    if config.status_server.enabled {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(config.status_server.port);

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        info!(%addr, "starting status server");

        let listener = TcpListener::bind(addr).await.context("binding server")?;
        axum::serve(listener, app.router().into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serving axum")?;
    } else {
        info!("status server disabled");
        shutdown_signal().await;
    }

    for task in tasks {
        task.abort();
    }
    info!("shut down");
    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
