use rootcause::prelude::Report;
use std::process::ExitCode;
use std::sync::Arc;
use teamgate_access::{LoginDance, SessionIndex, TeamMatcher, WebhookDispatcher};
use teamgate_github::{GithubOAuth, http_client};
use teamgate_server::app::router;
use teamgate_server::auth::{AppState, MemorySessionStore, sweep_expired};
use teamgate_server::config::ServerConfig;
use teamgate_server::error::StartupError;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "teamgate stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Report<StartupError>> {
    let config = ServerConfig::from_env().map_err(|e| StartupError::Config {
        details: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    let cookie_key = config.session.cookie_key()?;
    let http = http_client().map_err(|e| StartupError::Github {
        details: e.to_string(),
    })?;
    let oauth = GithubOAuth::new(&config.github, http.clone()).map_err(|e| StartupError::Github {
        details: e.to_string(),
    })?;

    let index = Arc::new(SessionIndex::new());
    let rules = config.access.rules();
    tracing::info!(
        read_write_teams = ?rules.read_write(),
        read_only_teams = ?rules.read_only(),
        api_url = %config.github.api_url(),
        "Access rules loaded"
    );

    let store = Arc::new(MemorySessionStore::new(config.session.session_duration()?));

    // Spawn periodic session cleanup task
    let cleanup_store = Arc::clone(&store);
    let cleanup_index = Arc::clone(&index);
    let cleanup_interval = config.session.cleanup_interval()?;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let count = sweep_expired(&cleanup_store, &cleanup_index);
            if count > 0 {
                tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
            }
        }
    });

    let state = AppState {
        store,
        login: LoginDance::new(
            TeamMatcher::new(rules.clone()),
            Arc::clone(&index),
            config.access.default_team_id(),
        ),
        webhooks: WebhookDispatcher::new(index, rules, config.access.webhook_secret()),
        oauth,
        http,
        api_url: config.github.api_url(),
        cookie_key,
        session_config: config.session,
    };
    let app = router(state);

    let addr = config.listen_addr;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StartupError::Bind {
            addr: addr.clone(),
            details: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            details: e.to_string(),
        })?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
