//! HTTP endpoints for element generation and the OAuth code exchange.
//!
//! ```text
//! POST /api/generate-element  - prompt → {html, css, elementType}
//! POST /api/auth/exchange     - {code, state} → {access_token, token_type, scope, site_id}
//! GET  /api/health            - liveness
//! ```
//!
//! Every request is independent; the shared state holds only immutable
//! clients.

mod handlers;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use flowsmith_generator::CompletionClient;
use flowsmith_oauth::OAuthExchanger;
use flowsmith_shared::{
    AppConfig, CompletionSettings, FlowsmithError, OAuthSettings, Result, ServerConfig,
};

pub use handlers::GenerateElementBody;
pub use routes::router;

/// Clients shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<CompletionClient>,
    pub oauth: Arc<OAuthExchanger>,
}

impl AppState {
    pub fn new(completion: CompletionClient, oauth: OAuthExchanger) -> Self {
        Self {
            completion: Arc::new(completion),
            oauth: Arc::new(oauth),
        }
    }

    /// Build both clients from config, resolving secrets from the environment.
    ///
    /// Missing secrets are not fatal here: the affected endpoint reports a
    /// configuration error per request.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let completion = CompletionSettings::from(config);
        if completion.api_key.is_none() {
            warn!(
                env = %completion.api_key_env,
                "completion API key not set; /api/generate-element will fail"
            );
        }

        let oauth = OAuthSettings::from(config);
        if let Err(missing) = oauth.credentials() {
            warn!(?missing, "OAuth credentials not set; /api/auth/exchange will fail");
        }

        Ok(Self::new(
            CompletionClient::new(completion)?,
            OAuthExchanger::new(oauth)?,
        ))
    }
}

/// Bind to `config.bind` and serve until Ctrl-C.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = config.bind.parse().map_err(|e| {
        FlowsmithError::config(format!("invalid bind address '{}': {e}", config.bind))
    })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| FlowsmithError::Transport(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "flowsmith server listening");

    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FlowsmithError::Transport(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
