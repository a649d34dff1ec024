//! OAuth authorization-code exchange.
//!
//! Trades a short-lived authorization code for an access token at the
//! provider's token endpoint, optionally looks up the authorizing user for
//! the logs, and echoes the caller's `state` back as the site id. A single
//! attempt is made; retry policy belongs to the caller.

mod error;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use flowsmith_shared::{
    FlowsmithError, OAuthCredentials, OAuthExchangeRequest, OAuthSettings, OAuthTokenResult,
    Result,
};

pub use error::OAuthError;
use error::DEFAULT_FAILURE_DESCRIPTION;

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("Flowsmith/", env!("CARGO_PKG_VERSION"));

/// Token type assumed when the provider omits one.
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Longest slice of a non-JSON provider body carried into an error.
const MAX_ERROR_BODY: usize = 512;

// ---------------------------------------------------------------------------
// Provider wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    /// Usually a space-separated string; some providers send an array.
    #[serde(default)]
    scope: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// OAuthExchanger
// ---------------------------------------------------------------------------

/// Stateless exchanger; one instance serves every login.
pub struct OAuthExchanger {
    settings: OAuthSettings,
    client: Client,
}

impl OAuthExchanger {
    /// Create an exchanger from resolved settings.
    pub fn new(settings: OAuthSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| FlowsmithError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    /// Exchange the request's authorization code for an access token.
    ///
    /// Validates the code before the server configuration, so a caller
    /// without a code learns that first.
    #[instrument(skip_all, fields(site_id = ?request.state))]
    pub async fn exchange(
        &self,
        request: &OAuthExchangeRequest,
    ) -> std::result::Result<OAuthTokenResult, OAuthError> {
        let code = request
            .code
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(OAuthError::MissingCode)?;

        let credentials = self
            .settings
            .credentials()
            .map_err(|missing| OAuthError::MissingConfiguration { missing })?;

        let token = self.request_token(code, &credentials).await?;

        if self.settings.fetch_profile {
            self.log_profile(&token.access_token).await;
        }

        info!(
            token_type = %token.token_type,
            scope = %token.scope,
            "authorization code exchanged"
        );

        Ok(OAuthTokenResult {
            site_id: request.state.clone(),
            ..token
        })
    }

    /// POST the form-encoded grant to the token endpoint.
    async fn request_token(
        &self,
        code: &str,
        credentials: &OAuthCredentials,
    ) -> std::result::Result<OAuthTokenResult, OAuthError> {
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.settings.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "token endpoint unreachable");
                OAuthError::transport(format!("{}: {e}", self.settings.token_url))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::transport(format!("failed to read token response: {e}")))?;

        if !status.is_success() {
            let err = provider_failure(status.as_u16(), &body);
            if let OAuthError::TokenExchangeFailed { error, .. } = &err {
                warn!(status = status.as_u16(), %error, "provider rejected authorization code");
            }
            return Err(err);
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            OAuthError::TokenExchangeFailed {
                status: 500,
                error: "invalid_token_response".into(),
                error_description: Some(format!("token response is not JSON: {e}")),
            }
        })?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::TokenExchangeFailed {
                status: 500,
                error: "invalid_token_response".into(),
                error_description: Some("token response has no access_token".into()),
            })?;

        Ok(OAuthTokenResult {
            access_token,
            token_type: token
                .token_type
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            scope: scope_string(token.scope),
            site_id: None,
        })
    }

    /// Best-effort lookup of the authorizing user. Never fails the exchange.
    async fn log_profile(&self, access_token: &str) {
        let response = match self
            .client
            .get(&self.settings.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "profile fetch failed");
                return;
            }
        };

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "profile fetch rejected");
            return;
        }

        match response.json::<serde_json::Value>().await {
            Ok(profile) => {
                let user_id = profile.get("id").map(|v| v.to_string());
                let email = profile
                    .get("email")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                info!(?user_id, ?email, "authorized user profile fetched");
            }
            Err(e) => debug!(error = %e, "profile response was not JSON"),
        }
    }
}

/// Turn a non-2xx provider response into an error, preserving the
/// provider's `error`/`error_description` text.
fn provider_failure(status: u16, body: &str) -> OAuthError {
    let status_out = if (400..600).contains(&status) { status } else { 500 };

    match serde_json::from_str::<ProviderError>(body) {
        Ok(parsed) => OAuthError::TokenExchangeFailed {
            status: status_out,
            error: parsed
                .error
                .unwrap_or_else(|| "token_exchange_failed".to_string()),
            error_description: parsed
                .error_description
                .or(parsed.message)
                .or_else(|| Some(DEFAULT_FAILURE_DESCRIPTION.to_string())),
        },
        Err(_) => {
            let snippet: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            OAuthError::TokenExchangeFailed {
                status: status_out,
                error: "token_exchange_failed".into(),
                error_description: Some(if snippet.is_empty() {
                    DEFAULT_FAILURE_DESCRIPTION.to_string()
                } else {
                    snippet
                }),
            }
        }
    }
}

fn scope_string(scope: Option<serde_json::Value>) -> String {
    match scope {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}
