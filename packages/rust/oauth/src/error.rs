//! Failure modes of the authorization-code exchange.
//!
//! Unlike generation, none of these are masked: each maps to an HTTP status
//! and an [`ErrorBody`] the caller receives as-is.

use flowsmith_shared::ErrorBody;

/// Description used when the provider rejects a code without explaining why.
pub(crate) const DEFAULT_FAILURE_DESCRIPTION: &str = "Failed to exchange authorization code";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    /// The exchange endpoint was called with a method other than POST.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request carried no (or a blank) authorization code.
    #[error("Authorization code is required")]
    MissingCode,

    /// One or more client credentials are not configured on the server.
    #[error("missing OAuth configuration: {}", .missing.join(", "))]
    MissingConfiguration { missing: Vec<String> },

    /// The provider refused the exchange, or could not be reached.
    #[error("token exchange failed (HTTP {status}): {error}")]
    TokenExchangeFailed {
        status: u16,
        error: String,
        error_description: Option<String>,
    },
}

impl OAuthError {
    /// HTTP status the boundary responds with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::MissingCode => 400,
            Self::MissingConfiguration { .. } => 500,
            Self::TokenExchangeFailed { status, .. } => *status,
        }
    }

    /// Structured body for the boundary.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::MethodNotAllowed | Self::MissingCode => ErrorBody::new(self.to_string()),
            Self::MissingConfiguration { missing } => ErrorBody::new("Server configuration error")
                .with_description(format!(
                    "Missing OAuth configuration: {}",
                    missing.join(", ")
                )),
            Self::TokenExchangeFailed {
                error,
                error_description,
                ..
            } => ErrorBody {
                error: error.clone(),
                error_description: error_description.clone(),
            },
        }
    }

    pub(crate) fn transport(description: impl Into<String>) -> Self {
        Self::TokenExchangeFailed {
            status: 500,
            error: "token_exchange_failed".into(),
            error_description: Some(description.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_code_body() {
        let err = OAuthError::MissingCode;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_body(), ErrorBody::new("Authorization code is required"));
    }

    #[test]
    fn missing_configuration_lists_vars() {
        let err = OAuthError::MissingConfiguration {
            missing: vec!["WEBFLOW_CLIENT_ID".into(), "WEBFLOW_REDIRECT_URI".into()],
        };
        assert_eq!(err.status_code(), 500);
        let body = err.to_body();
        assert_eq!(body.error, "Server configuration error");
        assert_eq!(
            body.error_description.as_deref(),
            Some("Missing OAuth configuration: WEBFLOW_CLIENT_ID, WEBFLOW_REDIRECT_URI")
        );
    }

    #[test]
    fn provider_failure_passes_through() {
        let err = OAuthError::TokenExchangeFailed {
            status: 401,
            error: "invalid_client".into(),
            error_description: None,
        };
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_body(), ErrorBody::new("invalid_client"));
    }
}
