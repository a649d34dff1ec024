//! Core domain types for element generation and the OAuth handshake.

use serde::{Deserialize, Serialize};

use crate::error::{FlowsmithError, Result};

// ---------------------------------------------------------------------------
// ElementKind
// ---------------------------------------------------------------------------

/// Semantic category of the UI snippet being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Button,
    Header,
    Card,
    Form,
    #[default]
    Generic,
}

impl ElementKind {
    /// Every kind, in template order.
    pub const ALL: [ElementKind; 5] = [
        Self::Button,
        Self::Header,
        Self::Card,
        Self::Form,
        Self::Generic,
    ];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Header => "header",
            Self::Card => "card",
            Self::Form => "form",
            Self::Generic => "generic",
        }
    }

    /// Case-insensitive lookup. Unknown names yield `None`.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest / GeneratedElement
// ---------------------------------------------------------------------------

/// A single user request to generate an element. The prompt is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    kind: Option<ElementKind>,
}

impl GenerationRequest {
    /// Build a request, rejecting blank prompts. The prompt is kept verbatim.
    pub fn new(prompt: impl Into<String>, kind: Option<ElementKind>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(FlowsmithError::validation("Prompt is required"));
        }
        Ok(Self { prompt, kind })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The kind the caller asked for, if any.
    pub fn kind(&self) -> Option<ElementKind> {
        self.kind
    }

    /// The requested kind, or [`ElementKind::Generic`] when none was given.
    pub fn resolved_kind(&self) -> ElementKind {
        self.kind.unwrap_or_default()
    }
}

/// A generated HTML + CSS pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedElement {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(rename = "elementType", default)]
    pub kind: ElementKind,
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

/// Raw body of an OAuth exchange request.
///
/// `code` is optional here so a missing code surfaces as a validation error
/// instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthExchangeRequest {
    #[serde(default)]
    pub code: Option<String>,
    /// Opaque value echoed back as `site_id`.
    #[serde(default)]
    pub state: Option<String>,
}

/// Successful result of an authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokenResult {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    pub site_id: Option<String>,
}

// ---------------------------------------------------------------------------
// ErrorBody
// ---------------------------------------------------------------------------

/// The only error shape emitted at an HTTP or CLI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.error_description = Some(description.into());
        self
    }
}
