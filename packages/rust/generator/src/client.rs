//! Chat-completion client that turns a prompt into an HTML + CSS element.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use flowsmith_shared::{
    CompletionSettings, ElementKind, FlowsmithError, GeneratedElement, GenerationRequest, Result,
};

use crate::templates::fallback;

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("Flowsmith/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into a log line.
const MAX_ERROR_BODY: usize = 512;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One message of a chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The JSON object the model is instructed to reply with.
#[derive(Debug, Deserialize)]
struct ElementReply {
    html: Option<String>,
    css: Option<String>,
    #[serde(rename = "elementType")]
    element_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

/// System instruction sent ahead of every prompt.
pub fn build_system_prompt(kind: Option<ElementKind>) -> String {
    let mut prompt = String::from(
        "You are an expert web designer who writes production-ready HTML and CSS \
         snippets for a visual website builder.\n\n\
         Guidelines:\n\
         - Use semantic HTML5 elements and accessible markup.\n\
         - Use modern CSS (flexbox, grid, custom properties) scoped by class names.\n\
         - Do not reference external libraries, fonts, scripts, or images.\n\
         - Keep the snippet self-contained and responsive.\n\
         - Respond with valid JSON only, no Markdown and no commentary, in the shape \
         {\"html\": \"...\", \"css\": \"...\", \"elementType\": \"...\"}.\n",
    );
    if let Some(kind) = kind {
        prompt.push_str(&format!(
            "- The requested element type is \"{kind}\"; set elementType to \"{kind}\".\n"
        ));
    }
    prompt
}

/// The system + user message pair for a request.
pub fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("system", build_system_prompt(request.kind())),
        ChatMessage::new("user", request.prompt()),
    ]
}

// ---------------------------------------------------------------------------
// CompletionClient
// ---------------------------------------------------------------------------

/// Client for the chat-completion endpoint with a template fallback.
pub struct CompletionClient {
    settings: CompletionSettings,
    client: Client,
}

impl CompletionClient {
    /// Create a client from resolved settings.
    pub fn new(settings: CompletionSettings) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| FlowsmithError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    /// Generate an element for `request`.
    ///
    /// Fails only with [`FlowsmithError::Config`] when no API key is set.
    /// Transport and parse failures resolve to [`fallback`].
    #[instrument(skip_all, fields(kind = ?request.kind(), model = %self.settings.model))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedElement> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            FlowsmithError::config(format!(
                "completion API key not found. Set the {} environment variable.",
                self.settings.api_key_env
            ))
        })?;

        match self.request_element(api_key, request).await {
            Ok(element) => {
                info!(kind = %element.kind, "completion produced element");
                Ok(element)
            }
            Err(e) => {
                warn!(error = %e, "completion failed, using template fallback");
                Ok(fallback(request.prompt(), request.resolved_kind()))
            }
        }
    }

    /// One POST to the completion endpoint, parsed into an element.
    async fn request_element(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GeneratedElement> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: build_messages(request),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowsmithError::Transport(format!("{}: {e}", self.settings.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(FlowsmithError::Transport(format!(
                "{}: HTTP {status}: {snippet}",
                self.settings.endpoint
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| FlowsmithError::parse(format!("invalid completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FlowsmithError::parse("completion response has no content"))?;

        debug!(content_len = content.len(), "completion content received");
        parse_element(&content, request.resolved_kind())
    }
}

/// Parse the model's reply into an element.
///
/// The reply must be a JSON object with string `html` and `css`. A missing or
/// unknown `elementType` is replaced by `default_kind`.
fn parse_element(content: &str, default_kind: ElementKind) -> Result<GeneratedElement> {
    let json = strip_code_fence(content);
    let reply: ElementReply = serde_json::from_str(json)
        .map_err(|e| FlowsmithError::parse(format!("completion content is not JSON: {e}")))?;

    let (Some(html), Some(css)) = (reply.html, reply.css) else {
        return Err(FlowsmithError::parse("completion JSON is missing html or css"));
    };

    let kind = reply
        .element_type
        .as_deref()
        .and_then(ElementKind::parse_lenient)
        .unwrap_or(default_kind);

    Ok(GeneratedElement { html, css, kind })
}

/// Unwrap a reply fenced as a Markdown code block.
fn strip_code_fence(content: &str) -> &str {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n(.*?)\n?\s*```\s*$").expect("valid regex")
    });

    match FENCE_RE.captures(content).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => content.trim(),
    }
}
