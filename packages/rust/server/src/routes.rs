//! Route table and middleware.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use flowsmith_shared::ServerConfig;

use crate::AppState;
use crate::handlers::{auth_exchange, generate_element, health, method_not_allowed};

/// Build the router. Non-POST requests to the API endpoints get a 405 with
/// a structured body.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route(
            "/api/generate-element",
            post(generate_element).fallback(method_not_allowed),
        )
        .route(
            "/api/auth/exchange",
            post(auth_exchange).fallback(method_not_allowed),
        )
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use flowsmith_generator::{CompletionClient, fallback};
    use flowsmith_oauth::OAuthExchanger;
    use flowsmith_shared::{CompletionSettings, ElementKind, GeneratedElement, OAuthSettings};

    fn completion_settings(server: &MockServer, api_key: Option<&str>) -> CompletionSettings {
        CompletionSettings {
            api_key: api_key.map(String::from),
            api_key_env: "OPENAI_API_KEY".into(),
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            model: "gpt-4o-mini".into(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: None,
        }
    }

    fn oauth_settings(server: &MockServer) -> OAuthSettings {
        OAuthSettings {
            client_id: Some("client-1".into()),
            client_secret: Some("secret-1".into()),
            redirect_uri: Some("https://app.example.com/callback".into()),
            env_names: [
                "WEBFLOW_CLIENT_ID".into(),
                "WEBFLOW_CLIENT_SECRET".into(),
                "WEBFLOW_REDIRECT_URI".into(),
            ],
            token_url: format!("{}/oauth/access_token", server.uri()),
            profile_url: format!("{}/v2/token/authorized_by", server.uri()),
            fetch_profile: false,
            timeout_secs: 5,
        }
    }

    fn app(server: &MockServer, api_key: Option<&str>) -> Router {
        let state = AppState::new(
            CompletionClient::new(completion_settings(server, api_key)).unwrap(),
            OAuthExchanger::new(oauth_settings(server)).unwrap(),
        );
        router(state, &ServerConfig::default())
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn generate_falls_back_with_200_on_provider_outage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let prompt = r#"Create a button that says "Go""#;
        let body = serde_json::json!({ "prompt": prompt, "elementType": "button" }).to_string();
        let (status, json) = send(app(&server, Some("k")), "POST", "/api/generate-element", &body).await;

        assert_eq!(status, StatusCode::OK);
        let element: GeneratedElement = serde_json::from_value(json).unwrap();
        assert_eq!(element, fallback(prompt, ElementKind::Button));
        assert!(element.html.contains("Go"));
    }

    #[tokio::test]
    async fn generate_requires_prompt() {
        let server = MockServer::start().await;
        let (status, json) =
            send(app(&server, Some("k")), "POST", "/api/generate-element", r#"{"elementType":"card"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Prompt is required");
    }

    #[tokio::test]
    async fn generate_without_key_is_a_server_error() {
        let server = MockServer::start().await;
        let (status, json) =
            send(app(&server, None), "POST", "/api/generate-element", r#"{"prompt":"a card"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Server configuration error");
        assert!(json["error_description"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn wrong_method_gets_405_body() {
        let server = MockServer::start().await;
        let (status, json) = send(app(&server, Some("k")), "GET", "/api/generate-element", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["error"], "Method not allowed");

        let (status, _) = send(app(&server, Some("k")), "PUT", "/api/auth/exchange", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn exchange_requires_code() {
        let server = MockServer::start().await;
        let (status, json) =
            send(app(&server, None), "POST", "/api/auth/exchange", r#"{"state":"site42"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({ "error": "Authorization code is required" }));
    }

    #[tokio::test]
    async fn exchange_returns_token_and_site_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok123",
                "token_type": "Bearer",
                "scope": "read"
            })))
            .mount(&server)
            .await;

        let (status, json) = send(
            app(&server, None),
            "POST",
            "/api/auth/exchange",
            r#"{"code":"abc","state":"site42"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({
                "access_token": "tok123",
                "token_type": "Bearer",
                "scope": "read",
                "site_id": "site42"
            })
        );
    }

    #[tokio::test]
    async fn exchange_passes_provider_error_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;

        let (status, json) =
            send(app(&server, None), "POST", "/api/auth/exchange", r#"{"code":"stale"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_grant");
        assert!(json["error_description"].is_string());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let server = MockServer::start().await;
        let (status, json) = send(app(&server, None), "GET", "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}
