//! Shared types, error model, and configuration for Flowsmith.
//!
//! This crate is the foundation depended on by all other Flowsmith crates.
//! It provides:
//! - [`FlowsmithError`], the unified error type
//! - Domain types ([`GenerationRequest`], [`GeneratedElement`], [`OAuthTokenResult`], ...)
//! - Configuration ([`AppConfig`], [`CompletionSettings`], [`OAuthSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompletionConfig, CompletionSettings, InsertionConfig, OAuthConfig,
    OAuthCredentials, OAuthSettings, ServerConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{FlowsmithError, Result};
pub use types::{
    ElementKind, ErrorBody, GeneratedElement, GenerationRequest, OAuthExchangeRequest,
    OAuthTokenResult,
};
