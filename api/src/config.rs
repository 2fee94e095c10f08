//! Runtime configuration.

use clap::Parser;

/// Server configuration, read from flags or environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "atelier-api", about = "Atelier API server")]
pub struct ApiConfig {
    /// Listen address.
    #[arg(long, env = "ATELIER_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// HMAC secret for session-token verification.
    #[arg(long, env = "ATELIER_SESSION_SECRET")]
    pub session_secret: String,

    /// Email that is always treated as an administrator.
    #[arg(long, env = "ATELIER_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Vision-model API key.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    pub model_api_key: String,

    /// Override the vision-model endpoint.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub model_base_url: Option<String>,

    /// Vision model name.
    #[arg(long, env = "ATELIER_MODEL", default_value = "gpt-4o-mini")]
    pub model_name: String,
}

impl ApiConfig {
    /// Minimal configuration for tests.
    pub fn for_tests(session_secret: impl Into<String>) -> Self {
        Self {
            bind: "127.0.0.1:0".into(),
            session_secret: session_secret.into(),
            admin_email: None,
            model_api_key: String::new(),
            model_base_url: None,
            model_name: "gpt-4o-mini".into(),
        }
    }
}
