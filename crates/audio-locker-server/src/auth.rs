//! Request authentication for gated routes.

use std::sync::Arc;

use actix_web::HttpRequest;
use actix_web::http::header;

use crate::config::ServerConfig;

/// Decides whether a request may use the gated API routes.
pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self, req: &HttpRequest) -> bool;
}

/// Open access.
#[derive(Debug, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn is_authenticated(&self, _req: &HttpRequest) -> bool {
        true
    }
}

/// Static bearer token compared against the `Authorization` header.
#[derive(Debug)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authenticator for BearerToken {
    fn is_authenticated(&self, req: &HttpRequest) -> bool {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|presented| presented.trim() == self.token)
    }
}

/// Pick the authenticator configured for this server.
pub fn authenticator_from_config(cfg: &ServerConfig) -> Arc<dyn Authenticator> {
    match cfg
        .api_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        Some(token) => Arc::new(BearerToken::new(token)),
        None => {
            tracing::warn!("api_token not set; API routes are open");
            Arc::new(AllowAll)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_token_checks_header() {
        let auth = BearerToken::new("s3cret");
        let ok = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer s3cret"))
            .to_http_request();
        let wrong = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer nope"))
            .to_http_request();
        let basic = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic s3cret"))
            .to_http_request();
        let missing = TestRequest::default().to_http_request();

        assert!(auth.is_authenticated(&ok));
        assert!(!auth.is_authenticated(&wrong));
        assert!(!auth.is_authenticated(&basic));
        assert!(!auth.is_authenticated(&missing));
    }

    #[test]
    fn blank_token_means_open_access() {
        let cfg = ServerConfig {
            api_token: Some("  ".to_string()),
            ..ServerConfig::default()
        };
        let auth = authenticator_from_config(&cfg);
        assert!(auth.is_authenticated(&TestRequest::default().to_http_request()));
    }
}
