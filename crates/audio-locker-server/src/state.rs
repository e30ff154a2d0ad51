//! Shared server state.

use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, InternalError};
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use audio_locker_types::ErrorResponse;
use futures_util::future::{ready, Ready};

use crate::auth::Authenticator;
use crate::library::AssetLibrary;

/// Shared application state for Actix handlers.
pub struct AppState {
    pub library: AssetLibrary,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(library: AssetLibrary, auth: Arc<dyn Authenticator>) -> Self {
        Self { library, auth }
    }

    /// `Err` carries the 401 response to return as-is.
    pub(crate) fn require_auth(&self, req: &HttpRequest) -> Result<(), HttpResponse> {
        if self.auth.is_authenticated(req) {
            return Ok(());
        }
        tracing::debug!(path = %req.path(), "unauthenticated request rejected");
        Err(HttpResponse::Unauthorized().json(ErrorResponse {
            error: "authentication required".to_string(),
        }))
    }
}

/// Extractor guarding a handler behind the configured authenticator.
///
/// List it as the first handler argument: extractors are polled in order,
/// so a rejected request never has its body read.
pub struct Authenticated;

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state
                .require_auth(req)
                .map(|()| Authenticated)
                .map_err(|resp| InternalError::from_response("authentication required", resp).into()),
            None => Err(ErrorInternalServerError("application state missing")),
        };
        ready(result)
    }
}
