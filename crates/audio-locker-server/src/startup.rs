//! Actix server startup + app wiring.
//!
//! Builds the shared state, routes, middleware, and OpenAPI endpoints.

use std::path::PathBuf;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_files::Files;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::header;
use actix_web::{App, Error, HttpResponse, HttpServer, web};
use anyhow::{Context as _, Result};
use audio_locker_types::ErrorResponse;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::auth::authenticator_from_config;
use crate::config;
use crate::library::AssetLibrary;
use crate::openapi;
use crate::state::AppState;

/// Slack on top of the base64-inflated cover size for the JSON body limit.
const JSON_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build server state and start the Actix HTTP server.
pub(crate) async fn run(args: crate::Args) -> Result<()> {
    let cfg = load_config(args.config.as_ref())?;
    let bind = resolve_bind(args.bind, &cfg)?;
    let storage_dir = resolve_storage_dir(args.storage_dir, &cfg)?;
    std::fs::create_dir_all(&storage_dir)
        .with_context(|| format!("create storage dir {:?}", storage_dir))?;
    let static_dir = config::static_dir_from_config(&cfg);
    let settings = config::locker_settings_from_config(&cfg, storage_dir.clone());
    tracing::info!(
        version = crate::VERSION,
        bind = %bind,
        storage_dir = %storage_dir.display(),
        max_upload_bytes = settings.max_upload_bytes,
        upload_extensions = ?settings.upload_extensions,
        "starting audio-locker-server"
    );
    match static_dir.as_ref() {
        Some(dir) if dir.is_dir() => {
            tracing::info!(path = %dir.display(), "static assets enabled");
        }
        Some(dir) => {
            tracing::warn!(path = %dir.display(), "static_dir not found; static assets disabled");
        }
        None => tracing::info!("static assets disabled (static_dir not set)"),
    }
    let static_dir = static_dir.filter(|dir| dir.is_dir());

    let json_limit = settings.max_upload_bytes / 3 * 4 + JSON_OVERHEAD_BYTES;
    let cors_origins = cfg.cors_origins.clone().unwrap_or_default();
    let state = web::Data::new(AppState::new(
        AssetLibrary::new(&settings),
        authenticator_from_config(&cfg),
    ));

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "DELETE", "HEAD"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        let mut app = App::new()
            .app_data(state.clone())
            .app_data(json_config(json_limit))
            .wrap(cors)
            .wrap(FilteredLogger)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .service(api::health::health)
            .service(api::tracks_list)
            .service(api::tracks_get)
            .service(api::tracks_metadata_update)
            .service(api::tracks_delete)
            .service(api::upload_track)
            .service(api::upload_batch)
            .service(api::serve_upload);

        if let Some(dir) = static_dir.clone() {
            app = app.service(Files::new("/static", dir));
        }

        app
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

/// JSON extractor config that reports body errors as `{"error": ...}`.
fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let status = match &err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    actix_web::http::StatusCode::PAYLOAD_TOO_LARGE
                }
                _ => actix_web::http::StatusCode::BAD_REQUEST,
            };
            let body = ErrorResponse {
                error: err.to_string(),
            };
            InternalError::from_response(err, HttpResponse::build(status).json(body)).into()
        })
}

/// Return true when the request path should be logged.
fn should_log_path(path: &str) -> bool {
    !(path.starts_with("/uploads/") || path.starts_with("/static/") || path.starts_with("/swagger-ui/"))
}

/// Actix middleware that filters noisy paths from logging.
struct FilteredLogger;

impl<S, B> actix_web::dev::Transform<S, ServiceRequest> for FilteredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = FilteredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(FilteredLoggerMiddleware { service })
    }
}

/// Service wrapper that applies the logging filter.
struct FilteredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for FilteredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let should_log = should_log_path(&path);
        let method = req.method().clone();
        let peer = req.connection_info().realip_remote_addr().unwrap_or("-").to_string();
        let start = std::time::Instant::now();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            if should_log {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = %res.status().as_u16(),
                    peer = %peer,
                    elapsed_ms = %start.elapsed().as_millis(),
                    "http request"
                );
            }
            Ok(res)
        })
    }
}

/// Load server config from `--config`, then `config.toml` next to the binary,
/// then built-in defaults.
fn load_config(path: Option<&PathBuf>) -> Result<config::ServerConfig> {
    if let Some(path) = path {
        return config::ServerConfig::load(path);
    }
    let auto_path = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join("config.toml")));
    match auto_path {
        Some(path) if path.exists() => {
            tracing::info!(path = %path.display(), "using config next to executable");
            config::ServerConfig::load(&path)
        }
        _ => {
            tracing::info!("no config file found; using defaults");
            Ok(config::ServerConfig::default())
        }
    }
}

/// Resolve the final bind address from args + config.
fn resolve_bind(
    bind: Option<std::net::SocketAddr>,
    cfg: &config::ServerConfig,
) -> Result<std::net::SocketAddr> {
    match bind {
        Some(addr) => Ok(addr),
        None => config::bind_from_config(cfg),
    }
}

/// Resolve the storage directory from args + config.
fn resolve_storage_dir(dir: Option<PathBuf>, cfg: &config::ServerConfig) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => config::storage_dir_from_config(cfg),
    }
}
