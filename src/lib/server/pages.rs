use std::{ffi::OsStr, path::Path};

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::header,
    middleware::ErrorHandlerResponse,
    web::{self, Json},
    HttpRequest, HttpResponse,
};
use include_dir::{include_dir, Dir};
use serde::Serialize;
use tracing::*;

use crate::{
    metrics::{Collector, CollectorConfig, Snapshot, SourceFactory},
    server::error::{Error, Result},
};

/// Everything a handler needs, built once at bootstrap and handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: CollectorConfig,
    pub source: SourceFactory,
}

impl AppState {
    pub fn new(config: CollectorConfig) -> Self {
        Self::with_source(config, crate::metrics::collector::sysinfo_factory())
    }

    pub fn with_source(config: CollectorConfig, source: SourceFactory) -> Self {
        Self { config, source }
    }
}

#[derive(Debug, Serialize)]
pub struct Info {
    pub name: String,
    pub version: String,
    pub authors: String,
    pub disk_path: String,
    pub top_processes: usize,
    pub cpu_sample_interval_ms: u64,
}

pub fn new_info(config: &CollectorConfig) -> Info {
    Info {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        authors: env!("CARGO_PKG_AUTHORS").into(),
        disk_path: config.disk_path.display().to_string(),
        top_processes: config.top_processes,
        cpu_sample_interval_ms: config.cpu_sample_interval.as_millis() as u64,
    }
}

static DIST: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

fn load_file(file_name: &str) -> Option<&'static str> {
    DIST.get_file(file_name)
        .and_then(|file| file.contents_utf8())
}

/// Serves the embedded dashboard. Unknown files are a plain 404, there is no
/// client-side routing to fall back to.
pub async fn root(req: HttpRequest) -> Result<HttpResponse> {
    let raw = req.match_info().get("filename").unwrap_or("");
    let filename = if raw.is_empty() { "index.html" } else { raw };

    let Some(content) = load_file(filename) else {
        return Err(Error::NotFound(format!("Page does not exist: {filename:?}")));
    };

    let extension = Path::new(filename)
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("");
    let mime = actix_files::file_extension_to_mime(extension).to_string();

    Ok(HttpResponse::Ok().content_type(mime).body(content))
}

/// Provide information about the running service
pub async fn info(state: web::Data<AppState>) -> Result<Json<Info>> {
    Ok(Json(new_info(&state.config)))
}

/// Sample the host and answer with a fresh snapshot.
/// Always 200: a failed collection answers with the degraded snapshot.
pub async fn metrics(state: web::Data<AppState>) -> Result<HttpResponse> {
    let config = state.config.clone();
    let source = state.source.clone();

    // The CPU sample sleeps, keep it off the worker's event loop
    let snapshot = web::block(move || Collector::new(source(), config).collect())
        .await
        .unwrap_or_else(|error| {
            error!("Metrics collection did not finish. Reason: {error}");
            Snapshot::degraded()
        });

    Ok(HttpResponse::Ok()
        .insert_header(header::CacheControl(vec![header::CacheDirective::NoStore]))
        .json(snapshot))
}

pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    Err(Error::NotFound(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}

/// Replaces the body of any 500 produced below it, so even failures outside
/// our handlers answer with the JSON envelope.
pub fn internal_error<B: MessageBody>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    warn!("Internal error while serving {}", res.request().path());

    let (req, _) = res.into_parts();
    let internal = Error::Internal(String::new());
    let response = actix_web::ResponseError::error_response(&internal);
    let res = ServiceResponse::new(req, response).map_into_right_body();

    Ok(ErrorHandlerResponse::Response(res))
}
