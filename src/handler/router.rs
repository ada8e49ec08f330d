//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! resolution, body collection, and error-to-response mapping.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, Version};

use crate::config::AppState;
use crate::error::ServerError;
use crate::handler::{boot_shell, device, redirect, ztd};
use crate::http;
use crate::logger;

/// Relative status-polling path returned by the bootstrap POST.
///
/// The `{request-id}` braces are literal: the original deployment tooling
/// registered the placeholder verbatim and the client requests it verbatim.
pub const BOOTSTRAP_STATUS_PATH: &str = "/ztd/unauth/dfci/recovery-bootstrap-status/{request-id}";
/// Status-polling path for the recovery flow, also with literal braces
pub const RECOVERY_STATUS_PATH: &str = "/ztd/unauth/dfci/recovery-packets-status/{request-id}";

const BOOTSTRAP_PATH: &str = "/ztd/noauth/dfci/recovery-bootstrap/";
const RECOVERY_PATH: &str = "/ztd/unauth/dfci/recovery-packets/";
const DEVICE_PREFIX: &str = "/DfciRequest/";

/// Resolved route for a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Greeting,
    BootShell,
    DeviceRequest {
        machine_id: String,
        request_type: String,
    },
    BootstrapRequest,
    BootstrapStatus,
    RecoveryRequest,
    RecoveryStatus,
    RedirectSource,
    RedirectTarget,
}

impl Route {
    /// Methods the route accepts, for the Allow header
    pub fn allowed_methods(&self) -> &'static str {
        match self {
            Self::DeviceRequest { .. } => "GET, HEAD, PUT, OPTIONS",
            Self::BootstrapRequest | Self::RecoveryRequest => "POST, OPTIONS",
            _ => "GET, HEAD, OPTIONS",
        }
    }

    fn accepts(&self, method: &Method) -> bool {
        match self {
            Self::DeviceRequest { .. } => {
                matches!(*method, Method::GET | Method::HEAD | Method::PUT)
            }
            Self::BootstrapRequest | Self::RecoveryRequest => matches!(*method, Method::POST),
            _ => matches!(*method, Method::GET | Method::HEAD),
        }
    }
}

/// Resolve a request path to a route
pub fn resolve_route(path: &str) -> Option<Route> {
    match path {
        "/" => Some(Route::Greeting),
        "/BootShell" => Some(Route::BootShell),
        BOOTSTRAP_PATH => Some(Route::BootstrapRequest),
        BOOTSTRAP_STATUS_PATH => Some(Route::BootstrapStatus),
        RECOVERY_PATH => Some(Route::RecoveryRequest),
        RECOVERY_STATUS_PATH => Some(Route::RecoveryStatus),
        "/RedirTest1" => Some(Route::RedirectSource),
        "/RedirTest2" => Some(Route::RedirectTarget),
        _ => resolve_device_route(path),
    }
}

/// Parse `/DfciRequest/{machineId}/{requestType}` into its segments
fn resolve_device_route(path: &str) -> Option<Route> {
    let rest = path.strip_prefix(DEVICE_PREFIX)?;
    let mut segments = rest.split('/');
    let machine_id = segments.next()?;
    let request_type = segments.next()?;
    if machine_id.is_empty() || request_type.is_empty() || segments.next().is_some() {
        return None;
    }
    Some(Route::DeviceRequest {
        machine_id: machine_id.to_string(),
        request_type: request_type.to_string(),
    })
}

/// Request context shared by the endpoint handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub is_head: bool,
    pub remote_addr: String,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let http_version = version_str(req.version());

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let ctx = RequestContext {
        is_head: method == Method::HEAD,
        remote_addr: peer_addr.ip().to_string(),
        user_agent: header_value(&req, "user-agent"),
        content_type: header_value(&req, "content-type"),
    };

    let response = dispatch(req, &method, &path, &ctx, &state)
        .await
        .unwrap_or_else(|err| err.into_response(ctx.is_head));

    if state.config.logging.access_log {
        let mut entry =
            logger::AccessLogEntry::new(ctx.remote_addr.clone(), method.to_string(), path);
        entry.http_version = http_version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = content_length(&response);
        entry.user_agent = ctx.user_agent.clone();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route the request and run the matching endpoint handler
async fn dispatch(
    req: Request<hyper::body::Incoming>,
    method: &Method,
    path: &str,
    ctx: &RequestContext,
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, ServerError> {
    let Some(route) = resolve_route(path) else {
        return Ok(http::build_404_response());
    };

    if *method == Method::OPTIONS {
        return Ok(http::build_options_response(route.allowed_methods()));
    }
    if !route.accepts(method) {
        logger::log_warning(&format!("Method not allowed: {method} {path}"));
        return Ok(http::build_405_response(route.allowed_methods()));
    }

    if let Some(response) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(response);
    }

    let body = if matches!(*method, Method::PUT | Method::POST) {
        read_body(req).await?
    } else {
        Bytes::new()
    };

    match route {
        Route::Greeting => Ok(greeting(ctx)),
        Route::BootShell => boot_shell::serve(ctx, &state.store).await,
        Route::DeviceRequest {
            machine_id,
            request_type,
        } => device::handle(ctx, method, &machine_id, &request_type, &body, &state.store).await,
        Route::BootstrapRequest => ztd::bootstrap_request(ctx, &body, &state.store).await,
        Route::BootstrapStatus => ztd::bootstrap_status(ctx, &state.store).await,
        Route::RecoveryRequest => {
            ztd::recovery_request(ctx, &body, &state.store, &state.config.http.external_host).await
        }
        Route::RecoveryStatus => ztd::recovery_status(ctx, &state.store).await,
        Route::RedirectSource => Ok(redirect::redirect_source(
            &state.config.http.external_host,
        )),
        Route::RedirectTarget => redirect::redirect_target(ctx, &state.store).await,
    }
}

/// Plain-text greeting used to verify the test server is reachable
fn greeting(ctx: &RequestContext) -> Response<Full<Bytes>> {
    let message = format!(
        "Hello, World! DFCI Test Server V 2.0 serving BootShell and DfciRequest.\r\rRequest from {}",
        ctx.remote_addr
    );
    http::build_plain_text_response(&message, ctx.is_head)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the request body into contiguous bytes
async fn read_body(req: Request<hyper::body::Incoming>) -> Result<Bytes, ServerError> {
    req.into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| ServerError::Io(std::io::Error::other(e)))
}

/// Response body size as advertised by its Content-Length header
fn content_length(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}
