//! Redirect test pair module
//!
//! Exercises the DFCI client's redirect handling: the source endpoint
//! always answers 302 with an absolute HTTPS Location, and the target
//! serves a staged JSON document the client fetches after following it.

use std::ffi::OsStr;
use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::error::ServerError;
use crate::handler::router::RequestContext;
use crate::http::{self, mime, CachePolicy};
use crate::store::{self, PacketStore};

/// Always redirect to the absolute HTTPS target, regardless of the request.
pub fn redirect_source(external_host: &str) -> Response<Full<Bytes>> {
    http::build_redirect_response(&format!("https://{external_host}/RedirTest2"))
}

/// Serve the staged redirect-target document.
pub async fn redirect_target(
    ctx: &RequestContext,
    store: &PacketStore,
) -> Result<Response<Full<Bytes>>, ServerError> {
    let data = store.read_staged(store::REDIRECT_RESPONSE).await?;
    let content_type = mime::get_content_type(
        Path::new(store::REDIRECT_RESPONSE)
            .extension()
            .and_then(OsStr::to_str),
    );
    Ok(http::build_file_response(
        &data,
        content_type,
        CachePolicy::MustRevalidate,
        ctx.is_head,
    ))
}
