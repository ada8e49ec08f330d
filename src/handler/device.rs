//! Per-device packet exchange module
//!
//! `PUT` stores an uploaded result packet for a device; `GET` serves the
//! staged apply packet. Only requests carrying the DFCI agent marker are
//! served.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

use crate::error::ServerError;
use crate::handler::router::RequestContext;
use crate::http::{self, CachePolicy};
use crate::store::{PacketStore, RequestType};

const AGENT_MARKER: &str = "DFCI-Agent";

/// Handle a per-device packet request.
///
/// Validation order matches what the client conformance tests probe:
/// agent gate first, then request type, then device directory (checked
/// inside the store), then the method-specific operation.
pub async fn handle(
    ctx: &RequestContext,
    method: &Method,
    machine_id: &str,
    request_type: &str,
    body: &Bytes,
    store: &PacketStore,
) -> Result<Response<Full<Bytes>>, ServerError> {
    if !ctx
        .user_agent
        .as_deref()
        .is_some_and(|ua| ua.contains(AGENT_MARKER))
    {
        return Err(ServerError::AgentRequired);
    }

    let request_type: RequestType = request_type.parse()?;

    if *method == Method::PUT {
        store.write_result(machine_id, request_type, body).await?;
        return Ok(http::build_plain_text_response(
            "Result uploaded",
            ctx.is_head,
        ));
    }

    let data = store.read_apply(machine_id, request_type).await?;
    Ok(http::build_file_response(
        &data,
        "application/octet-stream",
        CachePolicy::MustRevalidate,
        ctx.is_head,
    ))
}
