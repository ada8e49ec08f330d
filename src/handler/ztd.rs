//! Zero-touch deployment flow module
//!
//! Simulates the InTune recovery bootstrap: async POSTs are answered 202
//! with a status-polling Location, and status GETs are served from staged
//! files. The bootstrap status compares the stored request against a staged
//! expected body to decide between "update available" and "no update
//! needed".

use std::ffi::OsStr;
use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::error::ServerError;
use crate::handler::router::{RequestContext, BOOTSTRAP_STATUS_PATH, RECOVERY_STATUS_PATH};
use crate::http::{self, mime, CachePolicy};
use crate::store::{self, PacketStore};

/// Store the bootstrap request body and point the client at the
/// status-polling endpoint (relative Location).
pub async fn bootstrap_request(
    ctx: &RequestContext,
    body: &Bytes,
    store: &PacketStore,
) -> Result<Response<Full<Bytes>>, ServerError> {
    require_json(ctx)?;
    store.write_staged(store::BOOTSTRAP_REQUEST, body).await?;
    Ok(http::build_accepted_response(BOOTSTRAP_STATUS_PATH))
}

/// Serve the bootstrap status document selected by the request comparison.
pub async fn bootstrap_status(
    ctx: &RequestContext,
    store: &PacketStore,
) -> Result<Response<Full<Bytes>>, ServerError> {
    let name = store.bootstrap_status_file().await;
    let data = store.read_staged(name).await?;
    Ok(staged_response(&data, name, ctx.is_head))
}

/// Store the recovery request body and point the client at the
/// status-polling endpoint (absolute HTTPS Location).
pub async fn recovery_request(
    ctx: &RequestContext,
    body: &Bytes,
    store: &PacketStore,
    external_host: &str,
) -> Result<Response<Full<Bytes>>, ServerError> {
    require_json(ctx)?;
    store.write_staged(store::RECOVERY_REQUEST, body).await?;
    let location = format!("https://{external_host}{RECOVERY_STATUS_PATH}");
    Ok(http::build_accepted_response(&location))
}

/// Serve the staged recovery status document.
pub async fn recovery_status(
    ctx: &RequestContext,
    store: &PacketStore,
) -> Result<Response<Full<Bytes>>, ServerError> {
    let data = store.read_staged(store::RECOVERY_RESPONSE).await?;
    Ok(staged_response(&data, store::RECOVERY_RESPONSE, ctx.is_head))
}

/// ZTD endpoints accept only JSON bodies; parameters after the media type
/// (charset and friends) are ignored.
fn require_json(ctx: &RequestContext) -> Result<(), ServerError> {
    let content_type = ctx.content_type.as_deref().unwrap_or("");
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    if media_type.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(ServerError::UnsupportedMediaType(content_type.to_string()))
    }
}

/// Build a must-revalidate response for a staged artifact
fn staged_response(data: &[u8], name: &str, is_head: bool) -> Response<Full<Bytes>> {
    let content_type =
        mime::get_content_type(Path::new(name).extension().and_then(OsStr::to_str));
    http::build_file_response(data, content_type, CachePolicy::MustRevalidate, is_head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_ctx() -> RequestContext {
        RequestContext {
            is_head: false,
            remote_addr: "127.0.0.1".to_string(),
            user_agent: Some("DFCI-Agent/2.0".to_string()),
            content_type: Some("application/json".to_string()),
        }
    }

    fn staged_store(dir: &tempfile::TempDir) -> PacketStore {
        PacketStore::new(dir.path(), dir.path().join("static"))
    }

    #[tokio::test]
    async fn test_bootstrap_request_stores_body_and_points_at_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);

        let response = bootstrap_request(
            &json_ctx(),
            &Bytes::from_static(br#"{"serial":"1234"}"#),
            &store,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 202);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "/ztd/unauth/dfci/recovery-bootstrap-status/{request-id}"
        );

        let written = std::fs::read(dir.path().join("Bootstrap_Request.json")).unwrap();
        assert_eq!(written, br#"{"serial":"1234"}"#);
    }

    #[tokio::test]
    async fn test_non_json_body_is_not_acceptable() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);
        let mut ctx = json_ctx();
        ctx.content_type = Some("text/xml".to_string());

        let err = bootstrap_request(&ctx, &Bytes::from_static(b"<xml/>"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::UnsupportedMediaType(_)));

        ctx.content_type = None;
        let err = recovery_request(&ctx, &Bytes::new(), &store, "host.example")
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_json_with_charset_parameter_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);
        let mut ctx = json_ctx();
        ctx.content_type = Some("application/json; charset=utf-8".to_string());

        let response = bootstrap_request(&ctx, &Bytes::from_static(b"{}"), &store)
            .await
            .unwrap();
        assert_eq!(response.status(), 202);
    }

    #[tokio::test]
    async fn test_bootstrap_status_selects_null_response_on_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);
        store
            .write_staged(store::EXPECTED_REQUEST, b"{\"a\":1}")
            .await
            .unwrap();
        store
            .write_staged(store::BOOTSTRAP_RESPONSE, b"{\"update\":\"packets\"}")
            .await
            .unwrap();
        store
            .write_staged(store::BOOTSTRAP_NULL_RESPONSE, b"{}")
            .await
            .unwrap();

        // Stored request differs: the standard response is served
        bootstrap_request(&json_ctx(), &Bytes::from_static(b"{\"a\":2}"), &store)
            .await
            .unwrap();
        let response = bootstrap_status(&json_ctx(), &store).await.unwrap();
        assert_eq!(response.headers().get("Content-Length").unwrap(), "20");

        // Stored request matches: the NULL response is served
        bootstrap_request(&json_ctx(), &Bytes::from_static(b"{\"a\":1}"), &store)
            .await
            .unwrap();
        let response = bootstrap_status(&json_ctx(), &store).await.unwrap();
        assert_eq!(response.headers().get("Content-Length").unwrap(), "2");
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_recovery_request_returns_absolute_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);

        let response = recovery_request(
            &json_ctx(),
            &Bytes::from_static(b"{}"),
            &store,
            "mikeytbds3.eastus.cloudapp.azure.com",
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 202);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "https://mikeytbds3.eastus.cloudapp.azure.com/ztd/unauth/dfci/recovery-packets-status/{request-id}"
        );
        assert!(dir.path().join("Recovery_Request.json").exists());
    }

    #[tokio::test]
    async fn test_recovery_status_serves_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);
        store
            .write_staged(store::RECOVERY_RESPONSE, b"{\"settings\":[]}")
            .await
            .unwrap();

        let response = recovery_status(&json_ctx(), &store).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_missing_staged_status_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);

        let err = recovery_status(&json_ctx(), &store).await.unwrap_err();
        assert!(matches!(err, ServerError::ArtifactMissing(_)));
    }
}
