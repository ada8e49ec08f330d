//! HTTP response building module
//!
//! Provides builders for the response shapes this server produces, decoupled
//! from the endpoint handlers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::http::cache::CachePolicy;
use crate::logger;

/// Build a 200 plain-text response
pub fn build_plain_text_response(message: &str, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = message.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(message.to_owned())
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a 200 response carrying a stored artifact
pub fn build_file_response(
    data: &[u8],
    content_type: &str,
    policy: CachePolicy,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(data.to_owned())
    };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length);

    if let Some(value) = policy.header_value() {
        builder = builder.header("Cache-Control", value).header("Pragma", value);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build a 202 Accepted response pointing at a status-polling location
pub fn build_accepted_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(202)
        .header("Location", location)
        .header("Content-Type", "application/json")
        .header("Content-Length", 2)
        .body(Full::new(Bytes::from_static(b"{}")))
        .unwrap_or_else(|e| {
            log_build_error("202", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(302)
        .header("Location", target)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Redirecting...")))
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            Response::new(Full::new(Bytes::from("Redirecting...")))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build 406 Not Acceptable response (non-JSON body on a ZTD endpoint)
pub fn build_406_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(406)
        .header("Content-Type", "application/json")
        .header("Content-Length", 2)
        .body(Full::new(Bytes::from_static(b"{}")))
        .unwrap_or_else(|e| {
            log_build_error("406", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", allow)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 503 Service Unavailable response.
///
/// An empty message produces an empty body; the agent-gate rejection
/// depends on that shape.
pub fn build_503_response(message: &str, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = message.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(message.to_owned())
    };

    Response::builder()
        .status(503)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("503", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_response() {
        let response = build_plain_text_response("Result uploaded", false);
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers().get("Content-Length").unwrap(), "15");
    }

    #[test]
    fn test_head_empties_body_but_keeps_length() {
        let response = build_plain_text_response("Result uploaded", true);
        assert_eq!(response.headers().get("Content-Length").unwrap(), "15");
    }

    #[test]
    fn test_file_response_with_must_revalidate() {
        let response = build_file_response(
            b"payload",
            "application/octet-stream",
            CachePolicy::MustRevalidate,
            false,
        );
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "must-revalidate"
        );
        assert_eq!(response.headers().get("Pragma").unwrap(), "must-revalidate");
    }

    #[test]
    fn test_file_response_without_cache_headers() {
        let response = build_file_response(b"image", "application/efi", CachePolicy::None, false);
        assert!(response.headers().get("Cache-Control").is_none());
        assert!(response.headers().get("Pragma").is_none());
    }

    #[test]
    fn test_accepted_response_carries_location() {
        let response = build_accepted_response("/ztd/unauth/dfci/recovery-bootstrap-status/{request-id}");
        assert_eq!(response.status(), 202);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "/ztd/unauth/dfci/recovery-bootstrap-status/{request-id}"
        );
    }

    #[test]
    fn test_redirect_response() {
        let response = build_redirect_response("https://host.example/RedirTest2");
        assert_eq!(response.status(), 302);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "https://host.example/RedirTest2"
        );
    }

    #[test]
    fn test_405_carries_allow_header() {
        let response = build_405_response("POST, OPTIONS");
        assert_eq!(response.status(), 405);
        assert_eq!(response.headers().get("Allow").unwrap(), "POST, OPTIONS");
    }

    #[test]
    fn test_empty_503_has_empty_body() {
        let response = build_503_response("", false);
        assert_eq!(response.status(), 503);
        assert_eq!(response.headers().get("Content-Length").unwrap(), "0");
    }
}
