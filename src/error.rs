//! Server error module
//!
//! Explicit error kinds with a single error-to-response mapping. The DFCI
//! client conformance tests depend on the exact status and body of every
//! rejection, including the plain-text error messages delivered with a
//! 200 status, so the mapping lives in one place.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use thiserror::Error;

use crate::http;

/// Errors raised while processing a request
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request-type path segment is not one of the fixed enumeration
    #[error("invalid request type '{0}'")]
    InvalidRequestType(String),

    /// No per-device directory exists for the machine id
    #[error("unknown system '{0}'")]
    UnknownDevice(String),

    /// Current settings packets are upload-only
    #[error("current settings cannot be requested")]
    CurrentNotReadable,

    /// The per-device endpoint only serves the DFCI agent
    #[error("request did not carry the DFCI-Agent marker")]
    AgentRequired,

    /// ZTD endpoints accept only application/json bodies
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    /// A pre-staged artifact that should exist could not be read
    #[error("artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Map the error to its HTTP response.
    ///
    /// Domain rejections answer with a 200 plain-text message (the DFCI
    /// client reads the body, not the status). The agent gate answers 503
    /// with an empty body, and missing artifacts or I/O failures answer
    /// 503 with a plain-text diagnostic.
    pub fn into_response(self, is_head: bool) -> Response<Full<Bytes>> {
        match self {
            Self::InvalidRequestType(_) => {
                http::build_plain_text_response("DFCI Error. Invalid request type", is_head)
            }
            Self::UnknownDevice(_) => {
                http::build_plain_text_response("DFCI Error. Unknown system", is_head)
            }
            Self::CurrentNotReadable => {
                http::build_plain_text_response("DFCI Error. Current cannot be requested", is_head)
            }
            Self::AgentRequired => http::build_503_response("", is_head),
            Self::UnsupportedMediaType(_) => http::build_406_response(),
            Self::ArtifactMissing(_) | Self::Io(_) => {
                http::build_503_response(&format!("ServerError. {self}"), is_head)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_bytes(response: &Response<Full<Bytes>>) -> usize {
        response
            .headers()
            .get("Content-Length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn test_domain_errors_answer_200() {
        let cases = [
            ServerError::InvalidRequestType("Bogus".to_string()),
            ServerError::UnknownDevice("NoSuchBox".to_string()),
            ServerError::CurrentNotReadable,
        ];
        for error in cases {
            let response = error.into_response(false);
            assert_eq!(response.status(), 200);
            assert_eq!(
                response.headers().get("Content-Type").unwrap(),
                "text/plain; charset=utf-8"
            );
        }
    }

    #[test]
    fn test_agent_gate_is_empty_503() {
        let response = ServerError::AgentRequired.into_response(false);
        assert_eq!(response.status(), 503);
        assert_eq!(body_bytes(&response), 0);
    }

    #[test]
    fn test_unsupported_media_type_is_406() {
        let response =
            ServerError::UnsupportedMediaType("text/xml".to_string()).into_response(false);
        assert_eq!(response.status(), 406);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_missing_artifact_is_503_with_diagnostic() {
        let response =
            ServerError::ArtifactMissing("Recovery_Response.json".to_string()).into_response(false);
        assert_eq!(response.status(), 503);
        assert!(body_bytes(&response) > 0);
    }
}
