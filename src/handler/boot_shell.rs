//! Boot shell endpoint module
//!
//! Serves the UEFI shell image for an HTTP boot option. The User-Agent
//! decides which image: the full shell for UefiHttpBoot firmware, the basic
//! shell for everything else.

use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::error::ServerError;
use crate::handler::router::RequestContext;
use crate::http::{self, mime, CachePolicy};
use crate::store::PacketStore;

const FULL_SHELL: &str = "Shell_Full.efi";
const BASIC_SHELL: &str = "Shell.efi";
const HTTP_BOOT_MARKER: &str = "UefiHttpBoot";

/// Serve the shell image selected by the User-Agent header.
///
/// A missing image answers 200 with a plain-text error message; the
/// firmware surfaces the body to the operator instead of retrying.
pub async fn serve(
    ctx: &RequestContext,
    store: &PacketStore,
) -> Result<Response<Full<Bytes>>, ServerError> {
    let filename = if ctx
        .user_agent
        .as_deref()
        .is_some_and(|ua| ua.contains(HTTP_BOOT_MARKER))
    {
        FULL_SHELL
    } else {
        BASIC_SHELL
    };

    match store.read_static(filename).await {
        Ok(data) => {
            let content_type = mime::get_content_type(
                Path::new(filename).extension().and_then(|e| e.to_str()),
            );
            Ok(http::build_file_response(
                &data,
                content_type,
                CachePolicy::None,
                ctx.is_head,
            ))
        }
        Err(ServerError::ArtifactMissing(_)) => Ok(http::build_plain_text_response(
            &format!("ServerError. Unable to find shell {filename}"),
            ctx.is_head,
        )),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(user_agent: Option<&str>) -> RequestContext {
        RequestContext {
            is_head: false,
            remote_addr: "127.0.0.1".to_string(),
            user_agent: user_agent.map(ToString::to_string),
            content_type: None,
        }
    }

    fn staged_store(dir: &tempfile::TempDir) -> PacketStore {
        let static_dir = dir.path().join("static");
        std::fs::create_dir(&static_dir).unwrap();
        std::fs::write(static_dir.join(FULL_SHELL), b"full shell image").unwrap();
        std::fs::write(static_dir.join(BASIC_SHELL), b"basic shell image").unwrap();
        PacketStore::new(dir.path(), static_dir)
    }

    #[tokio::test]
    async fn test_http_boot_agent_gets_full_shell() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);

        let response = serve(&ctx(Some("UefiHttpBoot/1.0")), &store).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/efi"
        );
        assert_eq!(response.headers().get("Content-Length").unwrap(), "16");
    }

    #[tokio::test]
    async fn test_other_agents_get_basic_shell() {
        let dir = tempfile::tempdir().unwrap();
        let store = staged_store(&dir);

        for user_agent in [Some("curl/8.0"), None] {
            let response = serve(&ctx(user_agent), &store).await.unwrap();
            assert_eq!(response.headers().get("Content-Length").unwrap(), "17");
        }
    }

    #[tokio::test]
    async fn test_missing_image_answers_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        let store = PacketStore::new(dir.path(), dir.path().join("static"));

        let response = serve(&ctx(Some("curl/8.0")), &store).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
