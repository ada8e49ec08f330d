//! File-backed packet store module
//!
//! The filesystem is the data model: a root directory holding one
//! subdirectory per enrolled device plus flat, pre-staged JSON artifacts,
//! and a separate static directory for boot images. The store never creates
//! device directories; the test operator stages them before exercising the
//! server.

mod packet;

pub use packet::RequestType;

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::ServerError;

/// Staged bootstrap request body, written on every bootstrap POST
pub const BOOTSTRAP_REQUEST: &str = "Bootstrap_Request.json";
/// Pre-staged body the bootstrap request is compared against
pub const EXPECTED_REQUEST: &str = "Expected_Request.json";
/// Bootstrap status response when an update is available
pub const BOOTSTRAP_RESPONSE: &str = "Bootstrap_Response.json";
/// Bootstrap status response when no update is needed
pub const BOOTSTRAP_NULL_RESPONSE: &str = "Bootstrap_NULLResponse.json";
/// Staged recovery request body, written on every recovery POST
pub const RECOVERY_REQUEST: &str = "Recovery_Request.json";
/// Recovery status response
pub const RECOVERY_RESPONSE: &str = "Recovery_Response.json";
/// Response served at the redirect target
pub const REDIRECT_RESPONSE: &str = "RedirTest1_Response.json";

/// File-backed store rooted at the configured data directory
#[derive(Debug, Clone)]
pub struct PacketStore {
    root: PathBuf,
    static_dir: PathBuf,
}

impl PacketStore {
    pub fn new(root: impl Into<PathBuf>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            static_dir: static_dir.into(),
        }
    }

    /// Resolve the directory for a machine id.
    ///
    /// Ids that could escape the root are rejected the same way unknown
    /// systems are: the caller cannot distinguish them, and neither could
    /// the original server.
    fn device_dir(&self, machine_id: &str) -> Result<PathBuf, ServerError> {
        if machine_id.is_empty() || machine_id.contains(['/', '\\']) || machine_id.contains("..") {
            return Err(ServerError::UnknownDevice(machine_id.to_string()));
        }

        let dir = self.root.join(machine_id);
        // Device directories must pre-exist; the server never creates them
        if !dir.is_dir() {
            return Err(ServerError::UnknownDevice(machine_id.to_string()));
        }
        Ok(dir)
    }

    /// Store an uploaded result packet for a device, bytes untouched.
    pub async fn write_result(
        &self,
        machine_id: &str,
        request_type: RequestType,
        data: &[u8],
    ) -> Result<(), ServerError> {
        let dir = self.device_dir(machine_id)?;
        fs::write(dir.join(request_type.result_filename()), data).await?;
        Ok(())
    }

    /// Read the staged apply packet for a device.
    pub async fn read_apply(
        &self,
        machine_id: &str,
        request_type: RequestType,
    ) -> Result<Vec<u8>, ServerError> {
        let dir = self.device_dir(machine_id)?;
        let Some(filename) = request_type.apply_filename() else {
            return Err(ServerError::CurrentNotReadable);
        };

        let path = dir.join(filename);
        fs::read(&path).await.map_err(|e| missing_or_io(e, &path))
    }

    /// Write a flat staged artifact under the root directory, verbatim.
    pub async fn write_staged(&self, name: &str, data: &[u8]) -> Result<(), ServerError> {
        fs::write(self.root.join(name), data).await?;
        Ok(())
    }

    /// Read a flat staged artifact from the root directory.
    pub async fn read_staged(&self, name: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.root.join(name);
        fs::read(&path).await.map_err(|e| missing_or_io(e, &path))
    }

    /// Pick the bootstrap status file to serve.
    ///
    /// The NULL response is selected only when a stored bootstrap request
    /// exists and is byte-identical to the staged expected request; any
    /// other combination, including missing files, selects the standard
    /// response.
    pub async fn bootstrap_status_file(&self) -> &'static str {
        let stored = fs::read(self.root.join(BOOTSTRAP_REQUEST)).await.ok();
        let expected = fs::read(self.root.join(EXPECTED_REQUEST)).await.ok();

        match (stored, expected) {
            (Some(stored), Some(expected)) if stored == expected => BOOTSTRAP_NULL_RESPONSE,
            _ => BOOTSTRAP_RESPONSE,
        }
    }

    /// Read a boot image from the static directory.
    pub async fn read_static(&self, filename: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.static_dir.join(filename);
        fs::read(&path).await.map_err(|e| missing_or_io(e, &path))
    }
}

/// Distinguish a missing artifact from other I/O failures
fn missing_or_io(err: std::io::Error, path: &Path) -> ServerError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ServerError::ArtifactMissing(path.display().to_string())
    } else {
        ServerError::Io(err)
    }
}
