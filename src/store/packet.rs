//! Packet type module
//!
//! The fixed request-type enumeration and its on-disk file naming rules.

use std::fmt;
use std::str::FromStr;

use crate::error::ServerError;

/// Request types accepted by the per-device packet endpoint.
///
/// Each type selects a filename inside the device directory; nothing else
/// about the request is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Identity,
    Identity2,
    Permissions,
    Permissions2,
    Settings,
    Settings2,
    Current,
}

impl RequestType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Identity2 => "Identity2",
            Self::Permissions => "Permissions",
            Self::Permissions2 => "Permissions2",
            Self::Settings => "Settings",
            Self::Settings2 => "Settings2",
            Self::Current => "Current",
        }
    }

    /// Filename for an uploaded result packet.
    ///
    /// Current settings are an XML document; every other result is a binary
    /// packet.
    pub fn result_filename(self) -> String {
        match self {
            Self::Current => format!("Dfci_Result_{self}.xml"),
            _ => format!("Dfci_Result_{self}.bin"),
        }
    }

    /// Filename for the staged apply packet.
    ///
    /// Current settings can only be uploaded, never requested, so they have
    /// no apply counterpart.
    pub fn apply_filename(self) -> Option<String> {
        match self {
            Self::Current => None,
            _ => Some(format!("Dfci_Apply_{self}.bin")),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Identity" => Ok(Self::Identity),
            "Identity2" => Ok(Self::Identity2),
            "Permissions" => Ok(Self::Permissions),
            "Permissions2" => Ok(Self::Permissions2),
            "Settings" => Ok(Self::Settings),
            "Settings2" => Ok(Self::Settings2),
            "Current" => Ok(Self::Current),
            _ => Err(ServerError::InvalidRequestType(s.to_string())),
        }
    }
}
