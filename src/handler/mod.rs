//! Request handler module
//!
//! Route dispatch plus the endpoint families: boot shell delivery,
//! per-device packet exchange, the zero-touch deployment flow, and the
//! redirect test pair.

pub mod boot_shell;
pub mod device;
pub mod redirect;
pub mod router;
pub mod ztd;

// Re-export main entry point
pub use router::handle_request;
