//! Server module
//!
//! TCP accept loop and per-connection serving.

mod connection;
mod listener;

pub use listener::create_listener;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// Run the accept loop until the process is terminated.
pub async fn run(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.get_socket_addr()?;
    let listener = create_listener(addr)?;

    logger::log_server_start(&addr, &state.config);

    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                connection::accept_connection(stream, peer_addr, &state, &active_connections);
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}
