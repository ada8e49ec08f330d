// Application state module
// Read-only state shared by every request handler

use crate::store::PacketStore;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: PacketStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = PacketStore::new(
            config.storage.root.clone(),
            config.storage.static_dir.clone(),
        );
        Self { config, store }
    }
}
