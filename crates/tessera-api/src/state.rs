use std::sync::Arc;

use tessera_tools::ImageCache;
use tokio::sync::Mutex;

use crate::config::Config;

/// Shared application state passed to all handlers.
///
/// Provider clients are built per request because the request body may
/// carry its own API key, base URL and model overrides. Only the config
/// and the image cache live for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub image_cache: Arc<Mutex<ImageCache>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cache = ImageCache::new(
            config.cache.capacity,
            std::time::Duration::from_secs(config.cache.ttl_secs),
        );
        Self {
            config: Arc::new(config),
            image_cache: Arc::new(Mutex::new(cache)),
        }
    }
}
