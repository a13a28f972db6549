use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }
}
