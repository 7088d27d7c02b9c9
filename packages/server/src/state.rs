use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::TaskStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: Arc::new(TaskStore::new()),
            config: Arc::new(config),
        }
    }
}
