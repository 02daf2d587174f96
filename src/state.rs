use crate::config::AppConfig;
use crate::events::RefreshBus;
use crate::motivation::MotivationGenerator;
use crate::store::JsonFileStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<JsonFileStore>,
    pub refresh: RefreshBus,
    pub motivation: Arc<dyn MotivationGenerator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: JsonFileStore,
        motivation: impl MotivationGenerator + 'static,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            refresh: RefreshBus::new(),
            motivation: Arc::new(motivation),
        }
    }
}
