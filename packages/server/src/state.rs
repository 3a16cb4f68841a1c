use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::HackdayService;
use crate::store::HackdayStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HackdayStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn service(&self) -> HackdayService<'_> {
        HackdayService::new(self.store.as_ref(), &self.config.hackday)
    }
}
