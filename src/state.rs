use crate::config::ReportConfig;
use crate::services::reporting::dataset::DatasetRegistry;
use crate::services::reporting::store::MetricsStore;
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: ReportConfig,
    pub store: Arc<dyn MetricsStore>,
}

impl AppState {
    pub fn datasets(&self) -> &DatasetRegistry {
        &self.config.datasets
    }

    /// Server-local calendar date used when a request omits its date.
    pub fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
