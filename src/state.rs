use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{Database, PgStore, RecordSource};
use crate::filter::PageLimits;
use crate::services::{EmailSender, ObjectStore};

/// Shared handles injected into every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn EmailSender>,
    pub storage: Arc<dyn ObjectStore>,
    pub records: Arc<dyn RecordSource>,
}

impl AppState {
    pub fn new(
        db: Database,
        config: Arc<AppConfig>,
        mailer: Arc<dyn EmailSender>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        let records: Arc<dyn RecordSource> =
            Arc::new(PgStore::new(db.pool().clone()).with_debug_sql(config.filter.debug_logging));
        Self { db, config, mailer, storage, records }
    }

    /// Replace the record source used by list endpoints.
    pub fn with_records(mut self, records: Arc<dyn RecordSource>) -> Self {
        self.records = records;
        self
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits::from(&self.config.filter)
    }
}
