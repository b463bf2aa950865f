//! In-memory stand-ins for the storage, email and object-store seams.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::Principal;
use crate::config::AppConfig;
use crate::database::models::{Role, User};
use crate::database::{Collection, Database, DatabaseError, RecordSource, Relation};
use crate::filter::QueryPlan;
use crate::services::{EmailError, EmailSender, ObjectStore, OutgoingEmail, StorageError};
use crate::state::AppState;

/// Record source over fixed rows. Supports string equality filters and paging only.
#[derive(Debug, Default, Clone)]
pub struct FakeSource {
    rows: HashMap<Collection, Vec<Value>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, collection: Collection, rows: Vec<Value>) -> Self {
        self.rows.entry(collection).or_default().extend(rows);
        self
    }

    fn matching(&self, collection: Collection, plan: &QueryPlan) -> Vec<Value> {
        let rows = self.rows.get(&collection).cloned().unwrap_or_default();
        let Some(filter) = plan.filter.as_object() else {
            return rows;
        };
        rows.into_iter()
            .filter(|row| {
                filter.iter().all(|(field, expected)| match expected {
                    Value::String(expected) => row.get(field).and_then(Value::as_str) == Some(expected.as_str()),
                    _ => true,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn count(&self, collection: Collection, plan: &QueryPlan) -> Result<u64, DatabaseError> {
        Ok(self.matching(collection, plan).len() as u64)
    }

    async fn find(&self, collection: Collection, plan: &QueryPlan) -> Result<Vec<Value>, DatabaseError> {
        Ok(self
            .matching(collection, plan)
            .into_iter()
            .skip(plan.skip as usize)
            .take(plan.limit as usize)
            .collect())
    }

    async fn populate(&self, relation: Relation, records: &mut [Value]) -> Result<(), DatabaseError> {
        let related = self.rows.get(&relation.target()).cloned().unwrap_or_default();
        relation.attach(records, related);
        Ok(())
    }
}

pub fn user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        name: format!("{} user", role),
        email: format!("{}@example.com", Uuid::new_v4().simple()),
        role: role.as_str().to_string(),
        password: String::new(),
        reset_password_token: None,
        reset_password_expire: None,
        created_at: Utc::now(),
    }
}

pub fn principal(role: Role) -> Principal {
    Principal::from(user(role))
}

/// Email sender that records instead of delivering.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        Ok(())
    }
}

/// Email sender whose deliveries always fail.
#[derive(Debug, Default)]
pub struct FailingMailer;

#[async_trait]
impl EmailSender for FailingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::Send("connection refused".to_string()))
    }
}

/// A migrated connection to `DATABASE_URL`, or `None` when it is unset.
pub async fn live_database() -> Option<Database> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").map(|v| v.is_empty()).unwrap_or(true) {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    }
    let config = AppConfig::from_env();
    let db = Database::connect(&config.database).await.expect("connect to DATABASE_URL");
    db.migrate().await.expect("apply migrations");
    Some(db)
}

/// Object store that keeps blobs in a map keyed by URL.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let url = format!("memory://{}", key);
        self.objects
            .lock()
            .map_err(|e| StorageError::Upload(e.to_string()))?
            .insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .map_err(|e| StorageError::Delete(e.to_string()))?
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| StorageError::Unmanaged(url.to_string()))
    }
}

/// State over a lazily connected pool that is never used unless a handler
/// reaches the database. Must be called inside a tokio runtime.
pub fn test_state() -> AppState {
    let config = AppConfig::development();
    let db = Database::connect_lazy(&config.database).expect("lazy pool");
    AppState::new(
        db,
        Arc::new(config),
        Arc::new(RecordingMailer::default()),
        Arc::new(MemoryStore::default()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PageLimits;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::default();
        let url = store.put("reports/a.txt", "text/plain", b"hi".to_vec()).await.unwrap();
        store.delete(&url).await.unwrap();
        assert!(matches!(store.delete(&url).await, Err(StorageError::Unmanaged(_))));
    }

    #[tokio::test]
    async fn fake_source_filters_on_strings() {
        let source = FakeSource::new().with_rows(
            Collection::Incidents,
            vec![serde_json::json!({"status": "resolved"}), serde_json::json!({"status": "pending"})],
        );
        let plan = QueryPlan::from_query_string(Some("status=resolved"), PageLimits::default());
        assert_eq!(source.count(Collection::Incidents, &plan).await.unwrap(), 1);
    }
}
