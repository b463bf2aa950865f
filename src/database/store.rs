use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::collection::{json_object_sql, Collection};
use super::manager::DatabaseError;
use super::relation::Relation;
use crate::filter::{Filter, QueryPlan, SqlResult};

/// Read access used by list endpoints.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Number of records matching the plan's filter, ignoring the page window.
    async fn count(&self, collection: Collection, plan: &QueryPlan) -> Result<u64, DatabaseError>;

    /// The filtered, projected, sorted page of records.
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> Result<Vec<Value>, DatabaseError>;

    /// Resolve `relation` one hop and attach it to each record.
    async fn populate(&self, relation: Relation, records: &mut [Value]) -> Result<(), DatabaseError>;
}

/// Postgres-backed record source
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    debug_sql: bool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, debug_sql: false }
    }

    pub fn with_debug_sql(mut self, enabled: bool) -> Self {
        self.debug_sql = enabled;
        self
    }
}

#[async_trait]
impl RecordSource for PgStore {
    async fn count(&self, collection: Collection, plan: &QueryPlan) -> Result<u64, DatabaseError> {
        let SqlResult { query, params } = Filter::new(collection, plan).debug_logging(self.debug_sql).to_count_sql()?;
        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for param in &params {
            q = q.bind(param.as_deref());
        }
        let count = q.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn find(&self, collection: Collection, plan: &QueryPlan) -> Result<Vec<Value>, DatabaseError> {
        let SqlResult { query, params } = Filter::new(collection, plan).debug_logging(self.debug_sql).to_sql()?;
        let mut q = sqlx::query_scalar::<_, Value>(&query);
        for param in &params {
            q = q.bind(param.as_deref());
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn populate(&self, relation: Relation, records: &mut [Value]) -> Result<(), DatabaseError> {
        let keys = relation.keys(records);
        if records.is_empty() {
            return Ok(());
        }

        let target = relation.target();
        let related = if keys.is_empty() {
            Vec::new()
        } else {
            let query = format!(
                "SELECT {} AS row FROM \"{}\" WHERE \"{}\" = ANY($1) ORDER BY \"{}\" DESC",
                json_object_sql(target.visible_columns()),
                target.table(),
                relation.foreign_key(),
                target.created_column(),
            );
            sqlx::query_scalar::<_, Value>(&query)
                .bind(keys)
                .fetch_all(&self.pool)
                .await?
        };

        relation.attach(records, related);
        Ok(())
    }
}
