use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{QueryPlan, SqlResult};
use crate::database::collection::{json_object_sql, Collection, ColumnDef};

/// SQL builder for one list request against one collection.
///
/// Rows come back as a single `row` JSON column built with `json_build_object`,
/// so projection, ordering and paging all happen in one statement.
pub struct Filter<'a> {
    collection: Collection,
    plan: &'a QueryPlan,
    debug_logging: bool,
}

impl<'a> Filter<'a> {
    pub fn new(collection: Collection, plan: &'a QueryPlan) -> Self {
        Self { collection, plan, debug_logging: false }
    }

    /// Log each rendered statement at debug level.
    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(
            &self.plan.sort_or_default(self.collection.created_column()),
            self.collection,
        );

        let query = [
            format!("SELECT {} AS row", self.build_select_clause()),
            format!("FROM \"{}\"", self.collection.table()),
            format!("WHERE {}", where_result.query),
            order_clause,
            format!("LIMIT {} OFFSET {}", self.plan.limit, self.plan.skip),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        if self.debug_logging {
            tracing::debug!("Filter SQL: {} {:?}", query, where_result.params);
        }

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = FilterWhere::generate(&self.plan.filter, self.collection, 0)?;
        Ok(SqlResult { query, params })
    }

    /// Total matching the filter, ignoring the page window.
    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
            self.collection.table(),
            where_result.query
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    /// Projected columns. Unknown names are ignored and `id` is always present.
    pub fn projected_columns(&self) -> Vec<&'static ColumnDef> {
        let requested = self.plan.select_fields();
        if requested.is_empty() {
            return self.collection.visible_columns().collect();
        }

        let mut columns: Vec<&'static ColumnDef> = self.collection.visible_column("id").into_iter().collect();
        for name in requested {
            if let Some(column) = self.collection.visible_column(name) {
                if !columns.iter().any(|c| c.name == column.name) {
                    columns.push(column);
                }
            }
        }
        columns
    }

    fn build_select_clause(&self) -> String {
        json_object_sql(self.projected_columns())
    }
}

/// Merge a fixed equality condition into a plan's filter, replacing any
/// caller-supplied condition on the same field.
pub fn apply_scope(plan: &mut QueryPlan, field: &str, value: impl Into<String>) {
    if !plan.filter.is_object() {
        plan.filter = Value::Object(Default::default());
    }
    if let Value::Object(filter) = &mut plan.filter {
        filter.insert(field.to_string(), Value::String(value.into()));
    }
}
