use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::FilterOp;
use crate::database::collection::{Collection, ColumnDef};

/// Renders a filter document into a parameterized SQL predicate for one collection.
pub struct FilterWhere {
    collection: Collection,
    param_values: Vec<Option<String>>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new(collection: Collection, starting_param_index: usize) -> Self {
        Self {
            collection,
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(
        where_data: &Value,
        collection: Collection,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Option<String>>), FilterError> {
        Self::validate(where_data)?;
        let mut filter_where = Self::new(collection, starting_param_index);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("filter must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Option<String>>), FilterError> {
        if let Value::Object(obj) = where_data {
            for (field, value) in obj {
                self.parse_field_condition(field, value)?;
            }
        }

        let where_clause = if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        let Some(column) = self.collection.visible_column(field) else {
            tracing::debug!("Ignoring filter on unknown field '{}' for {}", field, self.collection.table());
            return Ok(());
        };

        let condition = match value {
            Value::Object(ops) => self.operator_conditions(column, ops)?,
            other => self.comparison(column, FilterOp::Eq, other)?,
        };
        self.conditions.push(condition);
        Ok(())
    }

    fn operator_conditions(&mut self, column: &ColumnDef, ops: &Map<String, Value>) -> Result<String, FilterError> {
        let parsed: Option<Vec<(FilterOp, &Value)>> = ops
            .iter()
            .map(|(key, data)| FilterOp::from_filter_key(key).map(|op| (op, data)))
            .collect();

        // A map with any non-operator key is a literal sub-document, which no column equals.
        let parsed = match parsed {
            Some(parsed) if !parsed.is_empty() => parsed,
            _ => return Ok("1=0".to_string()),
        };

        let mut parts = Vec::with_capacity(parsed.len());
        for (op, data) in parsed {
            parts.push(self.comparison(column, op, data)?);
        }
        Ok(parts.join(" AND "))
    }

    fn comparison(&mut self, column: &ColumnDef, op: FilterOp, data: &Value) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", column.name);
        match (op, data) {
            (FilterOp::Eq, Value::Null) => Ok(format!("{} IS NULL", quoted_column)),
            (FilterOp::In, Value::Array(values)) => {
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v, column)).collect();
                Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
            }
            (FilterOp::In, scalar) => {
                Ok(format!("{} = {}", quoted_column, self.param(scalar, column)))
            }
            (_, Value::Null) => Err(FilterError::InvalidOperatorData(format!(
                "{} requires a value",
                op.filter_key()
            ))),
            (op, value) => Ok(format!("{} {} {}", quoted_column, op.to_sql(), self.param(value, column))),
        }
    }

    fn param(&mut self, value: &Value, column: &ColumnDef) -> String {
        let text = match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        self.param_values.push(text);
        self.param_index += 1;
        format!("${}::{}", self.param_index, column.pg_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(filter: Value) -> (String, Vec<Option<String>>) {
        FilterWhere::generate(&filter, Collection::Missions, 0).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(render(json!({})).0, "1=1");
        assert_eq!(render(Value::Null).0, "1=1");
    }

    #[test]
    fn equality_casts_parameter_to_column_type() {
        let (sql, params) = render(json!({"status": "pending"}));
        assert_eq!(sql, "\"status\" = $1::text");
        assert_eq!(params, vec![Some("pending".to_string())]);
    }

    #[test]
    fn comparison_operators_render_in_order() {
        let (sql, params) = render(json!({"created_at": {"$gt": "2024-01-01", "$lte": "2025-01-01"}}));
        assert_eq!(sql, "\"created_at\" > $1::timestamptz AND \"created_at\" <= $2::timestamptz");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn in_operator_expands_parameters() {
        let (sql, params) = render(json!({"status": {"$in": ["pending", "completed"]}}));
        assert_eq!(sql, "\"status\" IN ($1::text, $2::text)");
        assert_eq!(params, vec![Some("pending".to_string()), Some("completed".to_string())]);
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let (sql, params) = render(json!({"status": {"$in": []}}));
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn unknown_operator_is_literal_and_matches_nothing() {
        let (sql, params) = render(json!({"status": {"regex": "pend"}}));
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn unknown_and_hidden_fields_are_dropped() {
        let (sql, _) = render(json!({"nonexistent": "x", "status[gt": "5"}));
        assert_eq!(sql, "1=1");

        let (sql, _) = FilterWhere::generate(&json!({"password": "secret"}), Collection::Users, 0).unwrap();
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn parameters_continue_from_starting_index() {
        let (sql, _) = FilterWhere::generate(&json!({"mission_id": "abc"}), Collection::Incidents, 2).unwrap();
        assert_eq!(sql, "\"mission_id\" = $3::uuid");
    }

    #[test]
    fn null_literal_renders_is_null() {
        let (sql, params) = render(json!({"owner_id": null}));
        assert_eq!(sql, "\"owner_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_non_object_filters() {
        let err = FilterWhere::generate(&json!("status = 'x'"), Collection::Missions, 0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid filter: filter must be an object");

        let err = FilterWhere::generate(&json!({"status": {"$gt": null}}), Collection::Missions, 0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid operator value: $gt requires a value");
    }
}
