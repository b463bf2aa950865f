//! Translation of URL query parameters into a [`QueryPlan`].
//!
//! Pure parsing: no storage access happens here. Keys of the form `field[op]`
//! become operator maps (`{"field": {"$op": value}}`), everything that is not
//! one of [`RESERVED_PARAMS`] becomes an equality filter. Malformed operator
//! syntax is never rejected; it is carried through as a literal.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::types::{FilterOp, PageLimits, QueryPlan, SortKey, RESERVED_PARAMS};

impl QueryPlan {
    /// Build a plan from a raw (still percent-encoded) query string.
    pub fn from_query_string(raw: Option<&str>, limits: PageLimits) -> Self {
        let pairs = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()).into_owned();
        Self::from_pairs(pairs, limits)
    }

    /// Build a plan from decoded key/value pairs. Repeated keys keep the last value.
    pub fn from_pairs<I, K, V>(pairs: I, limits: PageLimits) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in pairs {
            params.insert(key.into(), value.into());
        }

        let select = params.get("select").and_then(|s| parse_select(s));
        let sort = params.get("sort").map(|s| parse_sort(s)).unwrap_or_default();
        let page = parse_positive(params.get("page")).unwrap_or(1);
        let mut limit = parse_positive(params.get("limit")).unwrap_or(limits.default_limit.max(1));
        if let Some(max) = limits.max_limit {
            limit = limit.min(max.max(1));
        }
        let skip = u64::from(page - 1) * u64::from(limit);

        let mut filter = Map::new();
        for (key, value) in params.iter().filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str())) {
            match split_operator_key(key) {
                Some((field, op)) => insert_operator(&mut filter, field, op, value),
                None => {
                    filter.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }

        Self {
            filter: Value::Object(filter),
            select,
            sort,
            page,
            limit,
            skip,
        }
    }

    /// Fields named by the projection, in request order.
    pub fn select_fields(&self) -> Vec<&str> {
        self.select
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Sort keys, or `default_column` descending when the request named none.
    pub fn sort_or_default(&self, default_column: &str) -> Vec<SortKey> {
        if self.sort.is_empty() {
            vec![SortKey::desc(default_column)]
        } else {
            self.sort.clone()
        }
    }
}

/// `status[in]` → `("status", "in")`. Anything with another bracket shape is not an operator key.
fn split_operator_key(key: &str) -> Option<(&str, &str)> {
    let (field, rest) = key.split_once('[')?;
    let op = rest.strip_suffix(']')?;
    if field.is_empty() || op.is_empty() || op.contains(['[', ']']) {
        return None;
    }
    Some((field, op))
}

fn insert_operator(filter: &mut Map<String, Value>, field: &str, op: &str, value: &str) {
    let (key, data) = match FilterOp::from_query_key(op) {
        Some(FilterOp::In) => (FilterOp::In.filter_key(), split_list(value)),
        Some(known) => (known.filter_key(), Value::String(value.to_string())),
        // Unknown operators stay un-prefixed so the map reads as a literal value.
        None => (op.to_string(), Value::String(value.to_string())),
    };

    let entry = filter
        .entry(field.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(ops) = entry {
        ops.insert(key, data);
    }
}

fn split_list(value: &str) -> Value {
    Value::Array(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
    )
}

fn parse_select(raw: &str) -> Option<String> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields.join(" "))
    }
}

fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|part| match part.strip_prefix('-') {
            Some(field) if !field.is_empty() => Some(SortKey::desc(field)),
            Some(_) => None,
            None if !part.is_empty() => Some(SortKey::asc(part)),
            None => None,
        })
        .collect()
}

fn parse_positive(raw: Option<&String>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).filter(|n| *n >= 1)
}
