use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters with their own meaning; everything else is a field filter.
pub const RESERVED_PARAMS: [&str; 4] = ["select", "sort", "page", "limit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
    #[serde(rename = "$in")] In,
}

impl FilterOp {
    /// Operators accepted in `field[op]` query keys, before `$` rewriting.
    pub const QUERY_OPERATORS: [FilterOp; 5] =
        [FilterOp::Gt, FilterOp::Gte, FilterOp::Lt, FilterOp::Lte, FilterOp::In];

    pub fn from_query_key(op: &str) -> Option<Self> {
        Self::QUERY_OPERATORS.into_iter().find(|candidate| candidate.query_key() == op)
    }

    pub fn from_filter_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(FilterOp::Eq),
            _ => key.strip_prefix('$').and_then(Self::from_query_key),
        }
    }

    pub fn query_key(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::In => "in",
        }
    }

    pub fn filter_key(&self) -> String {
        format!("${}", self.query_key())
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::In => "IN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// Pagination bounds applied while translating `page` and `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: Option<u32>,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_limit: 25, max_limit: None }
    }
}

impl From<&crate::config::FilterConfig> for PageLimits {
    fn from(config: &crate::config::FilterConfig) -> Self {
        Self { default_limit: config.default_limit, max_limit: config.max_limit }
    }
}

/// Parsed form of a list request: filter document, projection, sort and page window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Filter document keyed by field; operator maps use `$`-prefixed keys.
    pub filter: Value,
    /// Whitespace-joined inclusion projection. `None` selects every visible field.
    pub select: Option<String>,
    /// Sort keys in priority order. Empty means the collection default.
    pub sort: Vec<SortKey>,
    pub page: u32,
    pub limit: u32,
    pub skip: u64,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Option<String>>,
}
