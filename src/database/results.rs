//! Paginated fetch of a list request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collection::Collection;
use super::manager::DatabaseError;
use super::relation::Relation;
use super::store::RecordSource;
use crate::filter::QueryPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let end_index = u64::from(page) * u64::from(limit);
        Self {
            current: page,
            next: (end_index < total).then(|| PageRef { page: page + 1, limit }),
            prev: (page > 1).then(|| PageRef { page: page - 1, limit }),
        }
    }
}

/// Outcome of a list request, stored on the request for the terminal handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedResults {
    /// Records in this page.
    pub count: usize,
    #[serde(skip)]
    pub total: u64,
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

/// Count the full match set, fetch the requested page, then populate `relation` one hop.
pub async fn fetch(
    source: &dyn RecordSource,
    collection: Collection,
    plan: &QueryPlan,
    relation: Option<Relation>,
) -> Result<AdvancedResults, DatabaseError> {
    let total = source.count(collection, plan).await?;
    let mut data = source.find(collection, plan).await?;
    if let Some(relation) = relation {
        source.populate(relation, &mut data).await?;
    }

    Ok(AdvancedResults {
        count: data.len(),
        total,
        data,
        pagination: Pagination::new(plan.page, plan.limit, total),
    })
}
