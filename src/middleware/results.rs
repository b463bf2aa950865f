use std::collections::HashMap;

use axum::{
    extract::{Path, RawQuery, Request, State},
    middleware::Next,
    response::Response,
};

use crate::database::{results, Collection, Relation};
use crate::error::ApiError;
use crate::filter::{apply_scope, QueryPlan};
use crate::state::AppState;

/// What a list route fetches: collection, optional populated relation, and an
/// optional `(path param, field)` scope such as `missionId → mission_id`.
#[derive(Debug, Clone, Copy)]
pub struct ResultsSpec {
    pub collection: Collection,
    pub relation: Option<Relation>,
    pub scope: Option<(&'static str, &'static str)>,
}

impl ResultsSpec {
    pub const fn new(collection: Collection) -> Self {
        Self { collection, relation: None, scope: None }
    }

    pub const fn populate(self, relation: Relation) -> Self {
        Self { relation: Some(relation), ..self }
    }

    pub const fn scoped(self, param: &'static str, field: &'static str) -> Self {
        Self { scope: Some((param, field)), ..self }
    }
}

/// State handed to [`advanced_results`] through `from_fn_with_state`.
#[derive(Clone)]
pub struct ResultsLayer {
    pub state: AppState,
    pub spec: ResultsSpec,
}

impl ResultsLayer {
    pub fn new(state: &AppState, spec: ResultsSpec) -> Self {
        Self { state: state.clone(), spec }
    }
}

/// Translate the query string, fetch the page and leave `AdvancedResults` in the
/// request extensions for the list handler.
pub async fn advanced_results(
    State(layer): State<ResultsLayer>,
    RawQuery(query): RawQuery,
    params: Option<Path<HashMap<String, String>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ResultsLayer { state, spec } = layer;
    let mut plan = QueryPlan::from_query_string(query.as_deref(), state.page_limits());

    if let Some((param, field)) = spec.scope {
        let value = params
            .as_ref()
            .and_then(|Path(params)| params.get(param))
            .ok_or_else(|| ApiError::not_found(crate::error::RESOURCE_NOT_FOUND))?;
        apply_scope(&mut plan, field, value.as_str());
    }

    let fetched = results::fetch(state.records.as_ref(), spec.collection, &plan, spec.relation).await?;
    tracing::debug!(
        "{} results for {:?}: page {} of {} total",
        fetched.count,
        spec.collection,
        plan.page,
        fetched.total
    );

    request.extensions_mut().insert(fetched);
    Ok(next.run(request).await)
}
