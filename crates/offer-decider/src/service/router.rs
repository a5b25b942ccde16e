use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DeciderService, Evaluation, ServiceError};
use crate::decision::{evaluate_offer, DecisionResult, OfferContext, ShiftContext};
use crate::params::QueryOverrides;
use crate::storage::{KeyValueStore, OfferDraft, ShiftSettings};

/// Explicit engine inputs for a one-off evaluation that bypasses stored values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub shift: ShiftContext,
    pub offer: OfferContext,
}

/// Router builder exposing the calculator over HTTP.
pub fn decision_router<P, S>(service: Arc<DeciderService<P, S>>) -> Router
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/decision",
            get(current_decision_handler::<P, S>).post(evaluate_handler),
        )
        .route(
            "/api/v1/settings",
            get(settings_handler::<P, S>)
                .put(update_settings_handler::<P, S>)
                .delete(reset_settings_handler::<P, S>),
        )
        .route(
            "/api/v1/draft",
            get(draft_handler::<P, S>)
                .put(update_draft_handler::<P, S>)
                .delete(reset_offer_handler::<P, S>),
        )
        .route("/api/v1/accept", post(accept_handler::<P, S>))
        .with_state(service)
}

fn error_response(error: ServiceError) -> Response {
    let status = match error {
        ServiceError::Decision(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn overrides_from(query: Option<String>) -> QueryOverrides {
    query
        .map(|raw| QueryOverrides::from_query(&raw))
        .unwrap_or_default()
}

pub(crate) async fn current_decision_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
    RawQuery(query): RawQuery,
) -> Response
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    match service.evaluate(&overrides_from(query)) {
        Ok(evaluation) => (StatusCode::OK, Json::<Evaluation>(evaluation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler(Json(request): Json<EvaluationRequest>) -> Response {
    match evaluate_offer(&request.shift, &request.offer) {
        Ok(result) => (StatusCode::OK, Json::<DecisionResult>(result)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn settings_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
) -> Json<ShiftSettings>
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    Json(service.settings())
}

pub(crate) async fn update_settings_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
    Json(changes): Json<ShiftSettings>,
) -> Json<ShiftSettings>
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    Json(service.update_settings(changes))
}

pub(crate) async fn reset_settings_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
) -> StatusCode
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    service.reset_settings();
    StatusCode::NO_CONTENT
}

pub(crate) async fn draft_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
) -> Json<OfferDraft>
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    Json(service.draft())
}

pub(crate) async fn update_draft_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
    Json(changes): Json<OfferDraft>,
) -> Json<OfferDraft>
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    Json(service.update_draft(changes))
}

pub(crate) async fn reset_offer_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
) -> StatusCode
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    service.reset_offer();
    StatusCode::NO_CONTENT
}

pub(crate) async fn accept_handler<P, S>(
    State(service): State<Arc<DeciderService<P, S>>>,
    RawQuery(query): RawQuery,
) -> Response
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    match service.accept_offer(&overrides_from(query)) {
        Ok(accepted) => (StatusCode::OK, Json(accepted)).into_response(),
        Err(error) => error_response(error),
    }
}
