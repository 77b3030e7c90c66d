//! Levy handlers

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::ResidentId;

use crate::dto::levy::*;
use crate::{error::ApiError, AppState};

fn parse_resident_id(raw: &str) -> Result<ResidentId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid resident id '{}': {}", raw, e)))
}

/// Records a payment against the selected months
pub async fn record_payment(
    State(state): State<AppState>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let outcome = state.service.record_payment(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse::new(outcome, state.config.currency)),
    ))
}

/// Projects how a payment would spread over consecutive months
pub async fn preview_payment(
    State(state): State<AppState>,
    payload: Result<Json<PreviewPaymentRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let preview = state.service.preview(&request.into())?;
    Ok(Json(PreviewResponse::new(preview, state.config.currency)))
}

/// Bill history for a resident, latest month first
pub async fn list_bills(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BillResponse>>, ApiError> {
    let resident_id = parse_resident_id(&id)?;
    let bills = state.service.history(resident_id).await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

/// The next period a resident owes and how much
pub async fn next_due(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<NextDueResponse>, ApiError> {
    let resident_id = parse_resident_id(&id)?;
    let Query(query) = query?;

    let next = state.service.next_due(resident_id, query.period).await?;
    Ok(Json(NextDueResponse::new(next, state.config.currency)))
}

/// Collection figures for one month
pub async fn collection_summary(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Query(query) = query?;
    let summary = state.service.collection_summary(query.period).await?;
    Ok(Json(SummaryResponse::new(summary, state.config.currency)))
}
