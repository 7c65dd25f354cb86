use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Service;
use crate::services::booking_form::BookingForm;
use crate::services::catalog::{self, Quote};
use crate::state::AppState;

pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = catalog::load_catalog(state.store.as_ref()).await?;
    Ok(Json(services))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub service_id: String,
    #[serde(flatten)]
    pub form: BookingForm,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let quote = catalog::quote(state.store.as_ref(), &req.service_id, &req.form).await?;
    Ok(Json(quote))
}
