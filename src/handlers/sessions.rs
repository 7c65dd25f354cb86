use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::SessionEvent;
use crate::services::booking_form::BookingForm;
use crate::services::calendar::generate_ics;
use crate::services::catalog;
use crate::services::confirmation::ConfirmationView;
use crate::services::payments::Checkout;
use crate::services::workflow::{BookingSession, SessionView};
use crate::state::AppState;

fn view_of(state: &AppState, session: &BookingSession) -> Json<SessionView> {
    Json(session.view(state.gateway().is_some()))
}

fn publish(state: &AppState, event: SessionEvent) {
    tracing::debug!(
        session_id = %event.session_id,
        action = event.action,
        from = %event.from,
        to = %event.to,
        "session transition"
    );
    state.sessions.publish(event);
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> Response {
    let (_, session) = state.sessions.create();
    let session = session.lock().await;
    (StatusCode::CREATED, view_of(&state, &session)).into_response()
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let session = session.lock().await;
    Ok(view_of(&state, &session))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectServiceRequest {
    pub service_id: String,
}

pub async fn select_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectServiceRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let service = catalog::find_service(state.store.as_ref(), &req.service_id).await?;

    let mut session = session.lock().await;
    let event = session.select_service(service)?;
    publish(&state, event);
    Ok(view_of(&state, &session))
}

pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(form): Json<BookingForm>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let today = Local::now().date_naive();

    let mut session = session.lock().await;
    let event = session
        .submit_booking(state.store.as_ref(), &form, today)
        .await?;
    publish(&state, event);
    Ok(view_of(&state, &session))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let mut session = session.lock().await;
    let event = session.cancel_booking()?;
    publish(&state, event);
    Ok(view_of(&state, &session))
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub checkout: Checkout,
    pub session: SessionView,
}

pub async fn begin_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let session = state.sessions.get(id)?;
    let mut session = session.lock().await;
    let checkout = session.begin_payment(state.gateway()).await?;
    Ok(Json(CheckoutResponse {
        checkout,
        session: session.view(state.gateway().is_some()),
    }))
}

#[derive(Deserialize)]
pub struct PaymentCallback {
    pub reference: String,
}

/// Browser return from checkout. The redirect alone proves nothing, so the
/// charge is looked up with the gateway before the booking is confirmed.
pub async fn payment_success(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(callback): Json<PaymentCallback>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let gateway = state
        .gateway()
        .ok_or_else(|| AppError::PaymentUnavailable("payments are disabled".to_string()))?;

    let mut session = session.lock().await;
    if let Err(e) = session.ensure_awaiting(&callback.reference) {
        tracing::warn!(
            session_id = %id,
            reference = %callback.reference,
            error = %e,
            "payment callback refused"
        );
        return Err(e);
    }

    let charge = gateway.verify(&callback.reference).await.map_err(|e| {
        tracing::error!(reference = %callback.reference, error = %e, "payment verification failed");
        AppError::Payment(e.to_string())
    })?;

    let event = session
        .payment_succeeded(state.store.as_ref(), gateway.method(), &charge)
        .await?;
    publish(&state, event);
    Ok(view_of(&state, &session))
}

pub async fn payment_cancelled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let mut session = session.lock().await;
    let event = session.payment_cancelled()?;
    publish(&state, event);
    Ok(view_of(&state, &session))
}

pub async fn get_confirmation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmationView>, AppError> {
    let session = state.sessions.get(id)?;
    let session = session.lock().await;
    Ok(Json(session.confirmation(&state.config.contact)?))
}

pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(id)?;
    let session = session.lock().await;

    // Only confirmed bookings get a calendar entry.
    session.confirmation(&state.config.contact)?;
    let (Some(booking), Some(service)) = (session.booking(), session.selected_service()) else {
        return Err(AppError::NotFound("confirmed booking".to_string()));
    };

    let ics = generate_ics(booking, service, &state.config.business_name);
    let filename = format!("booking-{}.ics", booking.id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}

pub async fn close_confirmation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id)?;
    let mut session = session.lock().await;
    let event = session.close_confirmation()?;
    publish(&state, event);
    Ok(view_of(&state, &session))
}

/// Server-sent transitions for one session, starting with a snapshot of where
/// it is now.
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let session = state.sessions.get(id)?;
    // Subscribe before reading the snapshot so nothing falls in between.
    let rx = state.sessions.subscribe();
    let snapshot = {
        let session = session.lock().await;
        session.view(state.gateway().is_some())
    };

    let data = serde_json::to_string(&snapshot).unwrap_or_default();
    let snapshot_stream =
        tokio_stream::once(Ok::<_, Infallible>(Event::default().data(data).event("snapshot")));

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.session_id == id => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("transition")))
        }
        Ok(_) => None,
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    let combined = snapshot_stream.chain(live_stream);
    let merged = StreamExt::merge(combined, keepalive_stream);

    Ok(Sse::new(merged))
}
