use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::models::PaymentStatus;
use crate::services::payments::paystack::{verify_signature, ChargeData, WebhookEvent};
use crate::services::payments::PaymentIntent;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Server-to-server confirmation from Paystack. Covers customers who paid but
/// never made it back to the success callback.
pub async fn paystack_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let secret = &state.config.paystack_secret_key;
    if secret.is_empty() || state.gateway().is_none() {
        return AppError::PaymentUnavailable("payments are disabled".to_string()).into_response();
    }

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        tracing::warn!("missing Paystack signature header");
        return AppError::Unauthorized.into_response();
    };
    if !verify_signature(secret, &body, signature) {
        tracing::warn!("invalid Paystack signature");
        return AppError::Unauthorized.into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable Paystack webhook payload");
            return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
        }
    };

    if event.event != "charge.success" {
        tracing::debug!(event = %event.event, "ignoring Paystack event");
        return StatusCode::OK.into_response();
    }

    match confirm_charge(&state, &event.data).await {
        Ok(()) => StatusCode::OK.into_response(),
        // Non-2xx makes Paystack retry later.
        Err(e) => e.into_response(),
    }
}

async fn confirm_charge(state: &AppState, charge: &ChargeData) -> Result<(), AppError> {
    let reference = charge.reference.as_str();
    let method = state.gateway().map(|g| g.method()).unwrap_or("paystack");
    let outcome = charge.outcome();

    if let Some(session) = state.sessions.find_by_reference(reference).await {
        let mut session = session.lock().await;
        match session
            .payment_succeeded(state.store.as_ref(), method, &outcome)
            .await
        {
            Ok(event) => {
                state.sessions.publish(event);
                return Ok(());
            }
            // The browser callback got there first.
            Err(AppError::InvalidTransition { .. }) => return Ok(()),
            Err(AppError::PaymentUnverified(reason)) => {
                tracing::warn!(reference = %reference, reason = %reason, "charge does not settle session");
                return Ok(());
            }
            // The session moved on to another attempt since the lookup.
            Err(AppError::NotFound(_)) => {
                tracing::debug!(reference = %reference, "session no longer owns charge");
            }
            Err(e) => return Err(e),
        }
    }

    let Some(booking_id) = charge.booking_id() else {
        tracing::warn!(reference = %reference, "charge without booking metadata");
        return Ok(());
    };

    let booking = state
        .store
        .get_booking(booking_id)
        .await
        .map_err(AppError::Store)?;
    let Some(booking) = booking else {
        tracing::warn!(booking_id = %booking_id, reference = %reference, "charge for unknown booking");
        return Ok(());
    };
    if booking.payment_status == PaymentStatus::Completed {
        tracing::debug!(booking_id = %booking_id, "booking already paid");
        return Ok(());
    }
    let ledger = state
        .store
        .list_payments(booking_id)
        .await
        .map_err(AppError::Store)?;
    if ledger.iter().any(|p| p.reference == reference) {
        tracing::debug!(booking_id = %booking_id, reference = %reference, "charge already recorded");
        return Ok(());
    }

    let intent = PaymentIntent {
        booking_id: booking.id.clone(),
        amount: booking.total_price,
        currency: state.config.currency.clone(),
        customer_email: booking.customer_email.clone(),
        customer_name: charge
            .customer_name()
            .map(str::to_string)
            .unwrap_or_else(|| booking.customer_name.clone()),
        reference: reference.to_string(),
    };
    if let Some(reason) = intent.unsettled_reason(&outcome) {
        tracing::warn!(booking_id = %booking_id, reference = %reference, reason = %reason, "charge does not settle booking");
        return Ok(());
    }

    state
        .store
        .confirm_payment(booking_id, &intent.confirmation(reference, method))
        .await
        .map_err(AppError::Store)?;
    tracing::info!(booking_id = %booking_id, reference = %reference, "payment confirmed by webhook");
    Ok(())
}
