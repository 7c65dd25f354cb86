//! The booking session: browsing → booking → payment → confirmation.
//!
//! A session only changes through the transition methods below. Each one checks
//! the current state first and refuses with [`AppError::InvalidTransition`]
//! without touching anything when called out of order.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::config::ContactInfo;
use crate::db::DocumentStore;
use crate::errors::AppError;
use crate::models::{Booking, Service, SessionEvent, WorkflowState};
use crate::services::booking_form::BookingForm;
use crate::services::confirmation::ConfirmationView;
use crate::services::payments::{
    generate_reference, ChargeOutcome, Checkout, PaymentGateway, PaymentIntent,
    PAYMENTS_DISABLED_NOTICE,
};
use crate::services::pricing;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub currency: String,
    pub reference_prefix: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            reference_prefix: "WWT".to_string(),
        }
    }
}

/// The payment attempt in progress while the session is in `payment`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentStep {
    pub reference: String,
    pub processing: bool,
    pub checkout: Option<Checkout>,
}

#[derive(Debug, Clone)]
pub struct BookingSession {
    id: Uuid,
    settings: SessionSettings,
    state: WorkflowState,
    selected_service: Option<Service>,
    booking: Option<Booking>,
    payment: Option<PaymentStep>,
    last_error: Option<String>,
    updated_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new(id: Uuid, settings: SessionSettings) -> Self {
        Self {
            id,
            settings,
            state: WorkflowState::Browsing,
            selected_service: None,
            booking: None,
            payment: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn selected_service(&self) -> Option<&Service> {
        self.selected_service.as_ref()
    }

    pub fn booking(&self) -> Option<&Booking> {
        self.booking.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentStep> {
        self.payment.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reference of the current payment attempt, if any.
    pub fn payment_reference(&self) -> Option<&str> {
        self.payment.as_ref().map(|p| p.reference.as_str())
    }

    /// The booking and customer details handed to the payment step.
    pub fn payment_intent(&self) -> Option<PaymentIntent> {
        let booking = self.booking.as_ref()?;
        let step = self.payment.as_ref()?;
        Some(PaymentIntent {
            booking_id: booking.id.clone(),
            amount: booking.total_price,
            currency: self.settings.currency.clone(),
            customer_email: booking.customer_email.clone(),
            customer_name: booking.customer_name.clone(),
            reference: step.reference.clone(),
        })
    }

    // ── Transitions ──

    pub fn select_service(&mut self, service: Service) -> Result<SessionEvent, AppError> {
        self.expect(WorkflowState::Browsing, "select a service")?;
        if !service.available {
            return Err(AppError::NotFound(format!(
                "service {} is not available",
                service.id
            )));
        }

        self.selected_service = Some(service);
        self.booking = None;
        self.payment = None;
        Ok(self.transition("select_service", WorkflowState::Booking))
    }

    pub async fn submit_booking(
        &mut self,
        store: &dyn DocumentStore,
        form: &BookingForm,
        today: NaiveDate,
    ) -> Result<SessionEvent, AppError> {
        self.expect(WorkflowState::Booking, "submit a booking")?;
        let Some(service) = self.selected_service.clone() else {
            return Err(self.fail(AppError::NotFound("no service selected".to_string())));
        };

        let draft = match form.validate(&service, today) {
            Ok(draft) => draft,
            Err(e) => return Err(self.fail(e.into())),
        };
        let total_price = pricing::total_price(&service, &draft.details);
        let new_booking = draft.into_new_booking(&service, total_price);

        let booking = match store.insert_booking(&new_booking).await {
            Ok(booking) => booking,
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "failed to create booking");
                return Err(self.fail(AppError::Store(e)));
            }
        };

        tracing::info!(
            session_id = %self.id,
            booking_id = %booking.id,
            service_id = %service.id,
            total_price = %booking.total_price,
            "booking created"
        );

        self.booking = Some(booking);
        self.payment = Some(PaymentStep {
            reference: generate_reference(&self.settings.reference_prefix),
            processing: false,
            checkout: None,
        });
        Ok(self.transition("submit_booking", WorkflowState::Payment))
    }

    pub fn cancel_booking(&mut self) -> Result<SessionEvent, AppError> {
        self.expect(WorkflowState::Booking, "cancel a booking")?;
        self.selected_service = None;
        self.booking = None;
        self.payment = None;
        Ok(self.transition("cancel_booking", WorkflowState::Browsing))
    }

    /// Opens a hosted checkout for the current attempt. Without a gateway the
    /// pay action is disabled and nothing is attempted.
    pub async fn begin_payment(
        &mut self,
        gateway: Option<&dyn PaymentGateway>,
    ) -> Result<Checkout, AppError> {
        self.expect(WorkflowState::Payment, "start a payment")?;
        let Some(gateway) = gateway else {
            return Err(AppError::PaymentUnavailable(
                PAYMENTS_DISABLED_NOTICE.to_string(),
            ));
        };
        let intent = self.require_intent()?;

        if let Some(step) = self.payment.as_mut() {
            if let (true, Some(checkout)) = (step.processing, &step.checkout) {
                return Ok(checkout.clone());
            }
            step.processing = true;
        }

        match gateway.initialize(&intent).await {
            Ok(checkout) => {
                tracing::info!(
                    session_id = %self.id,
                    reference = %intent.reference,
                    "checkout opened"
                );
                if let Some(step) = self.payment.as_mut() {
                    step.checkout = Some(checkout.clone());
                }
                self.last_error = None;
                Ok(checkout)
            }
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "failed to initialize payment");
                if let Some(step) = self.payment.as_mut() {
                    step.processing = false;
                }
                Err(self.fail(AppError::Payment(format!("{e:#}"))))
            }
        }
    }

    /// Checks that a success report is for the attempt in progress and that a
    /// checkout was opened for it. Never changes the session.
    pub fn ensure_awaiting(&self, reference: &str) -> Result<(), AppError> {
        self.expect(WorkflowState::Payment, "confirm a payment")?;
        let Some(step) = self.payment.as_ref() else {
            return Err(AppError::NotFound("pending booking".to_string()));
        };
        if step.reference != reference {
            return Err(AppError::NotFound(format!("payment attempt {reference}")));
        }
        if step.checkout.is_none() {
            return Err(AppError::PaymentUnverified(format!(
                "no checkout was opened for {reference}"
            )));
        }
        Ok(())
    }

    /// The gateway reports `charge` as paid. Marks the booking paid and records
    /// the ledger entry in one store operation, once the charge is known to
    /// settle the current attempt. On a store failure the session stays in
    /// `payment` so the report can be replayed.
    pub async fn payment_succeeded(
        &mut self,
        store: &dyn DocumentStore,
        payment_method: &str,
        charge: &ChargeOutcome,
    ) -> Result<SessionEvent, AppError> {
        self.ensure_awaiting(&charge.reference)?;
        let intent = self.require_intent()?;
        if let Some(reason) = intent.unsettled_reason(charge) {
            tracing::warn!(
                session_id = %self.id,
                reference = %charge.reference,
                reason = %reason,
                "payment not settled"
            );
            return Err(AppError::PaymentUnverified(reason));
        }
        let reference = charge.reference.as_str();
        let confirmation = intent.confirmation(reference, payment_method);

        match store.confirm_payment(&intent.booking_id, &confirmation).await {
            Ok(booking) => {
                tracing::info!(
                    session_id = %self.id,
                    booking_id = %booking.id,
                    reference = %reference,
                    "payment confirmed"
                );
                self.booking = Some(booking);
                self.payment = None;
                Ok(self.transition("payment_succeeded", WorkflowState::Confirmation))
            }
            Err(e) => {
                tracing::error!(
                    session_id = %self.id,
                    booking_id = %intent.booking_id,
                    reference = %reference,
                    error = %e,
                    "failed to record payment"
                );
                if let Some(step) = self.payment.as_mut() {
                    step.processing = false;
                }
                Err(self.fail(AppError::Store(e)))
            }
        }
    }

    /// Payment window closed without paying; back to the form to retry.
    pub fn payment_cancelled(&mut self) -> Result<SessionEvent, AppError> {
        self.expect(WorkflowState::Payment, "cancel a payment")?;
        self.payment = None;
        Ok(self.transition("payment_cancelled", WorkflowState::Booking))
    }

    pub fn close_confirmation(&mut self) -> Result<SessionEvent, AppError> {
        self.expect(WorkflowState::Confirmation, "close the confirmation")?;
        self.selected_service = None;
        self.booking = None;
        self.payment = None;
        Ok(self.transition("close_confirmation", WorkflowState::Browsing))
    }

    // ── Views ──

    pub fn confirmation(&self, contact: &ContactInfo) -> Result<ConfirmationView, AppError> {
        self.expect(WorkflowState::Confirmation, "show a confirmation")?;
        match (&self.booking, &self.selected_service) {
            (Some(booking), Some(service)) => Ok(ConfirmationView::new(booking, service, contact)),
            _ => Err(AppError::NotFound("confirmed booking".to_string())),
        }
    }

    pub fn view(&self, payments_enabled: bool) -> SessionView {
        let payment = self.payment_intent().map(|intent| {
            let step = self.payment.as_ref();
            PaymentView {
                booking_id: intent.booking_id,
                amount: intent.amount,
                currency: intent.currency,
                customer_email: intent.customer_email,
                customer_name: intent.customer_name,
                reference: intent.reference,
                processing: step.map(|s| s.processing).unwrap_or(false),
                checkout: step.and_then(|s| s.checkout.clone()),
                enabled: payments_enabled,
                notice: (!payments_enabled).then_some(PAYMENTS_DISABLED_NOTICE),
            }
        });

        SessionView {
            id: self.id,
            state: self.state,
            selected_service: self.selected_service.clone(),
            booking: self.booking.clone(),
            payment,
            last_error: self.last_error.clone(),
            updated_at: self.updated_at,
        }
    }

    // ── Helpers ──

    fn expect(&self, expected: WorkflowState, action: &'static str) -> Result<(), AppError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn require_intent(&self) -> Result<PaymentIntent, AppError> {
        self.payment_intent()
            .ok_or_else(|| AppError::NotFound("pending booking".to_string()))
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.last_error = Some(err.to_string());
        self.updated_at = Utc::now();
        err
    }

    fn transition(&mut self, action: &'static str, to: WorkflowState) -> SessionEvent {
        let from = self.state;
        self.state = to;
        self.last_error = None;
        self.updated_at = Utc::now();
        tracing::debug!(session_id = %self.id, from = %from, to = %to, action, "session transition");
        SessionEvent {
            session_id: self.id,
            action,
            from,
            to,
            at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub state: WorkflowState,
    pub selected_service: Option<Service>,
    pub booking: Option<Booking>,
    pub payment: Option<PaymentView>,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    pub booking_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub customer_email: String,
    pub customer_name: String,
    pub reference: String,
    pub processing: bool,
    pub checkout: Option<Checkout>,
    pub enabled: bool,
    pub notice: Option<&'static str>,
}
