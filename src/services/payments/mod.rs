pub mod paystack;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PaymentConfirmation;

/// Shown in place of the pay action when no gateway credential is configured.
pub const PAYMENTS_DISABLED_NOTICE: &str = "Payment integration requires a Paystack secret key. \
     Please contact the administrator to complete the setup.";

/// What the customer is about to pay for, handed to the hosted checkout.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentIntent {
    pub booking_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub customer_email: String,
    pub customer_name: String,
    pub reference: String,
}

impl PaymentIntent {
    /// Amount in the currency's minor unit (cents, kobo), as gateways expect it.
    pub fn amount_minor_units(&self) -> Option<i64> {
        (self.amount * Decimal::ONE_HUNDRED).round().to_i64()
    }

    /// Why `charge` does not settle this intent, or `None` when it does.
    pub fn unsettled_reason(&self, charge: &ChargeOutcome) -> Option<String> {
        if charge.reference != self.reference {
            return Some(format!(
                "charge {} belongs to another payment attempt",
                charge.reference
            ));
        }
        if !charge.is_success() {
            return Some(format!(
                "charge {} has status {:?}",
                charge.reference, charge.status
            ));
        }
        if Some(charge.amount) != self.amount_minor_units() {
            return Some(format!(
                "charge of {} minor units does not match {} {}",
                charge.amount, self.amount, self.currency
            ));
        }
        if !charge.currency.is_empty() && !charge.currency.eq_ignore_ascii_case(&self.currency) {
            return Some(format!(
                "charge currency {} does not match {}",
                charge.currency, self.currency
            ));
        }
        None
    }

    pub fn confirmation(&self, reference: &str, payment_method: &str) -> PaymentConfirmation {
        PaymentConfirmation {
            reference: reference.to_string(),
            amount: self.amount,
            currency: self.currency.clone(),
            payment_method: payment_method.to_string(),
            customer_name: self.customer_name.clone(),
        }
    }
}

/// A hosted checkout opened for one payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkout {
    pub reference: String,
    pub authorization_url: String,
    pub access_code: String,
}

/// The gateway's record of a charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargeOutcome {
    pub reference: String,
    /// `success` once the money has moved.
    pub status: String,
    /// Minor units.
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
}

impl ChargeOutcome {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Recorded as the ledger's `payment_method`.
    fn method(&self) -> &'static str;

    async fn initialize(&self, intent: &PaymentIntent) -> anyhow::Result<Checkout>;

    /// Looks the charge up on the gateway. The browser's word that a payment
    /// went through is never taken on its own.
    async fn verify(&self, reference: &str) -> anyhow::Result<ChargeOutcome>;
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `{prefix}-{unix millis}-{9 random base36 chars}`, unique per payment attempt.
pub fn generate_reference(prefix: &str) -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(9);
    for _ in 0..9 {
        suffix.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("{prefix}-{}-{suffix}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(amount: Decimal) -> PaymentIntent {
        PaymentIntent {
            booking_id: "b-1".to_string(),
            amount,
            currency: "USD".to_string(),
            customer_email: "amina@example.com".to_string(),
            customer_name: "Amina".to_string(),
            reference: "WWT-1-aaaaaaaaa".to_string(),
        }
    }

    #[test]
    fn test_reference_format() {
        let reference = generate_reference("WWT");
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "WWT");
        assert!(parts[1].parse::<i64>().unwrap() > 1_600_000_000_000);
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_references_differ_per_attempt() {
        let a = generate_reference("WWT");
        let b = generate_reference("WWT");
        assert_ne!(a, b);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(intent(Decimal::from(600)).amount_minor_units(), Some(60_000));
        assert_eq!(intent(Decimal::new(2550, 2)).amount_minor_units(), Some(2_550));
    }

    fn charge(status: &str, amount: i64) -> ChargeOutcome {
        ChargeOutcome {
            reference: "WWT-1-aaaaaaaaa".to_string(),
            status: status.to_string(),
            amount,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_successful_charge_settles_intent() {
        let intent = intent(Decimal::from(600));
        assert_eq!(intent.unsettled_reason(&charge("success", 60_000)), None);
    }

    #[test]
    fn test_unsettled_charges() {
        let intent = intent(Decimal::from(600));

        assert!(intent.unsettled_reason(&charge("abandoned", 60_000)).is_some());
        assert!(intent.unsettled_reason(&charge("success", 100)).is_some());

        let other_attempt = ChargeOutcome {
            reference: "WWT-9-zzzzzzzzz".to_string(),
            ..charge("success", 60_000)
        };
        assert!(intent.unsettled_reason(&other_attempt).is_some());

        let other_currency = ChargeOutcome {
            currency: "NGN".to_string(),
            ..charge("success", 60_000)
        };
        assert!(intent.unsettled_reason(&other_currency).is_some());
    }

    #[test]
    fn test_confirmation_carries_intent_amount_and_name() {
        let confirmation = intent(Decimal::from(50)).confirmation("WWT-2-bbbbbbbbb", "paystack");
        assert_eq!(confirmation.amount, Decimal::from(50));
        assert_eq!(confirmation.reference, "WWT-2-bbbbbbbbb");
        assert_eq!(confirmation.metadata()["customer_name"], "Amina");
    }
}
