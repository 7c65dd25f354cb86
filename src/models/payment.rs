use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Entry in the `payments` ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub id: String,
    pub booking_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub reference: String,
    pub status: LedgerStatus,
    pub payment_method: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    Success,
    Failed,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Success => "success",
            LedgerStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "success" => LedgerStatus::Success,
            _ => LedgerStatus::Failed,
        }
    }
}

/// Everything the store needs to mark a booking paid and write its ledger entry
/// in one step.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub customer_name: String,
}

impl PaymentConfirmation {
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "customer_name": self.customer_name })
    }
}
