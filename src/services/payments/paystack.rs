use anyhow::Context;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha512;

use super::{ChargeOutcome, Checkout, PaymentGateway, PaymentIntent};

const PAYSTACK_API: &str = "https://api.paystack.co";

pub struct PaystackGateway {
    secret_key: String,
    callback_url: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl PaystackGateway {
    pub fn new(secret_key: String, callback_url: Option<String>) -> Self {
        Self {
            secret_key,
            callback_url,
            base_url: PAYSTACK_API.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct InitializeResponse {
    status: bool,
    message: String,
    data: Option<InitializeData>,
}

#[derive(Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: bool,
    message: String,
    data: Option<ChargeOutcome>,
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn method(&self) -> &'static str {
        "paystack"
    }

    async fn initialize(&self, intent: &PaymentIntent) -> anyhow::Result<Checkout> {
        let amount = intent
            .amount_minor_units()
            .with_context(|| format!("amount {} out of range", intent.amount))?;

        let mut body = json!({
            "email": intent.customer_email,
            "amount": amount.to_string(),
            "currency": intent.currency,
            "reference": intent.reference,
            "metadata": {
                "booking_id": intent.booking_id,
                "customer_name": intent.customer_name,
            },
        });
        if let Some(url) = &self.callback_url {
            body["callback_url"] = json!(url);
        }

        let resp = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Paystack API")?;

        let status = resp.status();
        let data: InitializeResponse = resp
            .json()
            .await
            .context("failed to parse Paystack response")?;

        if !status.is_success() || !data.status {
            anyhow::bail!("Paystack API error ({}): {}", status, data.message);
        }

        let data = data
            .data
            .ok_or_else(|| anyhow::anyhow!("missing data in Paystack response"))?;

        Ok(Checkout {
            reference: data.reference,
            authorization_url: data.authorization_url,
            access_code: data.access_code,
        })
    }

    async fn verify(&self, reference: &str) -> anyhow::Result<ChargeOutcome> {
        let resp = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .context("failed to call Paystack API")?;

        let status = resp.status();
        let data: VerifyResponse = resp
            .json()
            .await
            .context("failed to parse Paystack response")?;

        if !status.is_success() || !data.status {
            anyhow::bail!("Paystack verify error ({}): {}", status, data.message);
        }

        data.data
            .ok_or_else(|| anyhow::anyhow!("missing data in Paystack verify response"))
    }
}

/// Checks `x-paystack-signature`: hex HMAC-SHA512 of the raw body keyed with
/// the secret key.
pub fn verify_signature(secret_key: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha512>::new_from_slice(secret_key.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Webhook payload. Only the fields used to confirm a booking are read.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: ChargeData,
}

#[derive(Debug, Deserialize)]
pub struct ChargeData {
    pub reference: String,
    #[serde(default)]
    pub status: String,
    /// Minor units.
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ChargeData {
    pub fn outcome(&self) -> ChargeOutcome {
        ChargeOutcome {
            reference: self.reference.clone(),
            status: self.status.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
        }
    }

    pub fn booking_id(&self) -> Option<&str> {
        self.metadata.get("booking_id").and_then(|v| v.as_str())
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.metadata.get("customer_name").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"event":"charge.success","data":{"reference":"WWT-1-abc"}}"#;
        let signature = sign("sk_test_123", body);
        assert!(verify_signature("sk_test_123", body, &signature));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let body = br#"{"event":"charge.success","data":{"reference":"WWT-1-abc"}}"#;
        let signature = sign("sk_test_123", body);
        assert!(!verify_signature("sk_test_other", body, &signature));
        assert!(!verify_signature(
            "sk_test_123",
            br#"{"event":"charge.success","data":{"reference":"WWT-1-xyz"}}"#,
            &signature
        ));
        assert!(!verify_signature("sk_test_123", body, "not-hex"));
        assert!(!verify_signature("sk_test_123", body, ""));
    }

    #[test]
    fn test_parse_charge_success() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "event": "charge.success",
                "data": {
                    "id": 302961,
                    "reference": "WWT-1718000000000-k2j4h5g6f",
                    "status": "success",
                    "amount": 60000,
                    "currency": "USD",
                    "metadata": {"booking_id": "b-42", "customer_name": "Amina"},
                    "customer": {"email": "amina@example.com"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(event.event, "charge.success");
        assert_eq!(event.data.booking_id(), Some("b-42"));
        assert_eq!(event.data.customer_name(), Some("Amina"));
        assert_eq!(event.data.amount, 60_000);

        let outcome = event.data.outcome();
        assert!(outcome.is_success());
        assert_eq!(outcome.reference, "WWT-1718000000000-k2j4h5g6f");
    }

    #[test]
    fn test_parse_verify_response() {
        let resp: VerifyResponse = serde_json::from_str(
            r#"{
                "status": true,
                "message": "Verification successful",
                "data": {
                    "id": 4099260516,
                    "status": "abandoned",
                    "reference": "WWT-1718000000000-k2j4h5g6f",
                    "amount": 60000,
                    "currency": "USD",
                    "gateway_response": "The transaction was not completed"
                }
            }"#,
        )
        .unwrap();

        let charge = resp.data.unwrap();
        assert!(!charge.is_success());
        assert_eq!(charge.amount, 60_000);
    }
}
