use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::DocumentStore;
use crate::models::{Booking, NewBooking, PaymentConfirmation, PaymentRecord, Service};

/// Hosted Postgres store reached through its PostgREST endpoint.
pub struct SupabaseStore {
    rest_url: String,
    anon_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(project_url: &str, anon_key: String) -> Self {
        Self {
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            anon_key,
            client: reqwest::Client::new(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.get(format!("{}/{path}", self.rest_url)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.post(format!("{}/{path}", self.rest_url)))
            .header("Prefer", "return=representation")
    }

    fn select_by_id(&self, table: &str, id: &str) -> RequestBuilder {
        let id_filter = format!("eq.{id}");
        self.get(table)
            .query(&[("select", "*"), ("id", id_filter.as_str())])
    }

    fn services_request(&self) -> RequestBuilder {
        self.get("services")
            .query(&[("select", "*"), ("available", "eq.true"), ("order", "type")])
    }

    fn insert_booking_request(&self, booking: &NewBooking) -> RequestBuilder {
        self.post("bookings").json(booking)
    }

    /// Both writes happen inside the confirm_booking_payment function so a
    /// failure leaves neither record changed.
    fn confirm_payment_request(
        &self,
        booking_id: &str,
        payment: &PaymentConfirmation,
    ) -> RequestBuilder {
        self.post("rpc/confirm_booking_payment").json(&json!({
            "p_booking_id": booking_id,
            "p_reference": payment.reference,
            "p_amount": payment.amount,
            "p_currency": payment.currency,
            "p_payment_method": payment.payment_method,
            "p_metadata": payment.metadata(),
        }))
    }

    fn payments_request(&self, booking_id: &str) -> RequestBuilder {
        let booking_filter = format!("eq.{booking_id}");
        self.get("payments").query(&[
            ("select", "*"),
            ("booking_id", booking_filter.as_str()),
            ("order", "created_at"),
        ])
    }
}

async fn read_rows<T: DeserializeOwned>(resp: Response, what: &str) -> anyhow::Result<Vec<T>> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("store error while {what} ({status}): {body}");
    }
    resp.json()
        .await
        .with_context(|| format!("failed to parse store response while {what}"))
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn list_available_services(&self) -> anyhow::Result<Vec<Service>> {
        let resp = self
            .services_request()
            .send()
            .await
            .context("failed to query services")?;

        read_rows(resp, "listing services").await
    }

    async fn get_service(&self, id: &str) -> anyhow::Result<Option<Service>> {
        let resp = self
            .select_by_id("services", id)
            .send()
            .await
            .context("failed to query service")?;

        let rows: Vec<Service> = read_rows(resp, "loading service").await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_booking(&self, booking: &NewBooking) -> anyhow::Result<Booking> {
        let resp = self
            .insert_booking_request(booking)
            .send()
            .await
            .context("failed to insert booking")?;

        let rows: Vec<Booking> = read_rows(resp, "inserting booking").await?;
        rows.into_iter()
            .next()
            .context("store returned no booking after insert")
    }

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let resp = self
            .select_by_id("bookings", id)
            .send()
            .await
            .context("failed to query booking")?;

        let rows: Vec<Booking> = read_rows(resp, "loading booking").await?;
        Ok(rows.into_iter().next())
    }

    async fn confirm_payment(
        &self,
        booking_id: &str,
        payment: &PaymentConfirmation,
    ) -> anyhow::Result<Booking> {
        let resp = self
            .confirm_payment_request(booking_id, payment)
            .send()
            .await
            .context("failed to call confirm_booking_payment")?;

        let rows: Vec<Booking> = read_rows(resp, "confirming payment").await?;
        rows.into_iter()
            .next()
            .context("store returned no booking after payment confirmation")
    }

    async fn list_payments(&self, booking_id: &str) -> anyhow::Result<Vec<PaymentRecord>> {
        let resp = self
            .payments_request(booking_id)
            .send()
            .await
            .context("failed to query payments")?;

        read_rows(resp, "listing payments").await
    }
}
