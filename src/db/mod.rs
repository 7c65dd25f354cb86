pub mod migrations;
pub mod queries;
pub mod sqlite;
pub mod supabase;

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;

use crate::models::{Booking, NewBooking, PaymentConfirmation, PaymentRecord, Service};

/// The hosted record store behind the `services`, `bookings` and `payments`
/// collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Available services, ordered by category.
    async fn list_available_services(&self) -> anyhow::Result<Vec<Service>>;

    async fn get_service(&self, id: &str) -> anyhow::Result<Option<Service>>;

    /// Inserts a booking and returns it with its generated id and timestamps.
    async fn insert_booking(&self, booking: &NewBooking) -> anyhow::Result<Booking>;

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>>;

    /// Marks the booking completed/confirmed and writes the ledger entry as a
    /// single atomic operation.
    async fn confirm_payment(
        &self,
        booking_id: &str,
        payment: &PaymentConfirmation,
    ) -> anyhow::Result<Booking>;

    async fn list_payments(&self, booking_id: &str) -> anyhow::Result<Vec<PaymentRecord>>;
}

pub fn init_db(path: &str, migrations_dir: &Path) -> anyhow::Result<Connection> {
    let mut conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&mut conn, migrations_dir)?;

    Ok(conn)
}
