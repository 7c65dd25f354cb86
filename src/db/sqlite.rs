use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;

use super::{init_db, queries, DocumentStore};
use crate::models::{Booking, NewBooking, PaymentConfirmation, PaymentRecord, Service};

/// Local SQLite-backed store, used for development and tests.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str, migrations_dir: &Path) -> anyhow::Result<Self> {
        let conn = init_db(path, migrations_dir)?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn list_available_services(&self) -> anyhow::Result<Vec<Service>> {
        let conn = self.conn()?;
        queries::list_available_services(&conn)
    }

    async fn get_service(&self, id: &str) -> anyhow::Result<Option<Service>> {
        let conn = self.conn()?;
        queries::get_service(&conn, id)
    }

    async fn insert_booking(&self, booking: &NewBooking) -> anyhow::Result<Booking> {
        let conn = self.conn()?;
        queries::insert_booking(&conn, booking)
    }

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let conn = self.conn()?;
        queries::get_booking(&conn, id)
    }

    async fn confirm_payment(
        &self,
        booking_id: &str,
        payment: &PaymentConfirmation,
    ) -> anyhow::Result<Booking> {
        let mut conn = self.conn()?;
        queries::confirm_payment(&mut conn, booking_id, payment)
    }

    async fn list_payments(&self, booking_id: &str) -> anyhow::Result<Vec<PaymentRecord>> {
        let conn = self.conn()?;
        queries::list_payments(&conn, booking_id)
    }
}
