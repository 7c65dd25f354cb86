use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatus, LedgerStatus, NewBooking, PaymentConfirmation, PaymentRecord,
    PaymentStatus, Service, ServiceCategory,
};

const SERVICE_COLUMNS: &str =
    "id, name, type, description, price, image_url, features, available, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, service_id, customer_name, customer_email, customer_phone, \
     booking_date, booking_details, total_price, payment_status, payment_reference, status, \
     created_at, updated_at";

// ── Services ──

pub fn list_available_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE available = 1 ORDER BY type ASC, name ASC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
            params![id],
            |row| Ok(parse_service_row(row)),
        )
        .optional()?;

    service.transpose()
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let category_str: String = row.get(2)?;
    let price_str: String = row.get(4)?;
    let features_json: String = row.get(6)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        category: ServiceCategory::parse(&category_str)
            .with_context(|| format!("unknown service type: {category_str}"))?,
        description: row.get(3)?,
        price: parse_decimal(&price_str)?,
        image_url: row.get(5)?,
        features: serde_json::from_str(&features_json).context("malformed service features")?,
        available: row.get(7)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &NewBooking) -> anyhow::Result<Booking> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let details_json = serde_json::to_string(&booking.booking_details)?;

    conn.execute(
        "INSERT INTO bookings (id, service_id, customer_name, customer_email, customer_phone, booking_date,
                               booking_details, total_price, payment_status, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            id,
            booking.service_id,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.booking_date.format("%Y-%m-%d").to_string(),
            details_json,
            booking.total_price.to_string(),
            booking.payment_status.as_str(),
            booking.status.as_str(),
            now,
        ],
    )?;

    get_booking(conn, &id)?.context("inserted booking vanished")
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    booking.transpose()
}

/// Marks the booking paid and records the ledger entry. Both writes commit
/// together or not at all.
pub fn confirm_payment(
    conn: &mut Connection,
    booking_id: &str,
    payment: &PaymentConfirmation,
) -> anyhow::Result<Booking> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction()?;

    let updated = tx.execute(
        "UPDATE bookings
         SET payment_status = ?1, payment_reference = ?2, status = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            PaymentStatus::Completed.as_str(),
            payment.reference,
            BookingStatus::Confirmed.as_str(),
            now,
            booking_id,
        ],
    )?;
    anyhow::ensure!(updated > 0, "booking {booking_id} not found");

    tx.execute(
        "INSERT INTO payments (id, booking_id, amount, currency, reference, status, payment_method, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            Uuid::new_v4().to_string(),
            booking_id,
            payment.amount.to_string(),
            payment.currency,
            payment.reference,
            LedgerStatus::Success.as_str(),
            payment.payment_method,
            payment.metadata().to_string(),
            now,
        ],
    )
    .context("failed to record payment")?;

    tx.commit()?;

    get_booking(conn, booking_id)?.context("confirmed booking vanished")
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_date_str: String = row.get(5)?;
    let details_json: String = row.get(6)?;
    let total_price_str: String = row.get(7)?;
    let payment_status_str: String = row.get(8)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        service_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        booking_date: NaiveDate::parse_from_str(&booking_date_str, "%Y-%m-%d")
            .with_context(|| format!("malformed booking date: {booking_date_str}"))?,
        booking_details: serde_json::from_str(&details_json)
            .context("malformed booking details")?,
        total_price: parse_decimal(&total_price_str)?,
        payment_status: PaymentStatus::parse(&payment_status_str),
        payment_reference: row.get(9)?,
        status: BookingStatus::parse(&status_str),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Payments ──

pub fn list_payments(conn: &Connection, booking_id: &str) -> anyhow::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, amount, currency, reference, status, payment_method, metadata, created_at
         FROM payments WHERE booking_id = ?1 ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map(params![booking_id], |row| Ok(parse_payment_row(row)))?;

    let mut payments = vec![];
    for row in rows {
        payments.push(row??);
    }
    Ok(payments)
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<PaymentRecord> {
    let amount_str: String = row.get(2)?;
    let status_str: String = row.get(5)?;
    let metadata_json: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    Ok(PaymentRecord {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        amount: parse_decimal(&amount_str)?,
        currency: row.get(3)?,
        reference: row.get(4)?,
        status: LedgerStatus::parse(&status_str),
        payment_method: row.get(6)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Helpers ──

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("malformed decimal: {s}"))
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("malformed timestamp: {s}"))
}
