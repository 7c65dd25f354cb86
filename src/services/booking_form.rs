use std::num::NonZeroU32;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use crate::models::{
    BookingDetails, BookingStatus, DetailField, FieldKind, NewBooking, PaymentStatus, Service,
    ServiceCategory,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),

    #[error("booking date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),

    #[error("booking date {0} is in the past")]
    DateInPast(NaiveDate),

    #[error("{field} must be a whole number of at least 1, got {value:?}")]
    NotPositive { field: &'static str, value: String },

    #[error("{field} must be a time of day as HH:MM, got {value:?}")]
    InvalidTime { field: &'static str, value: String },

    #[error("details do not fit the {category} form: {reason}")]
    Malformed {
        category: &'static str,
        reason: String,
    },
}

/// Booking form as submitted. Category inputs are shared between categories and
/// read according to the service's [`crate::models::CategoryProfile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub booking_date: String,
    /// Guests, passengers or group size.
    #[serde(default, deserialize_with = "lenient_string")]
    pub guests: Option<String>,
    /// Pickup or shoot location.
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    /// Pickup, start or session time.
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    /// Nights or hours.
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// A validated form, ready to be priced and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub booking_date: NaiveDate,
    pub details: BookingDetails,
}

impl BookingDraft {
    pub fn into_new_booking(self, service: &Service, total_price: Decimal) -> NewBooking {
        NewBooking {
            service_id: service.id.clone(),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            booking_date: self.booking_date,
            booking_details: self.details,
            total_price,
            payment_status: PaymentStatus::Pending,
            status: BookingStatus::Pending,
        }
    }
}

impl BookingForm {
    pub fn validate(
        &self,
        service: &Service,
        today: NaiveDate,
    ) -> Result<BookingDraft, ValidationError> {
        let customer_name = required(Some(&self.customer_name), "Full Name")?;
        let customer_email = required(Some(&self.customer_email), "Email")?;
        if !looks_like_email(&customer_email) {
            return Err(ValidationError::InvalidEmail(customer_email));
        }
        let customer_phone = required(Some(&self.customer_phone), "Phone Number")?;

        let date_str = required(Some(&self.booking_date), "Booking Date")?;
        let booking_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date_str.clone()))?;
        if booking_date < today {
            return Err(ValidationError::DateInPast(booking_date));
        }

        Ok(BookingDraft {
            customer_name,
            customer_email,
            customer_phone,
            booking_date,
            details: self.details_for(service.category)?,
        })
    }

    /// Assembles the details object for `category`: `serviceType`, exactly the
    /// fields its profile lists, and `specialRequests` when given.
    pub fn details_for(&self, category: ServiceCategory) -> Result<BookingDetails, ValidationError> {
        let profile = category.profile();
        let mut map = Map::new();
        map.insert("serviceType".to_string(), json!(category.as_str()));

        for field in profile.fields {
            let value = match field.kind() {
                FieldKind::Count => json!(positive(self.guests.as_deref(), *field)?.get()),
                FieldKind::Duration => json!(positive(self.duration.as_deref(), *field)?.get()),
                FieldKind::Place => json!(required(self.location.as_ref(), field.label())?),
                FieldKind::TimeOfDay => json!(time_of_day(self.time.as_deref(), *field)?),
            };
            map.insert(field.key().to_string(), value);
        }

        if let Some(requests) = self
            .special_requests
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            map.insert("specialRequests".to_string(), json!(requests));
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| ValidationError::Malformed {
            category: category.as_str(),
            reason: e.to_string(),
        })
    }
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, ValidationError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::Missing(field)),
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Blank counts and durations fall back to 1, the form's pre-filled value.
/// Anything else must parse to a positive integer.
fn positive(value: Option<&str>, field: DetailField) -> Result<NonZeroU32, ValidationError> {
    let raw = value.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(NonZeroU32::MIN);
    }
    raw.parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| ValidationError::NotPositive {
            field: field.label(),
            value: raw.to_string(),
        })
}

fn time_of_day(value: Option<&str>, field: DetailField) -> Result<String, ValidationError> {
    let raw = value.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(ValidationError::Missing(field.label()));
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ValidationError::InvalidTime {
            field: field.label(),
            value: raw.to_string(),
        })
}

// Browsers post numbers as strings; JSON clients may send real numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
