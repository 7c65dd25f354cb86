use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::service::ServiceCategory;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub booking_date: NaiveDate,
    pub booking_details: BookingDetails,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_reference: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the `bookings` collection. The store fills in the id and
/// timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub booking_date: NaiveDate,
    pub booking_details: BookingDetails,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
}

/// Category-specific booking details, stored as a JSON object tagged with
/// `serviceType`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "serviceType",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum BookingDetails {
    #[serde(alias = "hotel")]
    Lodging {
        guests: NonZeroU32,
        duration: NonZeroU32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
    Transfer {
        pickup_location: String,
        pickup_time: String,
        passengers: NonZeroU32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
    Guide {
        group_size: NonZeroU32,
        start_time: String,
        duration: NonZeroU32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
    Photography {
        location: String,
        session_time: String,
        duration: NonZeroU32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
}

impl BookingDetails {
    pub fn category(&self) -> ServiceCategory {
        match self {
            BookingDetails::Lodging { .. } => ServiceCategory::Lodging,
            BookingDetails::Transfer { .. } => ServiceCategory::Transfer,
            BookingDetails::Guide { .. } => ServiceCategory::Guide,
            BookingDetails::Photography { .. } => ServiceCategory::Photography,
        }
    }

    /// Nights or hours booked, for categories that record one.
    pub fn duration(&self) -> Option<NonZeroU32> {
        match self {
            BookingDetails::Lodging { duration, .. }
            | BookingDetails::Guide { duration, .. }
            | BookingDetails::Photography { duration, .. } => Some(*duration),
            BookingDetails::Transfer { .. } => None,
        }
    }

    pub fn special_requests(&self) -> Option<&str> {
        match self {
            BookingDetails::Lodging {
                special_requests, ..
            }
            | BookingDetails::Transfer {
                special_requests, ..
            }
            | BookingDetails::Guide {
                special_requests, ..
            }
            | BookingDetails::Photography {
                special_requests, ..
            } => special_requests.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: u32) -> NonZeroU32 {
        NonZeroU32::new(v).unwrap()
    }

    #[test]
    fn test_details_wire_shape() {
        let details = BookingDetails::Transfer {
            pickup_location: "JKIA Terminal 1".to_string(),
            pickup_time: "09:30".to_string(),
            passengers: n(3),
            special_requests: None,
        };

        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "serviceType": "transfer",
                "pickupLocation": "JKIA Terminal 1",
                "pickupTime": "09:30",
                "passengers": 3
            })
        );
    }

    #[test]
    fn test_legacy_hotel_details_parse() {
        let details: BookingDetails = serde_json::from_value(serde_json::json!({
            "serviceType": "hotel",
            "guests": 2,
            "duration": 3,
            "specialRequests": "Late check-in"
        }))
        .unwrap();

        assert_eq!(details.category(), ServiceCategory::Lodging);
        assert_eq!(details.duration(), Some(n(3)));
        assert_eq!(details.special_requests(), Some("Late check-in"));
    }

    #[test]
    fn test_zero_duration_is_unrepresentable() {
        let result: Result<BookingDetails, _> = serde_json::from_value(serde_json::json!({
            "serviceType": "guide",
            "groupSize": 4,
            "startTime": "08:00",
            "duration": 0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_transfer_has_no_duration() {
        let details = BookingDetails::Transfer {
            pickup_location: "Westlands".to_string(),
            pickup_time: "07:00".to_string(),
            passengers: n(1),
            special_requests: Some("Child seat".to_string()),
        };
        assert_eq!(details.duration(), None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(BookingStatus::parse("confirmed"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::parse("bogus"), BookingStatus::Pending);
        assert_eq!(PaymentStatus::parse("refunded"), PaymentStatus::Refunded);
        assert_eq!(PaymentStatus::Completed.as_str(), "completed");
    }
}
