use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ContactInfo;
use crate::models::{Booking, DetailField, Service};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

/// What the customer sees once payment has gone through.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfirmationView {
    pub booking_id: String,
    pub service_name: String,
    /// e.g. "Tuesday, June 16, 2026".
    pub date: String,
    pub status: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub details: Vec<DetailEntry>,
    pub total_paid: Decimal,
    pub payment_reference: Option<String>,
    pub next_steps: String,
}

impl ConfirmationView {
    pub fn new(booking: &Booking, service: &Service, contact: &ContactInfo) -> Self {
        Self {
            booking_id: booking.id.clone(),
            service_name: service.name.clone(),
            date: booking.booking_date.format("%A, %B %-d, %Y").to_string(),
            status: capitalize(booking.status.as_str()),
            customer_email: booking.customer_email.clone(),
            customer_phone: booking.customer_phone.clone(),
            details: detail_entries(booking),
            total_paid: booking.total_price,
            payment_reference: booking.payment_reference.clone(),
            next_steps: format!(
                "A confirmation email has been sent to {}. Our team will contact you shortly \
                 to finalize the arrangements. You can reach us at {} or {} for any questions.",
                booking.customer_email, contact.email, contact.phone
            ),
        }
    }
}

/// One entry per form field of the booking's category, labelled and ordered
/// the way the form shows them, then any special requests.
fn detail_entries(booking: &Booking) -> Vec<DetailEntry> {
    let details = &booking.booking_details;
    let Ok(serde_json::Value::Object(map)) = serde_json::to_value(details) else {
        return vec![];
    };
    let profile = details.category().profile();

    let mut entries: Vec<DetailEntry> = profile
        .fields
        .iter()
        .filter_map(|field| {
            let value = match map.get(field.key())? {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let value = match (field, profile.duration_unit) {
                (DetailField::Duration, Some(unit)) => format!("{value} {}", unit.label()),
                _ => value,
            };
            Some(DetailEntry {
                label: field.label().to_string(),
                value,
            })
        })
        .collect();

    if let Some(requests) = details.special_requests() {
        entries.push(DetailEntry {
            label: "Special Requests".to_string(),
            value: requests.to_string(),
        });
    }
    entries
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingDetails, BookingStatus, PaymentStatus, ServiceCategory};
    use chrono::{NaiveDate, Utc};
    use std::num::NonZeroU32;

    fn fixture() -> (Booking, Service) {
        let now = Utc::now();
        let service = Service {
            id: "svc-airport-transfer".to_string(),
            name: "Airport Transfer".to_string(),
            category: ServiceCategory::Transfer,
            description: String::new(),
            price: Decimal::from(50),
            image_url: String::new(),
            features: vec![],
            available: true,
            created_at: now,
            updated_at: now,
        };
        let booking = Booking {
            id: "b-1".to_string(),
            service_id: service.id.clone(),
            customer_name: "Amina Wanjiru".to_string(),
            customer_email: "amina@example.com".to_string(),
            customer_phone: "+254700000001".to_string(),
            booking_date: NaiveDate::from_ymd_opt(2026, 6, 16).unwrap(),
            booking_details: BookingDetails::Transfer {
                pickup_location: "JKIA Terminal 1".to_string(),
                pickup_time: "09:30".to_string(),
                passengers: NonZeroU32::new(3).unwrap(),
                special_requests: Some("Child seat".to_string()),
            },
            total_price: Decimal::from(50),
            payment_status: PaymentStatus::Completed,
            payment_reference: Some("WWT-1-abcdefghi".to_string()),
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };
        (booking, service)
    }

    #[test]
    fn test_confirmation_view() {
        let (booking, service) = fixture();
        let view = ConfirmationView::new(&booking, &service, &ContactInfo::default());

        assert_eq!(view.service_name, "Airport Transfer");
        assert_eq!(view.date, "Tuesday, June 16, 2026");
        assert_eq!(view.status, "Confirmed");
        assert_eq!(view.total_paid, Decimal::from(50));
        assert_eq!(view.payment_reference.as_deref(), Some("WWT-1-abcdefghi"));
        assert!(view.next_steps.contains("amina@example.com"));
        assert!(view.next_steps.contains("whisperwild@gmail.com"));
    }

    #[test]
    fn test_detail_labels_follow_the_form() {
        let (booking, service) = fixture();
        let view = ConfirmationView::new(&booking, &service, &ContactInfo::default());

        let labels: Vec<&str> = view.details.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Pickup Location", "Pickup Time", "Passengers", "Special Requests"]
        );
        assert_eq!(view.details[0].value, "JKIA Terminal 1");
        assert_eq!(view.details[2].value, "3");
        assert_eq!(view.details[3].value, "Child seat");
    }

    #[test]
    fn test_lodging_details_use_form_labels() {
        let (mut booking, service) = fixture();
        booking.booking_details = BookingDetails::Lodging {
            guests: NonZeroU32::new(2).unwrap(),
            duration: NonZeroU32::new(3).unwrap(),
            special_requests: None,
        };
        let view = ConfirmationView::new(&booking, &service, &ContactInfo::default());

        assert_eq!(
            view.details,
            vec![
                DetailEntry {
                    label: "Number of Guests".to_string(),
                    value: "2".to_string(),
                },
                DetailEntry {
                    label: "Duration".to_string(),
                    value: "3 Nights".to_string(),
                },
            ]
        );
    }
}
