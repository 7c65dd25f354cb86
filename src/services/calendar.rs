use chrono::Duration;

use crate::models::{Booking, DurationUnit, Service};

/// All-day calendar event for a confirmed booking. Lodging spans its nights;
/// everything else occupies the booking date.
pub fn generate_ics(booking: &Booking, service: &Service, business_name: &str) -> String {
    let days = match service.category.profile().duration_unit {
        Some(DurationUnit::Nights) => booking
            .booking_details
            .duration()
            .map_or(1, |n| i64::from(n.get())),
        _ => 1,
    };

    let dtstart = booking.booking_date.format("%Y%m%d").to_string();
    let dtend = (booking.booking_date + Duration::days(days))
        .format("%Y%m%d")
        .to_string();
    let dtstamp = booking.updated_at.format("%Y%m%dT%H%M%SZ").to_string();
    let uid = format!("{}@tourdesk", booking.id);

    let summary = escape_text(&format!("{} with {}", service.name, business_name));
    let mut description = format!("Booked for {}", booking.customer_name);
    if let Some(reference) = &booking.payment_reference {
        description.push_str(&format!(". Payment reference: {reference}"));
    }
    if let Some(requests) = booking.booking_details.special_requests() {
        description.push_str(&format!(". Requests: {requests}"));
    }
    let description = escape_text(&description);

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Tourdesk//Booking Confirmation//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART;VALUE=DATE:{dtstart}\r\n\
         DTEND;VALUE=DATE:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:CONFIRMED\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingDetails, BookingStatus, PaymentStatus, ServiceCategory};
    use chrono::{DateTime, NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::num::NonZeroU32;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T10:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn service(category: ServiceCategory, name: &str) -> Service {
        Service {
            id: "svc".to_string(),
            name: name.to_string(),
            category,
            description: String::new(),
            price: Decimal::from(200),
            image_url: String::new(),
            features: vec![],
            available: true,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn booking(details: BookingDetails) -> Booking {
        Booking {
            id: "test-123".to_string(),
            service_id: "svc".to_string(),
            customer_name: "Amina".to_string(),
            customer_email: "amina@example.com".to_string(),
            customer_phone: "+254700000001".to_string(),
            booking_date: NaiveDate::from_ymd_opt(2026, 6, 16).unwrap(),
            booking_details: details,
            total_price: Decimal::from(600),
            payment_status: PaymentStatus::Completed,
            payment_reference: Some("WWT-1-abcdefghi".to_string()),
            status: BookingStatus::Confirmed,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn test_lodging_spans_nights() {
        let b = booking(BookingDetails::Lodging {
            guests: NonZeroU32::new(2).unwrap(),
            duration: NonZeroU32::new(3).unwrap(),
            special_requests: None,
        });
        let ics = generate_ics(&b, &service(ServiceCategory::Lodging, "Mara Lodge"), "Whisperwild Tours");

        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("UID:test-123@tourdesk"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20260616"));
        assert!(ics.contains("DTEND;VALUE=DATE:20260619"));
        assert!(ics.contains("DTSTAMP:20260310T100000Z"));
        assert!(ics.contains("SUMMARY:Mara Lodge with Whisperwild Tours"));
        assert!(ics.contains("Payment reference: WWT-1-abcdefghi"));
    }

    #[test]
    fn test_hourly_service_is_single_day() {
        let b = booking(BookingDetails::Guide {
            group_size: NonZeroU32::new(4).unwrap(),
            start_time: "08:00".to_string(),
            duration: NonZeroU32::new(6).unwrap(),
            special_requests: Some("Lunch, please; vegetarian".to_string()),
        });
        let ics = generate_ics(&b, &service(ServiceCategory::Guide, "City Guide"), "Whisperwild Tours");

        assert!(ics.contains("DTEND;VALUE=DATE:20260617"));
        assert!(ics.contains("Requests: Lunch\\, please\\; vegetarian"));
    }
}
