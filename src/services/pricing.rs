use std::num::NonZeroU32;

use rust_decimal::Decimal;

use crate::models::{BookingDetails, Service};

/// Nights or hours the base price is multiplied by. Categories without a
/// duration unit always use 1, whatever the details say.
pub fn duration_multiplier(service: &Service, details: &BookingDetails) -> u32 {
    match service.category.profile().duration_unit {
        Some(_) => details.duration().map_or(1, NonZeroU32::get),
        None => 1,
    }
}

pub fn total_price(service: &Service, details: &BookingDetails) -> Decimal {
    service.price * Decimal::from(duration_multiplier(service, details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceCategory;
    use chrono::Utc;

    fn service(category: ServiceCategory, price: i64) -> Service {
        let now = Utc::now();
        Service {
            id: "svc".to_string(),
            name: "Test service".to_string(),
            category,
            description: String::new(),
            price: Decimal::from(price),
            image_url: String::new(),
            features: vec![],
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn n(v: u32) -> NonZeroU32 {
        NonZeroU32::new(v).unwrap()
    }

    #[test]
    fn test_lodging_three_nights() {
        let details = BookingDetails::Lodging {
            guests: n(2),
            duration: n(3),
            special_requests: None,
        };
        assert_eq!(
            total_price(&service(ServiceCategory::Lodging, 200), &details),
            Decimal::from(600)
        );
    }

    #[test]
    fn test_transfer_is_flat() {
        let details = BookingDetails::Transfer {
            pickup_location: "JKIA".to_string(),
            pickup_time: "10:00".to_string(),
            passengers: n(4),
            special_requests: None,
        };
        assert_eq!(
            total_price(&service(ServiceCategory::Transfer, 50), &details),
            Decimal::from(50)
        );
    }

    #[test]
    fn test_transfer_ignores_stray_duration() {
        // Details from another category still carry a duration; a transfer
        // never scales with it.
        let details = BookingDetails::Guide {
            group_size: n(2),
            start_time: "09:00".to_string(),
            duration: n(8),
            special_requests: None,
        };
        assert_eq!(
            total_price(&service(ServiceCategory::Transfer, 50), &details),
            Decimal::from(50)
        );
    }

    #[test]
    fn test_hourly_categories_scale_with_hours() {
        for (category, details) in [
            (
                ServiceCategory::Guide,
                BookingDetails::Guide {
                    group_size: n(6),
                    start_time: "08:30".to_string(),
                    duration: n(4),
                    special_requests: None,
                },
            ),
            (
                ServiceCategory::Photography,
                BookingDetails::Photography {
                    location: "Karura Forest".to_string(),
                    session_time: "16:00".to_string(),
                    duration: n(4),
                    special_requests: None,
                },
            ),
        ] {
            let svc = service(category, 40);
            assert_eq!(duration_multiplier(&svc, &details), 4);
            assert_eq!(total_price(&svc, &details), Decimal::from(160));
        }
    }

    #[test]
    fn test_mismatched_details_fall_back_to_one() {
        let details = BookingDetails::Transfer {
            pickup_location: "Westlands".to_string(),
            pickup_time: "10:00".to_string(),
            passengers: n(1),
            special_requests: None,
        };
        assert_eq!(
            total_price(&service(ServiceCategory::Lodging, 200), &details),
            Decimal::from(200)
        );
    }

    #[test]
    fn test_fractional_base_price() {
        let mut svc = service(ServiceCategory::Guide, 0);
        svc.price = Decimal::new(2550, 2);
        let details = BookingDetails::Guide {
            group_size: n(1),
            start_time: "08:00".to_string(),
            duration: n(3),
            special_requests: None,
        };
        assert_eq!(total_price(&svc, &details), Decimal::new(7650, 2));
    }
}
