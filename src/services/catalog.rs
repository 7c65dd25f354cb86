use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::DocumentStore;
use crate::errors::AppError;
use crate::models::Service;
use crate::services::booking_form::BookingForm;
use crate::services::pricing;

/// Bookable services, grouped by category.
pub async fn load_catalog(store: &dyn DocumentStore) -> Result<Vec<Service>, AppError> {
    let mut services = store.list_available_services().await.map_err(|e| {
        tracing::error!(error = %e, "failed to fetch services");
        AppError::Store(e)
    })?;

    services.retain(|s| s.available);
    services.sort_by_key(|s| s.category.as_str());
    Ok(services)
}

pub async fn find_service(store: &dyn DocumentStore, id: &str) -> Result<Service, AppError> {
    store
        .get_service(id)
        .await
        .map_err(AppError::Store)?
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Quote {
    pub service_id: String,
    pub base_price: Decimal,
    pub multiplier: u32,
    pub unit: Option<&'static str>,
    pub total_price: Decimal,
}

/// Price preview for the detail fields filled in so far.
pub async fn quote(
    store: &dyn DocumentStore,
    service_id: &str,
    form: &BookingForm,
) -> Result<Quote, AppError> {
    let service = find_service(store, service_id).await?;
    let details = form.details_for(service.category)?;

    Ok(Quote {
        service_id: service.id.clone(),
        base_price: service.price,
        multiplier: pricing::duration_multiplier(&service, &details),
        unit: service
            .category
            .profile()
            .duration_unit
            .map(|u| u.label()),
        total_price: pricing::total_price(&service, &details),
    })
}
