//! Per-category booking rules.
//!
//! Every place that needs to know which detail fields a category collects, or
//! whether its price scales with a duration, reads [`CategoryProfile`] instead of
//! matching on the category itself.

use super::service::ServiceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Nights,
    Hours,
}

impl DurationUnit {
    pub fn label(&self) -> &'static str {
        match self {
            DurationUnit::Nights => "Nights",
            DurationUnit::Hours => "Hours",
        }
    }
}

/// Which raw form input a detail field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Positive head count (`guests` input).
    Count,
    /// Free-text place (`location` input).
    Place,
    /// `HH:MM` time of day (`time` input).
    TimeOfDay,
    /// Positive number of nights or hours (`duration` input).
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Guests,
    Passengers,
    GroupSize,
    PickupLocation,
    ShootLocation,
    PickupTime,
    StartTime,
    SessionTime,
    Duration,
}

impl DetailField {
    /// Key used in the stored booking-details object.
    pub fn key(&self) -> &'static str {
        match self {
            DetailField::Guests => "guests",
            DetailField::Passengers => "passengers",
            DetailField::GroupSize => "groupSize",
            DetailField::PickupLocation => "pickupLocation",
            DetailField::ShootLocation => "location",
            DetailField::PickupTime => "pickupTime",
            DetailField::StartTime => "startTime",
            DetailField::SessionTime => "sessionTime",
            DetailField::Duration => "duration",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetailField::Guests => "Number of Guests",
            DetailField::Passengers => "Passengers",
            DetailField::GroupSize => "Group Size",
            DetailField::PickupLocation => "Pickup Location",
            DetailField::ShootLocation => "Location",
            DetailField::PickupTime => "Pickup Time",
            DetailField::StartTime => "Start Time",
            DetailField::SessionTime => "Session Time",
            DetailField::Duration => "Duration",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            DetailField::Guests | DetailField::Passengers | DetailField::GroupSize => {
                FieldKind::Count
            }
            DetailField::PickupLocation | DetailField::ShootLocation => FieldKind::Place,
            DetailField::PickupTime | DetailField::StartTime | DetailField::SessionTime => {
                FieldKind::TimeOfDay
            }
            DetailField::Duration => FieldKind::Duration,
        }
    }
}

#[derive(Debug)]
pub struct CategoryProfile {
    pub category: ServiceCategory,
    pub label: &'static str,
    pub fields: &'static [DetailField],
    /// `Some` when the base price is multiplied by the booked duration.
    pub duration_unit: Option<DurationUnit>,
}

impl CategoryProfile {
    pub fn has_field(&self, field: DetailField) -> bool {
        self.fields.contains(&field)
    }
}

static LODGING: CategoryProfile = CategoryProfile {
    category: ServiceCategory::Lodging,
    label: "Lodging",
    fields: &[DetailField::Guests, DetailField::Duration],
    duration_unit: Some(DurationUnit::Nights),
};

static TRANSFER: CategoryProfile = CategoryProfile {
    category: ServiceCategory::Transfer,
    label: "Transfer",
    fields: &[
        DetailField::PickupLocation,
        DetailField::PickupTime,
        DetailField::Passengers,
    ],
    duration_unit: None,
};

static GUIDE: CategoryProfile = CategoryProfile {
    category: ServiceCategory::Guide,
    label: "Tour Guide",
    fields: &[
        DetailField::GroupSize,
        DetailField::StartTime,
        DetailField::Duration,
    ],
    duration_unit: Some(DurationUnit::Hours),
};

static PHOTOGRAPHY: CategoryProfile = CategoryProfile {
    category: ServiceCategory::Photography,
    label: "Photography",
    fields: &[
        DetailField::ShootLocation,
        DetailField::SessionTime,
        DetailField::Duration,
    ],
    duration_unit: Some(DurationUnit::Hours),
};

impl ServiceCategory {
    pub fn profile(&self) -> &'static CategoryProfile {
        match self {
            ServiceCategory::Lodging => &LODGING,
            ServiceCategory::Transfer => &TRANSFER,
            ServiceCategory::Guide => &GUIDE,
            ServiceCategory::Photography => &PHOTOGRAPHY,
        }
    }
}
