use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: ServiceCategory,
    #[serde(default)]
    pub description: String,
    /// Base price before the duration multiplier.
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    // Older catalog rows still say "hotel".
    #[serde(alias = "hotel")]
    Lodging,
    Transfer,
    Guide,
    Photography,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Lodging,
        ServiceCategory::Transfer,
        ServiceCategory::Guide,
        ServiceCategory::Photography,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Lodging => "lodging",
            ServiceCategory::Transfer => "transfer",
            ServiceCategory::Guide => "guide",
            ServiceCategory::Photography => "photography",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lodging" | "hotel" => Some(ServiceCategory::Lodging),
            "transfer" => Some(ServiceCategory::Transfer),
            "guide" => Some(ServiceCategory::Guide),
            "photography" => Some(ServiceCategory::Photography),
            _ => None,
        }
    }
}
