use std::env;
use std::path::PathBuf;

use crate::services::workflow::SessionSettings;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Supabase,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub migrations_dir: PathBuf,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Empty means payments are switched off.
    pub paystack_secret_key: String,
    pub paystack_callback_url: Option<String>,
    pub currency: String,
    pub reference_prefix: String,
    pub session_idle_minutes: i64,
    pub business_name: String,
    pub contact: ContactInfo,
}

/// Business contact details shown on the confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            email: "whisperwild@gmail.com".to_string(),
            phone: "+254 741 060 289".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let contact = ContactInfo::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("supabase") => StoreBackend::Supabase,
                _ => StoreBackend::Sqlite,
            },
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "tourdesk.db".to_string()),
            migrations_dir: env::var("MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("migrations")),
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY").unwrap_or_default(),
            paystack_callback_url: env::var("PAYSTACK_CALLBACK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            reference_prefix: env::var("PAYMENT_REFERENCE_PREFIX")
                .unwrap_or_else(|_| "WWT".to_string()),
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| "Whisperwild Tours".to_string()),
            contact: ContactInfo {
                email: env::var("CONTACT_EMAIL").unwrap_or(contact.email),
                phone: env::var("CONTACT_PHONE").unwrap_or(contact.phone),
            },
        }
    }

    pub fn payments_enabled(&self) -> bool {
        !self.paystack_secret_key.is_empty()
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            currency: self.currency.clone(),
            reference_prefix: self.reference_prefix.clone(),
        }
    }
}
