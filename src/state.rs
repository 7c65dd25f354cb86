use crate::config::AppConfig;
use crate::db::DocumentStore;
use crate::services::payments::PaymentGateway;
use crate::services::sessions::SessionRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub store: Box<dyn DocumentStore>,
    /// `None` when no gateway credential is configured.
    pub payments: Option<Box<dyn PaymentGateway>>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn gateway(&self) -> Option<&dyn PaymentGateway> {
        self.payments.as_deref()
    }
}
