use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Browsing,
    Booking,
    Payment,
    Confirmation,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Browsing => "browsing",
            WorkflowState::Booking => "booking",
            WorkflowState::Payment => "payment",
            WorkflowState::Confirmation => "confirmation",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published on every successful transition.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub action: &'static str,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub at: DateTime<Utc>,
}
