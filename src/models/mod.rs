pub mod booking;
pub mod category;
pub mod payment;
pub mod service;
pub mod workflow;

pub use booking::{Booking, BookingDetails, BookingStatus, NewBooking, PaymentStatus};
pub use category::{CategoryProfile, DetailField, DurationUnit, FieldKind};
pub use payment::{LedgerStatus, PaymentConfirmation, PaymentRecord};
pub use service::{Service, ServiceCategory};
pub use workflow::{SessionEvent, WorkflowState};
