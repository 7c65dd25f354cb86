pub mod booking_form;
pub mod calendar;
pub mod catalog;
pub mod confirmation;
pub mod payments;
pub mod pricing;
pub mod sessions;
pub mod workflow;
