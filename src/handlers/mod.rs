pub mod catalog;
pub mod health;
pub mod sessions;
pub mod webhook;
