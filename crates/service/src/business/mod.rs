//! Business registration: one owner account and one business, written atomically.

pub mod domain;
pub mod registration;

pub use domain::RegisterBusinessInput;
pub use registration::{RegistrationConfig, RegistrationService};
