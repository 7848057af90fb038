//! Business logic services.

pub mod person;
