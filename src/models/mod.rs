//! Database models and DTOs.

pub mod pagination;
pub mod person;
