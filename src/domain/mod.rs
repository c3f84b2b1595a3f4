//! Core domain types and logic: deviation scoring, allocation and the
//! dashboard snapshot built from them.

pub mod series;
pub mod window;
pub mod deviation;
pub mod allocation;
pub mod universe;
pub mod dashboard;
pub mod config_validation;
pub mod error;
