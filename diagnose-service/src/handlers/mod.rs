//! HTTP handlers for diagnose-service.

pub mod diagnose;
pub mod health;
pub mod metrics;

pub use diagnose::diagnose;
pub use health::{health_check, readiness_check};
