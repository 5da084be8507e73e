//! Diagnose Service - AI-assisted first diagnosis for bicycle repairs.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
