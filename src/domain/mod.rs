//! Core domain types and logic.

pub mod candle;
pub mod pivot;
pub mod zone;
pub mod regression;
pub mod channel;
pub mod signal;
pub mod annotation;
pub mod heikin_ashi;
pub mod simulator;
pub mod metrics;
pub mod strategy;
pub mod universe;
pub mod config_validation;
pub mod error;
