//! Port traits the core talks to.

pub mod candle_port;
pub mod config_port;
pub mod result_sink;
