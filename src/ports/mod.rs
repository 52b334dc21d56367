//! Capability traits the core consumes or exposes.

pub mod config_port;
pub mod price_history;
pub mod report_port;
