//! volstop: volatility-adaptive trailing stops and position sizing.
//!
//! Hexagonal architecture: the pure engine in [`domain`], capability traits
//! in [`ports`], concrete price sources and renderers in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
