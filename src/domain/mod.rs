//! Core engine: ATR, volatility regime, trailing stop, sizing and the
//! recommendation pipeline. Pure and synchronous; no I/O.

pub mod ohlcv;
pub mod indicator;
pub mod regime;
pub mod trailing_stop;
pub mod sizing;
pub mod config;
pub mod config_validation;
pub mod recommender;
pub mod stop_history;
pub mod watchlist;
pub mod error;
