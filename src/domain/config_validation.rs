//! Builds a validated `StopConfig` from a configuration source.
//!
//! Missing keys take the standard values; present keys must parse and pass
//! `StopConfig::new`.

use crate::domain::config::{StopConfig, StopParams};
use crate::domain::error::StopError;
use crate::domain::indicator::AtrMethod;
use crate::domain::regime::RegimeTable;
use crate::domain::stop_history::ChannelParams;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub fn build_stop_config(config: &dyn ConfigPort) -> Result<StopConfig, StopError> {
    let defaults = StopParams::default();

    let atr_period = positive_int(config, "atr", "period", defaults.atr_period)?;
    let display_periods = match config.get_list("atr", "display_periods") {
        Some(items) => parse_items::<usize>(&items, "atr", "display_periods")?,
        None => defaults.display_periods,
    };
    let method = match config.get_string("atr", "method") {
        Some(raw) => AtrMethod::from_str(&raw).map_err(|e| invalid("atr", "method", e))?,
        None => defaults.method,
    };

    let thresholds = match config.get_list("regime", "thresholds") {
        Some(items) => four(&items, "thresholds")?,
        None => [25.0, 75.0, 90.0, 100.0],
    };
    let multipliers = match config.get_list("regime", "multipliers") {
        Some(items) => four(&items, "multipliers")?,
        None => [1.5, 2.0, 2.5, 3.0],
    };
    let regime_table = RegimeTable::new(thresholds, multipliers).map_err(|e| {
        let key = match &e {
            StopError::InvalidConfig { field, .. } if field.ends_with("multipliers") => {
                "multipliers"
            }
            _ => "thresholds",
        };
        invalid("regime", key, e)
    })?;
    let regime_lookback = positive_int(config, "regime", "lookback_days", defaults.regime_lookback)?;
    let use_regime_adjustment = config.get_bool("regime", "adjust", defaults.use_regime_adjustment)?;

    let base_multiplier = config.get_double("stop", "base_multiplier", defaults.base_multiplier)?;
    let recent_high_lookback = positive_int(
        config,
        "stop",
        "recent_high_lookback",
        defaults.recent_high_lookback,
    )?;

    let risk_amounts = match config.get_list("sizing", "risk_amounts") {
        Some(items) => parse_items::<f64>(&items, "sizing", "risk_amounts")?,
        None => defaults.risk_amounts,
    };

    StopConfig::new(StopParams {
        atr_period,
        display_periods,
        method,
        regime_table,
        regime_lookback,
        use_regime_adjustment,
        base_multiplier,
        recent_high_lookback,
        risk_amounts,
    })
}

/// `[channels]` keys → `ChannelParams`, standard values for missing keys.
pub fn build_channel_params(config: &dyn ConfigPort) -> Result<ChannelParams, StopError> {
    let defaults = ChannelParams::default();
    let params = ChannelParams {
        chandelier_atr_period: positive_int(
            config,
            "channels",
            "chandelier_atr_period",
            defaults.chandelier_atr_period,
        )?,
        chandelier_lookback: positive_int(
            config,
            "channels",
            "chandelier_lookback",
            defaults.chandelier_lookback,
        )?,
        chandelier_multiplier: config.get_double(
            "channels",
            "chandelier_multiplier",
            defaults.chandelier_multiplier,
        )?,
        keltner_ema_period: positive_int(
            config,
            "channels",
            "keltner_ema_period",
            defaults.keltner_ema_period,
        )?,
        keltner_atr_period: positive_int(
            config,
            "channels",
            "keltner_atr_period",
            defaults.keltner_atr_period,
        )?,
        keltner_multiplier: config.get_double(
            "channels",
            "keltner_multiplier",
            defaults.keltner_multiplier,
        )?,
    };
    params.validate().map_err(|e| match e {
        StopError::InvalidConfig { field, reason } => {
            invalid("channels", &field.replace(' ', "_"), reason)
        }
        other => other,
    })?;
    Ok(params)
}

fn invalid(section: &str, key: &str, err: impl ToString) -> StopError {
    StopError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: err.to_string(),
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, StopError> {
    let value = config.get_int(section, key, default as i64)?;
    if value < 1 {
        return Err(invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(value as usize)
}

fn parse_items<T: FromStr>(items: &[String], section: &str, key: &str) -> Result<Vec<T>, StopError> {
    items
        .iter()
        .map(|item| {
            item.parse::<T>()
                .map_err(|_| invalid(section, key, format!("cannot parse '{item}'")))
        })
        .collect()
}

fn four(items: &[String], key: &str) -> Result<[f64; 4], StopError> {
    let values = parse_items::<f64>(items, "regime", key)?;
    <[f64; 4]>::try_from(values).map_err(|v| {
        invalid(
            "regime",
            key,
            format!("expected 4 values (low, normal, elevated, extreme), got {}", v.len()),
        )
    })
}
