//! The rate engine: applies one node's arithmetic to a running value.
//!
//! Rates and seed values are stored as strings (they come straight from
//! text inputs) and are parsed here, in one place, with one fallback
//! policy.

use serde::{Deserialize, Serialize};

/// The arithmetic kind a node applies to the running value.
///
/// This lives on the node, not on the operation record: the same operation
/// can act as a multiplier in one scenario and a percentage in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RateType {
    #[default]
    #[serde(rename = "MUL")]
    Mul,
    #[serde(rename = "DIV")]
    Div,
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "SUB")]
    Sub,
    // Legacy wire spelling, kept for compatibility with existing exports.
    #[serde(rename = "PLUS_PERC")]
    AddPerc,
    #[serde(rename = "SUB_PERC")]
    SubPerc,
}

/// Parses a rate operand string.
///
/// Empty, unparsable, or NaN input falls back to `1.0` — for every rate
/// type, including the additive ones. An empty rate means "adjust by 1",
/// never "do nothing"; this matches the historical data the engine has to
/// reproduce.
pub fn parse_rate_operand(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 1.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if !v.is_nan() => v,
        _ => 1.0,
    }
}

/// Parses a scenario's seed value. Unlike rate operands, a missing or
/// unparsable seed defaults to `0.0`.
pub fn parse_seed(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// Applies one rate step to `input`. Pure; never fails — malformed
/// operands degrade through [`parse_rate_operand`].
pub fn apply_rate(rate_type: RateType, operand: &str, input: f64) -> f64 {
    let rate = parse_rate_operand(operand);
    match rate_type {
        RateType::Mul => input * rate,
        RateType::Div => input / rate,
        RateType::Add => input + rate,
        RateType::Sub => input - rate,
        RateType::AddPerc => input * (1.0 + rate / 100.0),
        RateType::SubPerc => input * (1.0 - rate / 100.0),
    }
}
