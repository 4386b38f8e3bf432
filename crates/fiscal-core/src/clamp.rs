//! Range enforcement for every bounded indicator.

use contracts::BudgetState;
use thiserror::Error;

use crate::derived::debt_interest_for_yield;

pub const INFLATION_RANGE: (f64, f64) = (0.0, 20.0);
pub const GILT_YIELD_RANGE: (f64, f64) = (0.5, 15.0);
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);

/// Tolerance for comparing the derived debt-interest line with its formula.
const COUPLING_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("{field}={value} outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("pending impact #{index} has ticks_remaining=0")]
    ExpiredImpact { index: usize },
    #[error("debt interest line is missing")]
    MissingDebtInterest,
    #[error("debt interest {actual} does not match gilt yield (expected {expected})")]
    DebtInterestDrift { actual: f64, expected: f64 },
}

/// Clamp into `[min, max]`. NaN collapses to `min` so the result is always in range.
pub fn clamp_to(value: f64, (min, max): (f64, f64)) -> f64 {
    value.max(min).min(max)
}

pub fn clamp_state(state: &mut BudgetState) {
    state.inflation = clamp_to(state.inflation, INFLATION_RANGE);
    state.gilt_yield = clamp_to(state.gilt_yield, GILT_YIELD_RANGE);
    state.public_mood = clamp_to(state.public_mood, PERCENT_RANGE);
    state.market_confidence = clamp_to(state.market_confidence, PERCENT_RANGE);
    state.political_capital = clamp_to(state.political_capital, PERCENT_RANGE);
}

pub fn check_invariants(state: &BudgetState) -> Result<(), InvariantViolation> {
    check_range("inflation", state.inflation, INFLATION_RANGE)?;
    check_range("gilt_yield", state.gilt_yield, GILT_YIELD_RANGE)?;
    check_range("public_mood", state.public_mood, PERCENT_RANGE)?;
    check_range("market_confidence", state.market_confidence, PERCENT_RANGE)?;
    check_range("political_capital", state.political_capital, PERCENT_RANGE)?;
    check_finite("gdp", state.gdp)?;
    check_finite("total_expenditure", state.total_expenditure())?;
    check_finite("total_revenue", state.total_revenue())?;
    for impact in &state.pending_impacts {
        check_finite("pending_impact", impact.delta)?;
    }

    if let Some(index) = state
        .pending_impacts
        .iter()
        .position(|impact| impact.ticks_remaining == 0)
    {
        return Err(InvariantViolation::ExpiredImpact { index });
    }

    let actual = state
        .debt_interest()
        .ok_or(InvariantViolation::MissingDebtInterest)?;
    let expected = debt_interest_for_yield(state.gilt_yield);
    if (actual - expected).abs() > COUPLING_EPSILON {
        return Err(InvariantViolation::DebtInterestDrift { actual, expected });
    }

    Ok(())
}

fn check_finite(field: &'static str, value: f64) -> Result<(), InvariantViolation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvariantViolation::NonFinite { field, value })
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), InvariantViolation> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(InvariantViolation::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
