//! Macro feedback recomputed after every edit: spending pressure drives
//! inflation, inflation and deficit drive the gilt yield, and the gilt yield
//! sets the debt interest bill.

use contracts::{BudgetState, LedgerSide, NarrativeEvent, DEBT_INTEREST_ID};
use rand::Rng;

use crate::clamp::clamp_state;
use crate::narrative::{compose, roll_exceeds, NarrativeBucket, DEFICIT_MARKET_ROLL};

/// Spending level at which inflation sits at its 2% floor term.
pub const BASELINE_SPENDING: f64 = 1200.0;
pub const INFLATION_BASE: f64 = 2.0;
pub const INFLATION_PRESSURE_SCALE: f64 = 80.0;
/// Inflation above which the central bank pushes yields up.
pub const INFLATION_TOLERANCE: f64 = 4.0;
pub const RATE_REACTION: f64 = 0.03;

pub const NEUTRAL_GILT_YIELD: f64 = 4.2;
pub const BASE_DEBT_INTEREST: f64 = 100.0;
pub const DEBT_INTEREST_SENSITIVITY: f64 = 10.0;

/// Deficit (% of GDP) above which bond markets sell off.
pub const DEFICIT_ALARM_PCT: f64 = 5.0;
/// Deficit (% of GDP) below which markets reward prudence.
pub const DEFICIT_PRUDENT_PCT: f64 = 3.0;
pub const CONFIDENCE_RECOVERY_CEILING: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedIndicators {
    pub total_expenditure: f64,
    pub total_revenue: f64,
    pub deficit: f64,
    pub deficit_pct_gdp: f64,
}

pub fn debt_interest_for_yield(gilt_yield: f64) -> f64 {
    BASE_DEBT_INTEREST + (gilt_yield - NEUTRAL_GILT_YIELD) * DEBT_INTEREST_SENSITIVITY
}

pub fn inflation_for(total_expenditure: f64, gdp: f64) -> f64 {
    let spending_pressure = (total_expenditure - BASELINE_SPENDING) / gdp;
    (INFLATION_BASE + spending_pressure * INFLATION_PRESSURE_SCALE).max(0.0)
}

/// Recompute the derived fields of `state` in place, appending any market
/// headline to `events`. Leaves every bounded field clamped.
pub fn recompute<R: Rng + ?Sized>(
    state: &mut BudgetState,
    events: &mut Vec<NarrativeEvent>,
    rng: &mut R,
) -> DerivedIndicators {
    let total_expenditure = state.total_expenditure();
    let total_revenue = state.total_revenue();
    let deficit = total_expenditure - total_revenue;
    let deficit_pct_gdp = deficit / state.gdp * 100.0;

    state.inflation = inflation_for(total_expenditure, state.gdp);

    if state.inflation > INFLATION_TOLERANCE {
        state.gilt_yield += (state.inflation - INFLATION_TOLERANCE) * RATE_REACTION;
    }

    if deficit_pct_gdp > DEFICIT_ALARM_PCT {
        state.gilt_yield += 0.05;
        state.market_confidence -= 1.0;
        if roll_exceeds(rng, DEFICIT_MARKET_ROLL) {
            events.push(compose(NarrativeBucket::Market, "", deficit, rng));
        }
    } else if deficit_pct_gdp < DEFICIT_PRUDENT_PCT {
        if state.gilt_yield > NEUTRAL_GILT_YIELD {
            state.gilt_yield -= 0.02;
        }
        if state.market_confidence < CONFIDENCE_RECOVERY_CEILING {
            state.market_confidence += 1.0;
        }
    } else if state.gilt_yield > NEUTRAL_GILT_YIELD {
        state.gilt_yield -= 0.01;
    }

    clamp_state(state);

    let debt_interest = debt_interest_for_yield(state.gilt_yield);
    if let Some(item) = state
        .items_mut(LedgerSide::Expenditure)
        .iter_mut()
        .find(|item| item.id == DEBT_INTEREST_ID)
    {
        item.value = debt_interest;
    }

    DerivedIndicators {
        total_expenditure,
        total_revenue,
        deficit,
        deficit_pct_gdp,
    }
}

#[cfg(test)]
mod tests {
    use contracts::NarrativeKind;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::init::baseline;

    fn set_line(state: &mut BudgetState, side: LedgerSide, id: &str, value: f64) {
        state
            .items_mut(side)
            .iter_mut()
            .find(|item| item.id == id)
            .expect("line exists")
            .value = value;
    }

    #[test]
    fn baseline_sits_in_the_middle_band() {
        let mut state = baseline();
        let mut events = Vec::new();
        let derived = recompute(&mut state, &mut events, &mut StepRng::new(0, 0));

        assert_eq!(derived.deficit, 95.0);
        assert!(derived.deficit_pct_gdp > DEFICIT_PRUDENT_PCT);
        assert!(derived.deficit_pct_gdp < DEFICIT_ALARM_PCT);
        assert!((state.inflation - (2.0 - 5.0 / 2800.0 * 80.0)).abs() < 1e-9);
        assert_eq!(state.gilt_yield, 4.2);
        assert_eq!(state.debt_interest(), Some(100.0));
        assert!(events.is_empty());
    }

    #[test]
    fn inflation_spiral_raises_yield_and_debt_interest() {
        let mut state = baseline();
        set_line(&mut state, LedgerSide::Expenditure, "Other Services", 520.0);
        let mut events = Vec::new();
        recompute(&mut state, &mut events, &mut StepRng::new(0, 0));

        let expected_inflation = inflation_for(1335.0, 2800.0);
        assert!((state.inflation - expected_inflation).abs() < 1e-9);
        let expected_yield = 4.2 + (expected_inflation - 4.0) * RATE_REACTION + 0.05;
        assert!((state.gilt_yield - expected_yield).abs() < 1e-9);
        assert_eq!(
            state.debt_interest(),
            Some(debt_interest_for_yield(state.gilt_yield))
        );
        assert_eq!(state.market_confidence, 79.0);
    }

    #[test]
    fn deficit_alarm_headline_depends_on_roll() {
        let mut state = baseline();
        set_line(&mut state, LedgerSide::Revenue, "Income Tax", 200.0);

        let mut quiet = Vec::new();
        recompute(&mut state.clone(), &mut quiet, &mut StepRng::new(0, 0));
        assert!(quiet.is_empty());

        let mut loud = Vec::new();
        recompute(&mut state, &mut loud, &mut StepRng::new(u64::MAX, 0));
        assert_eq!(loud.len(), 1);
        assert_eq!(loud[0].kind, NarrativeKind::Market);
    }

    #[test]
    fn prudence_eases_yield_and_restores_confidence() {
        let mut state = baseline();
        set_line(&mut state, LedgerSide::Revenue, "Other Revenue", 420.0);
        state.gilt_yield = 5.0;
        state.market_confidence = 70.0;
        let mut events = Vec::new();
        recompute(&mut state, &mut events, &mut StepRng::new(0, 0));

        assert!((state.gilt_yield - 4.98).abs() < 1e-9);
        assert_eq!(state.market_confidence, 71.0);
    }

    #[test]
    fn yield_is_clamped_before_debt_interest_is_derived() {
        let mut state = baseline();
        state.gilt_yield = 14.99;
        set_line(&mut state, LedgerSide::Expenditure, "Other Services", 2000.0);
        let mut events = Vec::new();
        recompute(&mut state, &mut events, &mut StepRng::new(0, 0));

        assert_eq!(state.gilt_yield, 15.0);
        assert_eq!(state.inflation, 20.0);
        assert_eq!(state.debt_interest(), Some(debt_interest_for_yield(15.0)));
    }
}
