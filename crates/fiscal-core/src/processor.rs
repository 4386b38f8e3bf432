//! The per-action transition function.

use contracts::{
    BudgetAction, BudgetState, ImpactTarget, LedgerSide, NarrativeEvent, NarrativeKind,
    DEBT_INTEREST_ID,
};
use rand::Rng;
use thiserror::Error;

use crate::catalog::{is_politically_sensitive, multiplier_for};
use crate::derived::{self, DerivedIndicators};
use crate::empathy;
use crate::narrative::{classify, compose, roll_exceeds, NarrativeBucket, POLITICAL_CRISIS_ROLL};
use crate::scheduler::{self, delayed, ResolvedDeltas};

/// Share of a spending multiplier effect that reaches GDP in the same tick.
pub const IMMEDIATE_GDP_SHARE: f64 = 0.4;
/// Remainder, queued for [`scheduler::DEFAULT_DELAY_TICKS`].
pub const DELAYED_GDP_SHARE: f64 = 0.6;

pub const CUT_MOOD_HIT: f64 = 0.3;
pub const CUT_CAPITAL_COST: f64 = 1.5;
pub const CAPITAL_CRISIS_LEVEL: f64 = 30.0;
pub const BOOST_MOOD_GAIN: f64 = 0.2;
pub const BOOST_CAPITAL_GAIN: f64 = 0.5;

/// Tax rise beyond which a smaller GDP drag applies without a headline.
pub const TAX_DRAG_BAND: f64 = 5.0;
pub const TAX_SHOCK_GDP_DRAG: f64 = 0.33;
pub const TAX_DRAG_GDP: f64 = 0.2;
pub const TAX_SHOCK_CONFIDENCE_HIT: f64 = 5.0;
pub const TAX_MOOD_SENSITIVITY: f64 = 0.2;
pub const TAX_CUT_MOOD_GAIN: f64 = 0.3;
pub const TAX_CUT_CONFIDENCE_HIT: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown {side} line item: {id}")]
    UnknownLineItem { side: LedgerSide, id: String },
    #[error("value for {id} is not a finite number or changes it by a non-finite amount")]
    NonFiniteValue { id: String },
    #[error("{id} is derived from the gilt yield and cannot be edited")]
    DerivedLineItem { id: String },
}

/// Outcome of one accepted action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: BudgetState,
    /// Headlines in emission order.
    pub events: Vec<NarrativeEvent>,
    pub previous_value: f64,
    pub diff: f64,
    pub resolved: ResolvedDeltas,
    pub derived: DerivedIndicators,
}

pub fn validate(state: &BudgetState, action: &BudgetAction) -> Result<(), ValidationError> {
    if !action.value.is_finite() {
        return Err(ValidationError::NonFiniteValue {
            id: action.id.clone(),
        });
    }

    if action.category == LedgerSide::Expenditure && action.id == DEBT_INTEREST_ID {
        return Err(ValidationError::DerivedLineItem {
            id: action.id.clone(),
        });
    }

    let previous = state
        .line_value(action.category, &action.id)
        .ok_or_else(|| ValidationError::UnknownLineItem {
            side: action.category,
            id: action.id.clone(),
        })?;

    // A finite value can still overflow the diff, e.g. f64::MAX to -f64::MAX.
    if !(action.value - previous).is_finite() {
        return Err(ValidationError::NonFiniteValue {
            id: action.id.clone(),
        });
    }

    Ok(())
}

/// Apply `action` to a copy of `state`. On error `state` is untouched.
pub fn apply<R: Rng + ?Sized>(
    state: &BudgetState,
    action: &BudgetAction,
    rng: &mut R,
) -> Result<Transition, ValidationError> {
    validate(state, action)?;

    let mut next = state.clone();
    let mut events = Vec::new();

    let (resolved, remaining) = scheduler::resolve(&next.pending_impacts);
    next.pending_impacts = remaining;
    next.tick_count += 1;

    let previous_value = replace_line(&mut next, action)?;
    let diff = action.value - previous_value;

    match action.category {
        LedgerSide::Expenditure => apply_spending_change(&mut next, &action.id, diff, &mut events, rng),
        LedgerSide::Revenue => apply_tax_change(&mut next, &action.id, diff, &mut events, rng),
    }

    next.gdp += resolved.gdp;
    next.public_mood += resolved.mood;

    let derived = derived::recompute(&mut next, &mut events, rng);

    Ok(Transition {
        state: next,
        events,
        previous_value,
        diff,
        resolved,
        derived,
    })
}

fn replace_line(state: &mut BudgetState, action: &BudgetAction) -> Result<f64, ValidationError> {
    let item = state
        .items_mut(action.category)
        .iter_mut()
        .find(|item| item.id == action.id)
        .ok_or_else(|| ValidationError::UnknownLineItem {
            side: action.category,
            id: action.id.clone(),
        })?;
    let previous = item.value;
    item.value = action.value;
    Ok(previous)
}

fn apply_spending_change<R: Rng + ?Sized>(
    state: &mut BudgetState,
    department: &str,
    diff: f64,
    events: &mut Vec<NarrativeEvent>,
    rng: &mut R,
) {
    let stimulus = diff * multiplier_for(department);
    state.gdp += stimulus * IMMEDIATE_GDP_SHARE;
    state
        .pending_impacts
        .push(delayed(ImpactTarget::Gdp, stimulus * DELAYED_GDP_SHARE));

    match classify(LedgerSide::Expenditure, diff) {
        Some(NarrativeBucket::Cut) => {
            let magnitude = diff.abs();
            events.push(compose(NarrativeBucket::Cut, department, diff, rng));

            state.public_mood -= magnitude * CUT_MOOD_HIT;
            state
                .pending_impacts
                .push(delayed(ImpactTarget::Mood, -magnitude * CUT_MOOD_HIT));

            if is_politically_sensitive(department) {
                state.political_capital -= magnitude * CUT_CAPITAL_COST;
                if state.political_capital < CAPITAL_CRISIS_LEVEL
                    && roll_exceeds(rng, POLITICAL_CRISIS_ROLL)
                {
                    events.push(compose(NarrativeBucket::Political, department, diff, rng));
                }
            }

            if let Some(impact) = empathy::translate(department, diff) {
                events.push(NarrativeEvent::new(NarrativeKind::Update, impact.headline()));
            }
        }
        Some(NarrativeBucket::Boost) => {
            events.push(compose(NarrativeBucket::Boost, department, diff, rng));
            state.public_mood += diff * BOOST_MOOD_GAIN;
            state.political_capital += diff * BOOST_CAPITAL_GAIN;
        }
        _ => {}
    }
}

fn apply_tax_change<R: Rng + ?Sized>(
    state: &mut BudgetState,
    tax: &str,
    diff: f64,
    events: &mut Vec<NarrativeEvent>,
    rng: &mut R,
) {
    let bucket = classify(LedgerSide::Revenue, diff);

    if bucket == Some(NarrativeBucket::Market) {
        state.gdp -= diff * TAX_SHOCK_GDP_DRAG;
        state.market_confidence -= TAX_SHOCK_CONFIDENCE_HIT;
        events.push(compose(NarrativeBucket::Market, tax, diff, rng));
    } else if diff > TAX_DRAG_BAND {
        state.gdp -= diff * TAX_DRAG_GDP;
    }

    // Negative diff (a cut) raises mood here.
    state.public_mood -= diff * TAX_MOOD_SENSITIVITY;

    if bucket == Some(NarrativeBucket::TaxBonanza) {
        state.public_mood += diff.abs() * TAX_CUT_MOOD_GAIN;
        state.market_confidence -= TAX_CUT_CONFIDENCE_HIT;
        events.push(compose(NarrativeBucket::TaxBonanza, tax, diff, rng));
    }
}
