//! Owner of the live budget snapshot.

use contracts::{BudgetAction, BudgetState, NarrativeEvent};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, warn};

use crate::clamp::{check_invariants, InvariantViolation};
use crate::init::baseline;
use crate::processor::{self, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub state: BudgetState,
    pub events: Vec<NarrativeEvent>,
    /// Snapshot before the action, for milestone detection.
    pub previous: BudgetState,
    /// Line value minus its pre-action value.
    pub diff: f64,
    /// Set when the transition broke an invariant and the store reset instead.
    pub recovered_from: Option<InvariantViolation>,
}

#[derive(Debug, Clone)]
pub struct FiscalStore {
    baseline: BudgetState,
    current: BudgetState,
    rng: ChaCha8Rng,
}

impl Default for FiscalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FiscalStore {
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        let baseline = baseline();
        Self {
            current: baseline.clone(),
            baseline,
            rng,
        }
    }

    /// Fresh copy of the opening budget.
    pub fn init(&self) -> BudgetState {
        self.baseline.clone()
    }

    pub fn baseline(&self) -> &BudgetState {
        &self.baseline
    }

    pub fn current(&self) -> &BudgetState {
        &self.current
    }

    pub fn apply(&mut self, action: &BudgetAction) -> Result<ApplyOutcome, ValidationError> {
        let transition = match processor::apply(&self.current, action, &mut self.rng) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(target: "fiscal::store", action = %action, error = %err, "action rejected");
                return Err(err);
            }
        };

        let previous = std::mem::replace(&mut self.current, transition.state);

        if let Err(violation) = check_invariants(&self.current) {
            error!(
                target: "fiscal::store",
                action = %action,
                tick = self.current.tick_count,
                error = %violation,
                "invariant violated; resetting to baseline"
            );
            let state = self.reset();
            return Ok(ApplyOutcome {
                state,
                events: Vec::new(),
                previous,
                diff: transition.diff,
                recovered_from: Some(violation),
            });
        }

        debug!(
            target: "fiscal::store",
            action = %action,
            tick = self.current.tick_count,
            diff = transition.diff,
            events = transition.events.len(),
            deficit = transition.derived.deficit,
            "action applied"
        );

        Ok(ApplyOutcome {
            state: self.current.clone(),
            events: transition.events,
            previous,
            diff: transition.diff,
            recovered_from: None,
        })
    }

    /// Replace the current snapshot with the baseline. Pending effects and
    /// the tick counter go with it.
    pub fn reset(&mut self) -> BudgetState {
        self.current = self.baseline.clone();
        debug!(target: "fiscal::store", "state reset to baseline");
        self.current.clone()
    }
}
