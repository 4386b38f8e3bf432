//! In-process API facade over the fiscal kernel, with action auditing,
//! milestone tracking, and the HTTP/WebSocket server plus its out-of-band
//! headline collaborators.

use std::collections::VecDeque;

pub mod config;
pub mod enrichment;
pub mod news;
mod server;

use contracts::{
    ActionResult, ApiError, BudgetAction, BudgetState, ErrorCode, FiscalSummary, Milestone,
    NarrativeEvent,
};
use fiscal_core::milestones;
use fiscal_core::FiscalStore;
use serde::Serialize;

pub use config::{ConfigError, ServerConfig};
pub use server::{serve, ServerError};

/// Most recent actions kept in the audit log; older entries are dropped.
pub const AUDIT_CAPACITY: usize = 256;

/// Everything one accepted action produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub state: BudgetState,
    pub summary: FiscalSummary,
    pub events: Vec<NarrativeEvent>,
    pub milestones: Vec<Milestone>,
    /// Edited line value minus its value before the action.
    #[serde(skip)]
    pub diff: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug)]
pub struct FiscalApi {
    store: FiscalStore,
    action_audit: VecDeque<ActionResult>,
    milestones: Vec<Milestone>,
}

impl Default for FiscalApi {
    fn default() -> Self {
        Self::from_seed(None)
    }
}

impl FiscalApi {
    /// Seeded for reproducible headline phrasing; `None` draws from entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let store = match seed {
            Some(seed) => FiscalStore::with_seed(seed),
            None => FiscalStore::new(),
        };
        Self {
            store,
            action_audit: VecDeque::with_capacity(AUDIT_CAPACITY),
            milestones: Vec::new(),
        }
    }

    pub fn state(&self) -> &BudgetState {
        self.store.current()
    }

    pub fn baseline(&self) -> BudgetState {
        self.store.init()
    }

    pub fn summary(&self) -> FiscalSummary {
        FiscalSummary::of(self.store.current())
    }

    pub fn submit_action(&mut self, action: BudgetAction) -> Result<ActionReport, ApiError> {
        let outcome = match self.store.apply(&action) {
            Ok(outcome) => outcome,
            Err(err) => {
                let error = ApiError::new(
                    ErrorCode::InvalidAction,
                    "budget action rejected",
                    Some(err.to_string()),
                );
                let tick_count = self.store.current().tick_count;
                self.record(ActionResult::rejected(&action, tick_count, error.clone()));
                return Err(error);
            }
        };

        let warning = outcome.recovered_from.as_ref().map(|violation| {
            self.milestones.clear();
            format!("simulation reset after invariant violation: {violation}")
        });

        let reached = if warning.is_some() {
            Vec::new()
        } else {
            milestones::detect(&outcome.previous, &outcome.state, self.store.baseline().gdp)
        };
        self.milestones.extend(reached.iter().cloned());

        self.record(ActionResult::accepted(&action, outcome.state.tick_count));

        Ok(ActionReport {
            summary: FiscalSummary::of(&outcome.state),
            state: outcome.state,
            events: outcome.events,
            milestones: reached,
            diff: outcome.diff,
            warning,
        })
    }

    pub fn reset(&mut self) -> BudgetState {
        self.milestones.clear();
        self.action_audit.clear();
        self.store.reset()
    }

    /// Actions since the last reset, oldest first, capped at [`AUDIT_CAPACITY`].
    pub fn action_audit(&self) -> &VecDeque<ActionResult> {
        &self.action_audit
    }

    fn record(&mut self, result: ActionResult) {
        if self.action_audit.len() == AUDIT_CAPACITY {
            self.action_audit.pop_front();
        }
        self.action_audit.push_back(result);
    }

    /// Milestones reached since the last reset, oldest first.
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }
}
