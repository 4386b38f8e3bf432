//! Delayed effect scheduler.
//!
//! Each processed action is one tick. Effects count down once per tick and
//! land on their target in the tick that takes them to zero; they are never
//! observable with zero ticks left.

use contracts::{DelayedEffect, ImpactTarget};

/// Ticks between an action and the delayed half of its consequences.
pub const DEFAULT_DELAY_TICKS: u32 = 2;

/// Sum of the deltas that landed this tick, per target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedDeltas {
    pub gdp: f64,
    pub mood: f64,
}

impl ResolvedDeltas {
    fn add(&mut self, target: ImpactTarget, delta: f64) {
        match target {
            ImpactTarget::Gdp => self.gdp += delta,
            ImpactTarget::Mood => self.mood += delta,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gdp == 0.0 && self.mood == 0.0
    }
}

/// Advance every pending effect by one tick.
pub fn resolve(pending: &[DelayedEffect]) -> (ResolvedDeltas, Vec<DelayedEffect>) {
    let mut resolved = ResolvedDeltas::default();
    let mut remaining = Vec::with_capacity(pending.len());

    for effect in pending {
        let ticks_remaining = effect.ticks_remaining.saturating_sub(1);
        if ticks_remaining == 0 {
            resolved.add(effect.target, effect.delta);
        } else {
            remaining.push(DelayedEffect {
                ticks_remaining,
                ..effect.clone()
            });
        }
    }

    (resolved, remaining)
}

pub fn delayed(target: ImpactTarget, delta: f64) -> DelayedEffect {
    DelayedEffect {
        target,
        delta,
        ticks_remaining: DEFAULT_DELAY_TICKS,
    }
}
