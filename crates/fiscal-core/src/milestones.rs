//! Threshold crossings worth celebrating (or mourning) between two snapshots.

use contracts::{BudgetState, Milestone, MilestoneKind};

pub const MARKET_PANIC_CONFIDENCE: f64 = 40.0;
/// GDP growth over baseline that earns the growth milestone.
pub const KEYNESIAN_GROWTH: f64 = 0.03;

/// Milestones crossed going from `prev` to `next`. Each fires only on the
/// crossing, not while the condition holds.
pub fn detect(prev: &BudgetState, next: &BudgetState, baseline_gdp: f64) -> Vec<Milestone> {
    let mut reached = Vec::new();

    if prev.deficit() > 0.0 && next.deficit() <= 0.0 {
        reached.push(milestone(
            MilestoneKind::SurplusAchieved,
            "SURPLUS ACHIEVED!",
            "You've balanced the books. The markets love you.",
        ));
    }

    if next.market_confidence < MARKET_PANIC_CONFIDENCE
        && prev.market_confidence >= MARKET_PANIC_CONFIDENCE
    {
        reached.push(milestone(
            MilestoneKind::MarketPanic,
            "MARKET PANIC",
            "Investors are fleeing. Sterling is tanking.",
        ));
    }

    let growth_line = baseline_gdp * (1.0 + KEYNESIAN_GROWTH);
    if next.gdp > growth_line && prev.gdp <= growth_line {
        reached.push(milestone(
            MilestoneKind::KeynesianHero,
            "KEYNESIAN HERO",
            "3% GDP growth achieved through investment!",
        ));
    }

    reached
}

fn milestone(kind: MilestoneKind, title: &str, description: &str) -> Milestone {
    Milestone {
        kind,
        title: title.to_string(),
        description: description.to_string(),
    }
}
