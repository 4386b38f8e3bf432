//! Converts a spending change into a count of people or things affected.

use crate::catalog::{expenditure_profile, HUMAN_COST_TEMPLATE};

/// Minimum absolute change (billions) before a human-impact line is reported.
pub const EMPATHY_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanImpact {
    pub count: u64,
    pub unit: &'static str,
}

impl HumanImpact {
    pub fn headline(&self) -> String {
        HUMAN_COST_TEMPLATE
            .replace("{count}", &group_thousands(self.count))
            .replace("{unit}", self.unit)
    }
}

/// `None` when the department has no empathy entry or the change is too small.
pub fn translate(department: &str, diff: f64) -> Option<HumanImpact> {
    let entry = expenditure_profile(department)?.empathy?;
    let magnitude = diff.abs();
    if magnitude <= EMPATHY_THRESHOLD {
        return None;
    }

    Some(HumanImpact {
        count: (magnitude * entry.factor).round() as u64,
        unit: entry.unit,
    })
}

/// `1350000` -> `"1,350,000"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
