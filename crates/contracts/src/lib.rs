//! v1 cross-boundary contracts for the fiscal kernel, API, and dashboards.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Name of the expenditure line whose value is derived from the gilt yield.
pub const DEBT_INTEREST_ID: &str = "Debt Interest";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub value: f64,
}

impl LineItem {
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSide {
    Expenditure,
    Revenue,
}

impl LedgerSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expenditure => "expenditure",
            Self::Revenue => "revenue",
        }
    }
}

impl fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ImpactTarget {
    #[serde(rename = "GDP")]
    Gdp,
    #[serde(rename = "MOOD")]
    Mood,
}

/// A consequence that lands on its target after `ticks_remaining` more actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DelayedEffect {
    pub target: ImpactTarget,
    pub delta: f64,
    pub ticks_remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetState {
    pub expenditure: Vec<LineItem>,
    pub revenue: Vec<LineItem>,
    pub gdp: f64,
    pub inflation: f64,
    pub gilt_yield: f64,
    pub public_mood: f64,
    pub market_confidence: f64,
    pub political_capital: f64,
    #[serde(default)]
    pub pending_impacts: Vec<DelayedEffect>,
    #[serde(default)]
    pub tick_count: u64,
}

impl BudgetState {
    pub fn items(&self, side: LedgerSide) -> &[LineItem] {
        match side {
            LedgerSide::Expenditure => &self.expenditure,
            LedgerSide::Revenue => &self.revenue,
        }
    }

    pub fn items_mut(&mut self, side: LedgerSide) -> &mut Vec<LineItem> {
        match side {
            LedgerSide::Expenditure => &mut self.expenditure,
            LedgerSide::Revenue => &mut self.revenue,
        }
    }

    pub fn line_value(&self, side: LedgerSide, id: &str) -> Option<f64> {
        self.items(side)
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.value)
    }

    pub fn debt_interest(&self) -> Option<f64> {
        self.line_value(LedgerSide::Expenditure, DEBT_INTEREST_ID)
    }

    pub fn total_expenditure(&self) -> f64 {
        self.expenditure.iter().map(|item| item.value).sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.revenue.iter().map(|item| item.value).sum()
    }

    pub fn deficit(&self) -> f64 {
        self.total_expenditure() - self.total_revenue()
    }
}

/// A user edit of one line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAction {
    pub category: LedgerSide,
    pub id: String,
    pub value: f64,
}

impl BudgetAction {
    pub fn new(category: LedgerSide, id: impl Into<String>, value: f64) -> Self {
        Self {
            category,
            id: id.into(),
            value,
        }
    }

    pub fn expenditure(id: impl Into<String>, value: f64) -> Self {
        Self::new(LedgerSide::Expenditure, id, value)
    }

    pub fn revenue(id: impl Into<String>, value: f64) -> Self {
        Self::new(LedgerSide::Revenue, id, value)
    }
}

impl fmt::Display for BudgetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.category, self.id, self.value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NarrativeKind {
    Live,
    Crisis,
    Market,
    Update,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NarrativeEvent {
    pub kind: NarrativeKind,
    pub text: String,
}

impl NarrativeEvent {
    pub fn new(kind: NarrativeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FiscalStance {
    Emergency,
    Critical,
    Warning,
    Balanced,
    Surplus,
}

impl FiscalStance {
    pub fn from_deficit(deficit: f64) -> Self {
        if deficit > 80.0 {
            Self::Emergency
        } else if deficit > 50.0 {
            Self::Critical
        } else if deficit > 0.0 {
            Self::Warning
        } else if deficit < 0.0 {
            Self::Surplus
        } else {
            Self::Balanced
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FiscalSummary {
    pub total_expenditure: f64,
    pub total_revenue: f64,
    pub deficit: f64,
    pub deficit_pct_gdp: f64,
    pub stance: FiscalStance,
}

impl FiscalSummary {
    pub fn of(state: &BudgetState) -> Self {
        let total_expenditure = state.total_expenditure();
        let total_revenue = state.total_revenue();
        let deficit = total_expenditure - total_revenue;
        Self {
            total_expenditure,
            total_revenue,
            deficit,
            deficit_pct_gdp: deficit / state.gdp * 100.0,
            stance: FiscalStance::from_deficit(deficit),
        }
    }
}

impl fmt::Display for FiscalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "spend={:.1} revenue={:.1} deficit={:.1} ({:.2}% gdp) stance={:?}",
            self.total_expenditure,
            self.total_revenue,
            self.deficit,
            self.deficit_pct_gdp,
            self.stance
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    SurplusAchieved,
    MarketPanic,
    KeynesianHero,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidAction,
    InvalidQuery,
    ContractVersionUnsupported,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

/// Audit record for one submitted action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    pub schema_version: String,
    pub action: BudgetAction,
    pub accepted: bool,
    pub tick_count: u64,
    pub error: Option<ApiError>,
}

impl ActionResult {
    pub fn accepted(action: &BudgetAction, tick_count: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            action: action.clone(),
            accepted: true,
            tick_count,
            error: None,
        }
    }

    pub fn rejected(action: &BudgetAction, tick_count: u64, error: ApiError) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            action: action.clone(),
            accepted: false,
            tick_count,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_state_uses_camel_case_wire_names() {
        let state = BudgetState {
            expenditure: vec![LineItem::new("Health", 180.0)],
            revenue: vec![LineItem::new("VAT", 180.0)],
            gdp: 2800.0,
            inflation: 2.5,
            gilt_yield: 4.2,
            public_mood: 50.0,
            market_confidence: 80.0,
            political_capital: 100.0,
            pending_impacts: vec![DelayedEffect {
                target: ImpactTarget::Gdp,
                delta: -8.1,
                ticks_remaining: 2,
            }],
            tick_count: 3,
        };

        let encoded = serde_json::to_value(&state).expect("serialize");
        assert!(encoded.get("giltYield").is_some());
        assert!(encoded.get("politicalCapital").is_some());
        assert_eq!(encoded["pendingImpacts"][0]["target"], "GDP");
        assert_eq!(encoded["pendingImpacts"][0]["ticksRemaining"], 2);
        assert_eq!(encoded["tickCount"], 3);
    }

    #[test]
    fn action_accepts_dashboard_shape() {
        let action: BudgetAction =
            serde_json::from_str(r#"{"category":"expenditure","id":"Health","value":150}"#)
                .expect("action parses");
        assert_eq!(action, BudgetAction::expenditure("Health", 150.0));
    }

    #[test]
    fn narrative_kind_is_upper_case_on_the_wire() {
        let event = NarrativeEvent::new(NarrativeKind::Crisis, "A&E MELTDOWN");
        let encoded = serde_json::to_string(&event).expect("serialize");
        assert_eq!(encoded, r#"{"kind":"CRISIS","text":"A&E MELTDOWN"}"#);
    }

    #[test]
    fn stance_thresholds() {
        assert_eq!(FiscalStance::from_deficit(90.0), FiscalStance::Emergency);
        assert_eq!(FiscalStance::from_deficit(60.0), FiscalStance::Critical);
        assert_eq!(FiscalStance::from_deficit(5.0), FiscalStance::Warning);
        assert_eq!(FiscalStance::from_deficit(0.0), FiscalStance::Balanced);
        assert_eq!(FiscalStance::from_deficit(-1.0), FiscalStance::Surplus);
    }
}
