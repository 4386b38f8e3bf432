use contracts::{BudgetState, LineItem, DEBT_INTEREST_ID};

use crate::derived::debt_interest_for_yield;

pub const BASELINE_GDP: f64 = 2800.0;
pub const BASELINE_GILT_YIELD: f64 = 4.2;

/// The opening budget every session starts from and every reset returns to.
pub fn baseline() -> BudgetState {
    BudgetState {
        expenditure: vec![
            LineItem::new("Health", 180.0),
            LineItem::new("Social Protection", 310.0),
            LineItem::new("Education", 110.0),
            LineItem::new("Defence", 55.0),
            LineItem::new(
                DEBT_INTEREST_ID,
                debt_interest_for_yield(BASELINE_GILT_YIELD),
            ),
            LineItem::new("Infrastructure", 60.0),
            LineItem::new("Other Services", 380.0),
        ],
        revenue: vec![
            LineItem::new("Income Tax", 280.0),
            LineItem::new("VAT", 180.0),
            LineItem::new("Corporation Tax", 95.0),
            LineItem::new("NI", 185.0),
            LineItem::new("Other Revenue", 360.0),
        ],
        gdp: BASELINE_GDP,
        inflation: 2.5,
        gilt_yield: BASELINE_GILT_YIELD,
        public_mood: 50.0,
        market_confidence: 80.0,
        political_capital: 100.0,
        pending_impacts: Vec::new(),
        tick_count: 0,
    }
}
