//! Classifies an edit into a headline bucket and phrases the headline.
//!
//! Classification is deterministic; only the choice of wording within a
//! bucket and the probabilistic extra headlines draw from the caller's RNG.

use contracts::{LedgerSide, NarrativeEvent, NarrativeKind};
use rand::Rng;

use crate::catalog::{
    boost_templates, cut_templates, GENERIC_BOOST_TEMPLATE, MARKET_TEMPLATES, POLITICAL_TEMPLATES,
    TAX_BONANZA_TEMPLATE,
};

/// Spending changes at or inside this band are too small to make the news.
pub const SPENDING_HEADLINE_BAND: f64 = 5.0;
/// Tax changes beyond this band trigger the market / bonanza headlines.
pub const TAX_HEADLINE_BAND: f64 = 10.0;

pub const POLITICAL_CRISIS_ROLL: f64 = 0.5;
pub const DEFICIT_MARKET_ROLL: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeBucket {
    /// Spending cut.
    Cut,
    /// Spending increase.
    Boost,
    /// Large tax rise, or a deficit scare from the derived indicators.
    Market,
    /// Large tax cut.
    TaxBonanza,
    Political,
}

impl NarrativeBucket {
    pub fn kind(self) -> NarrativeKind {
        match self {
            Self::Cut | Self::Political => NarrativeKind::Crisis,
            Self::Boost | Self::TaxBonanza => NarrativeKind::Update,
            Self::Market => NarrativeKind::Market,
        }
    }
}

pub fn classify(side: LedgerSide, diff: f64) -> Option<NarrativeBucket> {
    match side {
        LedgerSide::Expenditure if diff < -SPENDING_HEADLINE_BAND => Some(NarrativeBucket::Cut),
        LedgerSide::Expenditure if diff > SPENDING_HEADLINE_BAND => Some(NarrativeBucket::Boost),
        LedgerSide::Revenue if diff > TAX_HEADLINE_BAND => Some(NarrativeBucket::Market),
        LedgerSide::Revenue if diff < -TAX_HEADLINE_BAND => Some(NarrativeBucket::TaxBonanza),
        _ => None,
    }
}

/// Phrase a headline for `bucket`. `department` and `diff` feed the
/// `{department}` and `{amount}` placeholders where the template has them.
pub fn compose<R: Rng + ?Sized>(
    bucket: NarrativeBucket,
    department: &str,
    diff: f64,
    rng: &mut R,
) -> NarrativeEvent {
    let template = match bucket {
        NarrativeBucket::Cut => pick(cut_templates(department), rng),
        NarrativeBucket::Boost => boost_templates(department)
            .map(|templates| pick(templates, rng))
            .unwrap_or(GENERIC_BOOST_TEMPLATE),
        NarrativeBucket::Market => pick(MARKET_TEMPLATES, rng),
        NarrativeBucket::TaxBonanza => TAX_BONANZA_TEMPLATE,
        NarrativeBucket::Political => pick(POLITICAL_TEMPLATES, rng),
    };

    let text = template
        .replace("{amount}", &format_amount(diff))
        .replace("{department}", department);
    NarrativeEvent::new(bucket.kind(), text)
}

/// Uniform roll in `[0, 1)` compared against `threshold`.
pub fn roll_exceeds<R: Rng + ?Sized>(rng: &mut R, threshold: f64) -> bool {
    rng.gen::<f64>() > threshold
}

/// Whole billions, sign dropped.
pub fn format_amount(diff: f64) -> String {
    format!("{:.0}", diff.abs().round())
}

fn pick<R: Rng + ?Sized>(templates: &'static [&'static str], rng: &mut R) -> &'static str {
    if templates.is_empty() {
        return "";
    }
    // Scaled unit roll rather than gen_range so fixed-output test RNGs stay total.
    let index = (rng.gen::<f64>() * templates.len() as f64) as usize;
    templates[index.min(templates.len() - 1)]
}
