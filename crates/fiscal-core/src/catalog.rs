//! Static per-department tables: fiscal multipliers, political sensitivity,
//! human-impact factors, and headline phrasing.
//!
//! Every table is keyed by the same department names the baseline uses, so a
//! lookup can only miss for a genuinely unknown line.

pub const DEFAULT_MULTIPLIER: f64 = 0.4;

/// Department whose cut templates stand in for departments without their own.
pub const FALLBACK_CUT_DEPARTMENT: &str = "Other Services";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmpathyEntry {
    pub factor: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepartmentProfile {
    pub id: &'static str,
    pub multiplier: f64,
    pub politically_sensitive: bool,
    pub empathy: Option<EmpathyEntry>,
    pub cut_templates: &'static [&'static str],
    pub boost_templates: &'static [&'static str],
}

pub const MARKET_TEMPLATES: &[&str] = &[
    "CITY PANIC: Traders flee UK assets after fiscal shock",
    "GILT VIGILANTES: Bond markets punish loose policy",
    "STERLING SLIDES: Pound under pressure on deficit fears",
];

pub const POLITICAL_TEMPLATES: &[&str] = &[
    "BACKBENCH MUTINY: MPs revolt against unpopular cuts",
    "LEADERSHIP CRISIS: PM faces confidence vote",
    "CABINET SPLIT: Senior ministers brief against policy",
];

pub const GENERIC_BOOST_TEMPLATE: &str = "SPENDING UP: £{amount}bn boost for {department}";

pub const TAX_BONANZA_TEMPLATE: &str = "TAX BONANZA: {department} slashed by £{amount}bn";

pub const HUMAN_COST_TEMPLATE: &str = "HUMAN COST: {count} {unit}";

const DEPARTMENTS: &[DepartmentProfile] = &[
    DepartmentProfile {
        id: "Health",
        multiplier: 0.45,
        politically_sensitive: true,
        empathy: Some(EmpathyEntry {
            factor: 45_000.0,
            unit: "people on waiting lists",
        }),
        cut_templates: &[
            "NHS ON KNEES: £{amount}bn slashed as queues spiral",
            "HOSPITALS IN CRISIS: Chancellor wields axe on health",
            "A&E MELTDOWN: {amount} billion cut from lifeline services",
        ],
        boost_templates: &[
            "NHS BONANZA: £{amount}bn injection to cut queues",
            "HOSPITALS REJOICE: Record investment in health",
        ],
    },
    DepartmentProfile {
        id: "Social Protection",
        multiplier: 0.6,
        politically_sensitive: true,
        empathy: Some(EmpathyEntry {
            factor: 50_000.0,
            unit: "families losing benefits",
        }),
        cut_templates: &[
            "PENSIONERS BETRAYED: £{amount}bn welfare wipeout",
            "BENEFITS AXE: Millions face hardship after savage cuts",
            "COLD WINTER AHEAD: Heating payments slashed by £{amount}bn",
        ],
        boost_templates: &[
            "PENSIONERS CELEBRATE: £{amount}bn boost to support",
            "SAFETY NET STRENGTHENED: Benefits rise by £{amount}bn",
        ],
    },
    DepartmentProfile {
        id: "Education",
        multiplier: 0.5,
        politically_sensitive: true,
        empathy: Some(EmpathyEntry {
            factor: 1_000.0,
            unit: "teachers at risk",
        }),
        cut_templates: &[
            "SCHOOLS GUTTED: £{amount}bn ripped from classrooms",
            "TEACHERS REVOLT: Mass walkouts as education cut",
            "FUTURE CANCELLED: Universities face £{amount}bn blackhole",
        ],
        boost_templates: &[
            "SCHOOLS GOLDEN AGE: £{amount}bn education windfall",
            "TEACHERS TRIUMPH: Biggest funding boost in decades",
        ],
    },
    DepartmentProfile {
        id: "Defence",
        multiplier: 0.3,
        politically_sensitive: false,
        empathy: None,
        cut_templates: &[
            "TROOP CUTS: Army faces £{amount}bn axe amid tensions",
            "DEFENCE WEAKENED: Critics slam {amount}bn military cut",
        ],
        boost_templates: &[],
    },
    DepartmentProfile {
        id: "Infrastructure",
        multiplier: 1.0,
        politically_sensitive: false,
        empathy: Some(EmpathyEntry {
            factor: 100_000.0,
            unit: "potholes unfixed",
        }),
        cut_templates: &[
            "ROADS TO RUIN: £{amount}bn slashed from transport",
            "POTHOLE BRITAIN: Infrastructure budget decimated",
            "HS2-STYLE CUTS: £{amount}bn scrapped from building plans",
        ],
        boost_templates: &[
            "BUILDING BRITAIN: £{amount}bn infrastructure blitz",
            "ROADS, RAIL, BROADBAND: Record £{amount}bn investment",
        ],
    },
    DepartmentProfile {
        id: "Other Services",
        multiplier: 0.4,
        politically_sensitive: false,
        empathy: Some(EmpathyEntry {
            factor: 5_000.0,
            unit: "police officers unfunded",
        }),
        cut_templates: &[
            "POLICE STRETCHED: £{amount}bn cut to frontline services",
            "COUNCILS IN CRISIS: Local services face axe",
        ],
        boost_templates: &[],
    },
];

pub fn expenditure_profile(id: &str) -> Option<&'static DepartmentProfile> {
    DEPARTMENTS.iter().find(|profile| profile.id == id)
}

pub fn departments() -> &'static [DepartmentProfile] {
    DEPARTMENTS
}

pub fn multiplier_for(id: &str) -> f64 {
    expenditure_profile(id)
        .map(|profile| profile.multiplier)
        .unwrap_or(DEFAULT_MULTIPLIER)
}

pub fn is_politically_sensitive(id: &str) -> bool {
    expenditure_profile(id).is_some_and(|profile| profile.politically_sensitive)
}

pub fn cut_templates(id: &str) -> &'static [&'static str] {
    expenditure_profile(id)
        .filter(|profile| !profile.cut_templates.is_empty())
        .or_else(|| expenditure_profile(FALLBACK_CUT_DEPARTMENT))
        .map(|profile| profile.cut_templates)
        .unwrap_or_default()
}

/// `None` means the department uses [`GENERIC_BOOST_TEMPLATE`].
pub fn boost_templates(id: &str) -> Option<&'static [&'static str]> {
    expenditure_profile(id)
        .map(|profile| profile.boost_templates)
        .filter(|templates| !templates.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defence_multiplier_matches_its_baseline_spelling() {
        assert_eq!(multiplier_for("Defence"), 0.3);
        assert_eq!(multiplier_for("Defense"), DEFAULT_MULTIPLIER);
    }

    #[test]
    fn sensitivity_covers_health_welfare_and_education_only() {
        let sensitive = departments()
            .iter()
            .filter(|profile| profile.politically_sensitive)
            .map(|profile| profile.id)
            .collect::<Vec<_>>();
        assert_eq!(sensitive, vec!["Health", "Social Protection", "Education"]);
    }

    #[test]
    fn unknown_departments_fall_back() {
        assert_eq!(cut_templates("Space Programme"), cut_templates("Other Services"));
        assert!(boost_templates("Defence").is_none());
        assert!(boost_templates("Health").is_some());
    }
}
