//! Keyword categorisation of free-text inspection notes
//!
//! Matching is plain substring search over the lower-cased note. There is no
//! negation handling: "no brake problems" is still tagged as a brake issue.

use crate::model::{IssueArea, ObservationTag, Severity};

/// A row of the keyword table
#[derive(Debug, Clone, Copy)]
pub struct ObservationRule {
    pub category: &'static str,
    pub area: IssueArea,
    pub severity: Severity,
    pub description: &'static str,
    /// Lower-case keywords; any one of them appearing selects the rule
    pub keywords: &'static [&'static str],
}

impl ObservationRule {
    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|kw| normalized.contains(kw))
    }

    fn to_tag(self) -> ObservationTag {
        ObservationTag {
            category: self.category.to_string(),
            area: self.area,
            severity: self.severity,
            description: self.description.to_string(),
        }
    }
}

/// Rules in the order their tags are emitted
pub const OBSERVATION_RULES: &[ObservationRule] = &[
    ObservationRule {
        category: "brakes",
        area: IssueArea::Safety,
        severity: Severity::Critical,
        description: "Brake system issue reported",
        keywords: &["freno", "brake"],
    },
    ObservationRule {
        category: "steering",
        area: IssueArea::Safety,
        severity: Severity::Critical,
        description: "Steering system issue reported",
        keywords: &["dirección", "direccion", "volante", "steering"],
    },
    ObservationRule {
        category: "tires",
        area: IssueArea::Safety,
        severity: Severity::Critical,
        description: "Tire condition issue reported",
        keywords: &["llanta", "neumático", "neumatico", "tire", "tyre"],
    },
    ObservationRule {
        category: "engine-oil",
        area: IssueArea::Mechanical,
        severity: Severity::Urgent,
        description: "Engine or oil issue reported",
        keywords: &["motor", "aceite", "oil"],
    },
    ObservationRule {
        category: "battery",
        area: IssueArea::Electrical,
        severity: Severity::Urgent,
        description: "Battery issue reported",
        keywords: &["batería", "bateria", "battery"],
    },
    ObservationRule {
        category: "noise",
        area: IssueArea::Mechanical,
        severity: Severity::Minor,
        description: "Abnormal noise reported",
        keywords: &["ruido", "noise"],
    },
    ObservationRule {
        category: "gauges",
        area: IssueArea::Electrical,
        severity: Severity::Minor,
        description: "Dashboard gauge or indicator issue reported",
        keywords: &["indicador", "tablero", "gauge"],
    },
    ObservationRule {
        category: "suspension",
        area: IssueArea::Mechanical,
        severity: Severity::Urgent,
        description: "Suspension issue reported",
        keywords: &["suspensión", "suspension", "amortiguador", "shock absorber"],
    },
    ObservationRule {
        category: "fuel",
        area: IssueArea::Mechanical,
        severity: Severity::Urgent,
        description: "Fuel system issue reported",
        keywords: &["combustible", "gasolina", "diesel", "fuel"],
    },
    ObservationRule {
        category: "lights",
        area: IssueArea::Electrical,
        severity: Severity::Minor,
        description: "Lighting or wiring issue reported",
        keywords: &["luces", "eléctric", "electric", "light"],
    },
];

/// Extract issue tags from an inspection note, in table order
pub fn categorize_observations(text: &str) -> Vec<ObservationTag> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let normalized = text.to_lowercase();

    OBSERVATION_RULES
        .iter()
        .filter(|rule| rule.matches(&normalized))
        .map(|rule| rule.to_tag())
        .collect()
}

/// Highest severity among the tags, if any
pub fn max_severity(tags: &[ObservationTag]) -> Option<Severity> {
    tags.iter().map(|t| t.severity).max()
}
