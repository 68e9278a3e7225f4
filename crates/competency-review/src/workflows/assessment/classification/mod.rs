//! Competency group classification.
//!
//! Two algorithms share the same inputs: the isolated percentage-of-requirement label that
//! needs only one record, and the population-relative label whose thresholds move with the
//! spread of every persisted record. Both restrict a group to the keys active for the
//! record's title.

mod percentage;
mod population;

pub use percentage::{group_percentage, label_for_percentage, LOW_PERCENT, HIGH_PERCENT};
pub use population::PopulationThresholds;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{CompetencyFamily, EmployeeId, EmployeeProfile, EmployeeRecord};
use percentage::complete_percentage;

/// Qualitative standing for one competency group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Low,
    Medium,
    High,
    #[serde(rename = "N/A")]
    NotApplicable,
    Pending,
}

impl Label {
    pub const fn as_str(self) -> &'static str {
        match self {
            Label::Low => "Low",
            Label::Medium => "Medium",
            Label::High => "High",
            Label::NotApplicable => "N/A",
            Label::Pending => "Pending",
        }
    }
}

/// Core and emerging labels as stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "classification_core")]
    pub core: Label,
    #[serde(rename = "classification_new")]
    pub new: Label,
}

impl Classification {
    pub const fn pending() -> Self {
        Self {
            core: Label::Pending,
            new: Label::Pending,
        }
    }

    pub fn get(&self, family: CompetencyFamily) -> Label {
        match family {
            CompetencyFamily::Core => self.core,
            CompetencyFamily::Emerging => self.new,
        }
    }

    pub fn set(&mut self, family: CompetencyFamily, label: Label) {
        match family {
            CompetencyFamily::Core => self.core = label,
            CompetencyFamily::Emerging => self.new = label,
        }
    }
}

/// Algorithm applied whenever the persisted population changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    Population,
    Percentage,
}

impl ClassificationMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "population" | "relative" => Some(Self::Population),
            "percentage" | "fixed" => Some(Self::Percentage),
            _ => None,
        }
    }
}

/// Result of running one group over the population.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    Applied { qualifying: usize, updated: usize },
    Skipped { qualifying: usize },
}

/// Labels computed for one group, ready to be written back.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReclassification {
    pub family: CompetencyFamily,
    pub labels: Vec<(EmployeeId, Label)>,
    pub outcome: GroupOutcome,
}

/// Per-record label change handed to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationUpdate {
    pub id: EmployeeId,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReclassificationSummary {
    pub mode: ClassificationMode,
    pub core: GroupOutcome,
    pub new: GroupOutcome,
}

pub struct ClassificationEngine;

impl ClassificationEngine {
    /// Isolated percentage labels for a single profile.
    pub fn classify(profile: &EmployeeProfile) -> Classification {
        Classification {
            core: Self::classify_group(profile, CompetencyFamily::Core),
            new: Self::classify_group(profile, CompetencyFamily::Emerging),
        }
    }

    pub fn classify_group(profile: &EmployeeProfile, family: CompetencyFamily) -> Label {
        group_percentage(profile, family)
            .map(label_for_percentage)
            .unwrap_or(Label::NotApplicable)
    }

    /// Labels every record of `table` for one group using `mode`.
    ///
    /// Population statistics only use records carrying a complete score and requirement set
    /// for their title's active keys; the rest read N/A. Below two such records nothing is
    /// labelled.
    pub fn reclassify_all(
        table: &[EmployeeRecord],
        family: CompetencyFamily,
        mode: ClassificationMode,
    ) -> GroupReclassification {
        match mode {
            ClassificationMode::Percentage => {
                let labels: Vec<_> = table
                    .iter()
                    .map(|record| (record.id, Self::classify_group(&record.profile, family)))
                    .collect();
                GroupReclassification {
                    family,
                    outcome: GroupOutcome::Applied {
                        qualifying: table.len(),
                        updated: labels.len(),
                    },
                    labels,
                }
            }
            ClassificationMode::Population => Self::reclassify_population(table, family),
        }
    }

    fn reclassify_population(
        table: &[EmployeeRecord],
        family: CompetencyFamily,
    ) -> GroupReclassification {
        let qualifying: Vec<(EmployeeId, f64)> = table
            .iter()
            .filter_map(|record| {
                complete_percentage(&record.profile, family).map(|pct| (record.id, pct))
            })
            .collect();

        let percentages: Vec<f64> = qualifying.iter().map(|(_, pct)| *pct).collect();
        let Some(thresholds) = PopulationThresholds::from_percentages(&percentages) else {
            return GroupReclassification {
                family,
                labels: Vec::new(),
                outcome: GroupOutcome::Skipped {
                    qualifying: qualifying.len(),
                },
            };
        };

        let percentages: HashMap<EmployeeId, f64> = qualifying.iter().copied().collect();
        let labels: Vec<_> = table
            .iter()
            .map(|record| {
                let label = percentages
                    .get(&record.id)
                    .map(|pct| thresholds.label(*pct))
                    .unwrap_or(Label::NotApplicable);
                (record.id, label)
            })
            .collect();

        GroupReclassification {
            family,
            outcome: GroupOutcome::Applied {
                qualifying: qualifying.len(),
                updated: labels.len(),
            },
            labels,
        }
    }
}
