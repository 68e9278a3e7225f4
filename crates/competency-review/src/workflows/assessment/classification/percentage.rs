use super::Label;
use crate::workflows::assessment::domain::{CompetencyFamily, EmployeeProfile};
use crate::workflows::assessment::rules::CompetencyRuleSet;

pub const LOW_PERCENT: f64 = 70.0;
pub const HIGH_PERCENT: f64 = 90.0;

/// `< 70` is low, `> 90` is high; both bounds themselves are medium.
pub fn label_for_percentage(pct: f64) -> Label {
    if pct < LOW_PERCENT {
        Label::Low
    } else if pct > HIGH_PERCENT {
        Label::High
    } else {
        Label::Medium
    }
}

/// Percentage of requirement over whatever active values are present.
pub fn group_percentage(profile: &EmployeeProfile, family: CompetencyFamily) -> Option<f64> {
    let keys = CompetencyRuleSet::active_keys(profile.title.tier(), family);
    let scores: Vec<f64> = keys
        .iter()
        .filter_map(|key| profile.competencies.score(*key))
        .map(|score| score.value())
        .collect();
    let requirements: Vec<f64> = keys
        .iter()
        .filter_map(|key| profile.competencies.requirement(*key))
        .map(|score| score.value())
        .collect();

    ratio(&scores, &requirements)
}

/// Like [`group_percentage`] but only when every active key has both values.
pub(crate) fn complete_percentage(
    profile: &EmployeeProfile,
    family: CompetencyFamily,
) -> Option<f64> {
    let keys = CompetencyRuleSet::active_keys(profile.title.tier(), family);
    let mut scores = Vec::with_capacity(keys.len());
    let mut requirements = Vec::with_capacity(keys.len());

    for key in keys {
        scores.push(profile.competencies.score(*key)?.value());
        requirements.push(profile.competencies.requirement(*key)?.value());
    }

    ratio(&scores, &requirements)
}

fn ratio(scores: &[f64], requirements: &[f64]) -> Option<f64> {
    if scores.is_empty() || requirements.is_empty() {
        return None;
    }

    let required: f64 = requirements.iter().sum();
    if required == 0.0 {
        return None;
    }

    let achieved: f64 = scores.iter().sum();
    Some(100.0 * achieved / required)
}
