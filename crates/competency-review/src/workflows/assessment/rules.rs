use super::domain::{CompetencyFamily, CompetencyKey, Title, TitleTier};
use crate::workflows::import::RawRow;

/// Title-conditioned competency applicability.
pub struct CompetencyRuleSet;

impl CompetencyRuleSet {
    pub fn active_core_keys(tier: TitleTier) -> &'static [CompetencyKey] {
        match tier {
            TitleTier::Junior => &CompetencyKey::BASE_CORE,
            TitleTier::Standard => &CompetencyKey::CORE,
        }
    }

    /// Emerging keys apply to every title.
    pub fn active_keys(tier: TitleTier, family: CompetencyFamily) -> &'static [CompetencyKey] {
        match family {
            CompetencyFamily::Core => Self::active_core_keys(tier),
            CompetencyFamily::Emerging => &CompetencyKey::EMERGING,
        }
    }

    pub fn forbidden_keys(tier: TitleTier) -> &'static [CompetencyKey] {
        match tier {
            TitleTier::Junior => &CompetencyKey::LEADERSHIP,
            TitleTier::Standard => &[],
        }
    }

    /// One violation per filled score or requirement column the title may not use.
    pub fn validate_forbidden(title: &Title, row: &RawRow) -> Vec<String> {
        Self::forbidden_keys(title.tier())
            .iter()
            .flat_map(|key| key.columns())
            .filter(|column| row.is_filled(column))
            .map(|column| format!("{} not allowed to fill {}", title, column))
            .collect()
    }
}
