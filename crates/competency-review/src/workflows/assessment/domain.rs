use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::classification::Classification;
use super::scoring::Score;
use crate::workflows::import::RawRow;

/// The two independently classified competency groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyFamily {
    Core,
    Emerging,
}

impl CompetencyFamily {
    pub const fn label(self) -> &'static str {
        match self {
            CompetencyFamily::Core => "core",
            CompetencyFamily::Emerging => "emerging",
        }
    }
}

/// Fixed set of assessed competencies. Each key has a paired `<key>_req` baseline column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyKey {
    Communication,
    ContinuousLearning,
    CriticalThinking,
    DataAnalysis,
    DigitalLiteracy,
    ProblemSolving,
    StrategicThinking,
    TalentManagement,
    TeamworkLeadership,
    CreativeThinking,
    Resilience,
    AiBigdata,
    AnalyticalThinking,
}

impl CompetencyKey {
    pub const ALL: [CompetencyKey; 13] = [
        CompetencyKey::Communication,
        CompetencyKey::ContinuousLearning,
        CompetencyKey::CriticalThinking,
        CompetencyKey::DataAnalysis,
        CompetencyKey::DigitalLiteracy,
        CompetencyKey::ProblemSolving,
        CompetencyKey::StrategicThinking,
        CompetencyKey::TalentManagement,
        CompetencyKey::TeamworkLeadership,
        CompetencyKey::CreativeThinking,
        CompetencyKey::Resilience,
        CompetencyKey::AiBigdata,
        CompetencyKey::AnalyticalThinking,
    ];

    pub const CORE: [CompetencyKey; 9] = [
        CompetencyKey::Communication,
        CompetencyKey::ContinuousLearning,
        CompetencyKey::CriticalThinking,
        CompetencyKey::DataAnalysis,
        CompetencyKey::DigitalLiteracy,
        CompetencyKey::ProblemSolving,
        CompetencyKey::StrategicThinking,
        CompetencyKey::TalentManagement,
        CompetencyKey::TeamworkLeadership,
    ];

    /// Core keys every title is assessed on.
    pub const BASE_CORE: [CompetencyKey; 6] = [
        CompetencyKey::Communication,
        CompetencyKey::ContinuousLearning,
        CompetencyKey::CriticalThinking,
        CompetencyKey::DataAnalysis,
        CompetencyKey::DigitalLiteracy,
        CompetencyKey::ProblemSolving,
    ];

    /// Core keys reserved for standard titles.
    pub const LEADERSHIP: [CompetencyKey; 3] = [
        CompetencyKey::StrategicThinking,
        CompetencyKey::TalentManagement,
        CompetencyKey::TeamworkLeadership,
    ];

    pub const EMERGING: [CompetencyKey; 4] = [
        CompetencyKey::CreativeThinking,
        CompetencyKey::Resilience,
        CompetencyKey::AiBigdata,
        CompetencyKey::AnalyticalThinking,
    ];

    pub const fn family(self) -> CompetencyFamily {
        match self {
            CompetencyKey::CreativeThinking
            | CompetencyKey::Resilience
            | CompetencyKey::AiBigdata
            | CompetencyKey::AnalyticalThinking => CompetencyFamily::Emerging,
            _ => CompetencyFamily::Core,
        }
    }

    pub const fn column(self) -> &'static str {
        match self {
            CompetencyKey::Communication => "communication",
            CompetencyKey::ContinuousLearning => "continuous_learning",
            CompetencyKey::CriticalThinking => "critical_thinking",
            CompetencyKey::DataAnalysis => "data_analysis",
            CompetencyKey::DigitalLiteracy => "digital_literacy",
            CompetencyKey::ProblemSolving => "problem_solving",
            CompetencyKey::StrategicThinking => "strategic_thinking",
            CompetencyKey::TalentManagement => "talent_management",
            CompetencyKey::TeamworkLeadership => "teamwork_leadership",
            CompetencyKey::CreativeThinking => "creative_thinking",
            CompetencyKey::Resilience => "resilience",
            CompetencyKey::AiBigdata => "ai_bigdata",
            CompetencyKey::AnalyticalThinking => "analytical_thinking",
        }
    }

    pub const fn requirement_column(self) -> &'static str {
        match self {
            CompetencyKey::Communication => "communication_req",
            CompetencyKey::ContinuousLearning => "continuous_learning_req",
            CompetencyKey::CriticalThinking => "critical_thinking_req",
            CompetencyKey::DataAnalysis => "data_analysis_req",
            CompetencyKey::DigitalLiteracy => "digital_literacy_req",
            CompetencyKey::ProblemSolving => "problem_solving_req",
            CompetencyKey::StrategicThinking => "strategic_thinking_req",
            CompetencyKey::TalentManagement => "talent_management_req",
            CompetencyKey::TeamworkLeadership => "teamwork_leadership_req",
            CompetencyKey::CreativeThinking => "creative_thinking_req",
            CompetencyKey::Resilience => "resilience_req",
            CompetencyKey::AiBigdata => "ai_bigdata_req",
            CompetencyKey::AnalyticalThinking => "analytical_thinking_req",
        }
    }

    /// Achieved-score column followed by its requirement column.
    pub const fn columns(self) -> [&'static str; 2] {
        [self.column(), self.requirement_column()]
    }
}

impl fmt::Display for CompetencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Capability tier derived from a title; drives which core keys apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleTier {
    Junior,
    Standard,
}

const JUNIOR_TITLES: [&str; 2] = ["Officer", "Senior"];

/// Role tag as entered, plus its tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title {
    label: String,
    tier: TitleTier,
}

impl Title {
    /// Returns `None` for blank input. Junior titles are matched case-insensitively and
    /// canonicalized to their usual spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let junior = JUNIOR_TITLES
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(trimmed));

        Some(match junior {
            Some(canonical) => Self {
                label: (*canonical).to_string(),
                tier: TitleTier::Junior,
            },
            None => Self {
                label: trimmed.to_string(),
                tier: TitleTier::Standard,
            },
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tier(&self) -> TitleTier {
        self.tier
    }

    pub fn is_junior(&self) -> bool {
        self.tier == TitleTier::Junior
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

/// Case-insensitive, whitespace-trimmed `(code, year)` identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EmployeeKey {
    code: String,
    year: String,
}

impl EmployeeKey {
    pub fn new(code: &str, year: &str) -> Self {
        Self {
            code: code.trim().to_lowercase(),
            year: year.trim().to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn year(&self) -> &str {
        &self.year
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.code, self.year)
    }
}

/// Storage-assigned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated achieved scores and requirement baselines. Absent keys are simply missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompetencyScores {
    scores: BTreeMap<CompetencyKey, Score>,
    requirements: BTreeMap<CompetencyKey, Score>,
}

impl CompetencyScores {
    pub fn set_score(&mut self, key: CompetencyKey, score: Score) {
        self.scores.insert(key, score);
    }

    pub fn set_requirement(&mut self, key: CompetencyKey, requirement: Score) {
        self.requirements.insert(key, requirement);
    }

    pub fn score(&self, key: CompetencyKey) -> Option<Score> {
        self.scores.get(&key).copied()
    }

    pub fn requirement(&self, key: CompetencyKey) -> Option<Score> {
        self.requirements.get(&key).copied()
    }
}

impl Serialize for CompetencyScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CompetencyKey::ALL.len() * 2))?;
        for key in CompetencyKey::ALL {
            map.serialize_entry(key.column(), &self.score(key))?;
        }
        for key in CompetencyKey::ALL {
            map.serialize_entry(key.requirement_column(), &self.requirement(key))?;
        }
        map.end()
    }
}

/// Normalized employee attributes shared by staged candidates and persisted records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeProfile {
    pub code: String,
    pub year: String,
    pub full_name: Option<String>,
    pub title: Title,
    pub department: Option<String>,
    pub division: Option<String>,
    #[serde(flatten)]
    pub competencies: CompetencyScores,
}

impl EmployeeProfile {
    pub fn key(&self) -> EmployeeKey {
        EmployeeKey::new(&self.code, &self.year)
    }
}

/// Validated row awaiting confirmation; labels stay pending until commit.
///
/// Keeps its upload position and raw cells so a confirm that finds the key taken can
/// still report the row the way staging rejections are reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub position: usize,
    #[serde(skip)]
    pub row: RawRow,
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    #[serde(flatten)]
    pub classification: Classification,
}

impl CandidateRecord {
    pub fn pending(position: usize, row: RawRow, profile: EmployeeProfile) -> Self {
        Self {
            position,
            row,
            profile,
            classification: Classification::pending(),
        }
    }
}

/// Persisted employee assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    #[serde(flatten)]
    pub classification: Classification,
    pub created_at: DateTime<Utc>,
}
