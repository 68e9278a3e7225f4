use serde::Serialize;

use super::Label;

/// Spread of a population's percentages and the thresholds derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopulationThresholds {
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub high: f64,
    pub low: f64,
}

impl PopulationThresholds {
    /// `high = max - σ`, `low = min + σ` with σ the sample standard deviation.
    /// Needs at least two percentages.
    pub fn from_percentages(percentages: &[f64]) -> Option<Self> {
        if percentages.len() < 2 {
            return None;
        }

        let count = percentages.len() as f64;
        let mean = percentages.iter().sum::<f64>() / count;
        let variance = percentages
            .iter()
            .map(|pct| (pct - mean).powi(2))
            .sum::<f64>()
            / (count - 1.0);
        let std_dev = variance.sqrt();

        let min = percentages.iter().copied().fold(f64::INFINITY, f64::min);
        let max = percentages.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            min,
            max,
            std_dev,
            high: max - std_dev,
            low: min + std_dev,
        })
    }

    /// Both thresholds are exclusive; a tie falls to medium.
    pub fn label(&self, pct: f64) -> Label {
        if pct > self.high {
            Label::High
        } else if pct < self.low {
            Label::Low
        } else {
            Label::Medium
        }
    }
}
