use serde::Serialize;

use crate::workflows::import::RawValue;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

/// Score or requirement baseline constrained to `[1.0, 5.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() {
            return Err(ScoreError::NotNumeric {
                raw: value.to_string(),
            });
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(ScoreError::OutOfRange { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("'{raw}' is not a number")]
    NotNumeric { raw: String },
    #[error("{value} is outside the allowed range 1-5")]
    OutOfRange { value: f64 },
}

/// Normalizes raw cells into scores. Out-of-range values are rejected, never clamped.
pub struct ScoreValidator;

impl ScoreValidator {
    /// `Ok(None)` for a blank cell, `Ok(Some(_))` for a valid score, `Err` otherwise.
    pub fn normalize(raw: &RawValue) -> Result<Option<Score>, ScoreError> {
        match raw {
            RawValue::Blank => Ok(None),
            RawValue::Number(number) => Score::new(*number).map(Some),
            RawValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                let number = trimmed
                    .parse::<f64>()
                    .map_err(|_| ScoreError::NotNumeric {
                        raw: trimmed.to_string(),
                    })?;
                Score::new(number).map(Some)
            }
        }
    }
}
