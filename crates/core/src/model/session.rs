use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::phase::{AnswerMode, DrillPhase};
use crate::model::report::SessionReport;
use crate::time::elapsed_secs;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("mistake count ({mistakes}) exceeds wrong answers ({wrong})")]
    MistakeMismatch { mistakes: usize, wrong: u32 },
}

/// A wrong answer kept for the end-of-session review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub prompt: String,
    pub expected: String,
    pub got: String,
}

/// Accuracy of a bounded session in percent; an empty session scores 0.
#[must_use]
pub fn bounded_accuracy(correct: u32, wrong: u32) -> f64 {
    let total = correct + wrong;
    if total == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(total) * 100.0
    }
}

/// Aggregate of a finished, bounded drill session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    phase: DrillPhase,
    mode: AnswerMode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    correct: u32,
    wrong: u32,
    mistakes: Vec<Mistake>,
}

impl SessionSummary {
    /// Build a summary from final session counters.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::MistakeMismatch` if more mistakes than wrong answers are given.
    pub fn new(
        phase: DrillPhase,
        mode: AnswerMode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        correct: u32,
        wrong: u32,
        mistakes: Vec<Mistake>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if u32::try_from(mistakes.len()).map_or(true, |len| len > wrong) {
            return Err(SessionSummaryError::MistakeMismatch {
                mistakes: mistakes.len(),
                wrong,
            });
        }

        Ok(Self {
            phase,
            mode,
            started_at,
            completed_at,
            correct,
            wrong,
            mistakes,
        })
    }

    #[must_use]
    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    #[must_use]
    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct + self.wrong
    }

    #[must_use]
    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    /// Percent correct, 0 when nothing was answered.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        bounded_accuracy(self.correct, self.wrong)
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        elapsed_secs(self.started_at, self.completed_at)
    }

    /// Payload for `POST /api/session`.
    #[must_use]
    pub fn to_report(&self) -> SessionReport {
        SessionReport {
            phase: self.phase.number(),
            mode: self.phase.mode_label(self.mode).to_string(),
            duration: self.elapsed_secs(),
            total: self.total(),
            correct: self.correct,
        }
    }
}
