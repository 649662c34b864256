use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;

use drill_core::Clock;
use drill_core::catalog::RuleTopic;
use drill_core::model::{
    AnswerMode, DrillItem, DrillPhase, GroupFilter, ReviewEvent, SessionSummary,
};
use drill_core::session::{AnswerOutcome, DrillSession, SessionConfig};

use crate::error::DrillError;
use crate::gamification::Gamification;
use crate::item_source::ItemSource;
use crate::reporter::ProgressReporter;

/// What to drill in a bounded session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseRequest {
    Sounds { filter: GroupFilter, mode: AnswerMode },
    Rules { topic: RuleTopic },
    Characters,
    Words,
}

impl PhaseRequest {
    #[must_use]
    pub fn phase(&self) -> DrillPhase {
        match self {
            PhaseRequest::Sounds { .. } => DrillPhase::Sounds,
            PhaseRequest::Rules { .. } => DrillPhase::Rules,
            PhaseRequest::Characters => DrillPhase::Characters,
            PhaseRequest::Words => DrillPhase::Words,
        }
    }

    /// Answer collection and comparison for the phase.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        match self {
            PhaseRequest::Sounds {
                mode: AnswerMode::MultipleChoice,
                ..
            } => SessionConfig::choice(DrillPhase::Sounds),
            PhaseRequest::Sounds { .. } => SessionConfig::typing(DrillPhase::Sounds),
            PhaseRequest::Rules { .. } => SessionConfig::choice(DrillPhase::Rules),
            PhaseRequest::Characters => SessionConfig::tone_insensitive(DrillPhase::Characters),
            PhaseRequest::Words => SessionConfig::typing(DrillPhase::Words),
        }
    }
}

/// Everything the front end shows after an accepted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub outcome: AnswerOutcome,
    /// Item hint or rule explanation, given after a wrong answer.
    pub hint: Option<String>,
    /// New XP total when this answer earned points.
    pub xp_total: Option<u32>,
    /// Present once the answer finished the session.
    pub summary: Option<SessionSummary>,
}

/// Runs bounded sessions for every phase through one state machine.
pub struct DrillService {
    clock: Clock,
    source: Arc<ItemSource>,
    reporter: ProgressReporter,
    gamification: Gamification,
    rng: Mutex<StdRng>,
}

impl DrillService {
    #[must_use]
    pub fn new(
        clock: Clock,
        source: Arc<ItemSource>,
        reporter: ProgressReporter,
        gamification: Gamification,
    ) -> Self {
        Self {
            clock,
            source,
            reporter,
            gamification,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Make draws reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Draw the items for `request`.
    ///
    /// # Errors
    ///
    /// Returns `DrillError` if the items cannot be built (for example a rule
    /// topic without quiz, or a recognition item with no distractor).
    pub async fn prepare_items(&self, request: &PhaseRequest) -> Result<Vec<DrillItem>, DrillError> {
        match request {
            PhaseRequest::Sounds { filter, mode } => {
                self.with_rng(|rng| self.source.sounds(filter, *mode, rng))
            }
            PhaseRequest::Rules { topic } => self.with_rng(|rng| self.source.rules(*topic, rng)),
            PhaseRequest::Characters => {
                let candidates = self.with_rng(|rng| self.source.character_candidates(rng));
                let items = self.source.resolve_characters(&candidates).await;
                if items.is_empty() {
                    tracing::info!("no character readings available, using sound fallback");
                    self.with_rng(|rng| self.source.character_fallback(rng))
                } else {
                    Ok(items)
                }
            }
            PhaseRequest::Words => Ok(self.with_rng(|rng| self.source.words(rng))),
        }
    }

    /// Start a fresh session for `request`.
    ///
    /// The caller keeps whatever session it had when this fails, which makes
    /// a failed start a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Session` with `SessionError::Empty` when nothing
    /// matched, or any error from [`DrillService::prepare_items`].
    pub async fn start(&self, request: &PhaseRequest) -> Result<DrillSession, DrillError> {
        let items = self.prepare_items(request).await?;
        let session = DrillSession::started(request.config(), items, self.clock.now())?;
        tracing::info!(
            phase = %request.phase(),
            items = session.total_items(),
            "session started"
        );
        Ok(session)
    }

    /// Submit one answer and run its side effects.
    ///
    /// Blank or unrecognised input is ignored and yields `Ok(None)`. The review
    /// report and the session summary are sent in the background; XP failures
    /// are logged and do not affect the session.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Session` if the session is not in progress.
    pub async fn submit(
        &self,
        session: &mut DrillSession,
        raw: &str,
    ) -> Result<Option<AnswerFeedback>, DrillError> {
        let outcome = match session.submit_answer(raw, self.clock.now()) {
            Ok(outcome) => outcome,
            Err(err) if err.is_ignorable_input() => {
                tracing::debug!(error = %err, "input ignored");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        self.reporter
            .report_review(ReviewEvent::for_answer(&outcome.item, outcome.correct));

        let xp_total = match self.gamification.record_answer(outcome.correct).await {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!(error = %err, "xp award failed");
                None
            }
        };

        let summary = if outcome.finished {
            let summary = session.summary()?;
            tracing::info!(
                phase = %summary.phase(),
                correct = summary.correct(),
                total = summary.total(),
                "session finished"
            );
            self.reporter.report_session(summary.to_report());
            Some(summary)
        } else {
            None
        };

        let hint = if outcome.correct {
            None
        } else {
            outcome.item.hint().map(str::to_string)
        };

        Ok(Some(AnswerFeedback {
            outcome,
            hint,
            xp_total,
            summary,
        }))
    }
}
