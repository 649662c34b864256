use rand::Rng;
use std::fmt;

use crate::evaluator::{AnswerMatch, normalize_input};
use crate::model::{DrillItem, DrillPhase, SessionId, SessionReport};
use crate::pool::shuffle;
use crate::session::{SessionError, SessionStatus};

/// Accuracy of a timed session in percent; an empty session scores 100.
#[must_use]
pub fn timed_accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        100.0
    } else {
        f64::from(correct) / f64::from(total) * 100.0
    }
}

/// Correct answers per minute over `elapsed_secs`; 0 before any time passed.
#[must_use]
pub fn throughput_per_minute(correct: u32, elapsed_secs: u32) -> f64 {
    if elapsed_secs == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(elapsed_secs) * 60.0
    }
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { time_left: u32 },
    Expired,
    /// The session had already ended; nothing changed.
    Stopped,
}

/// Result of one answer in a timed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedAnswer {
    pub item: DrillItem,
    pub submitted: String,
    pub correct: bool,
}

/// Countdown session that cycles through its pool until time runs out.
///
/// Running out of items reshuffles the pool and starts again from the top;
/// only the countdown (or an explicit stop) ends the session.
pub struct TimedSession {
    id: SessionId,
    matcher: AnswerMatch,
    pool: Vec<DrillItem>,
    order: Vec<DrillItem>,
    cursor: usize,
    duration_secs: u32,
    time_left: u32,
    total: u32,
    correct: u32,
    status: SessionStatus,
}

impl TimedSession {
    /// Shuffle `pool` and start the countdown at `duration_secs`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty pool and
    /// `SessionError::InvalidDuration` for a zero duration.
    pub fn start<R: Rng + ?Sized>(
        pool: Vec<DrillItem>,
        duration_secs: u32,
        matcher: AnswerMatch,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if pool.is_empty() {
            return Err(SessionError::Empty);
        }
        if duration_secs == 0 {
            return Err(SessionError::InvalidDuration);
        }

        let order = shuffle(&pool, rng);
        Ok(Self {
            id: SessionId::generate(),
            matcher,
            pool,
            order,
            cursor: 0,
            duration_secs,
            time_left: duration_secs,
            total: 0,
            correct: 0,
            status: SessionStatus::InProgress,
        })
    }

    /// Evaluate an answer and move straight on to the next item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` once time is up and
    /// `SessionError::BlankAnswer` for empty input (nothing is counted).
    pub fn submit_answer<R: Rng + ?Sized>(
        &mut self,
        raw: &str,
        rng: &mut R,
    ) -> Result<TimedAnswer, SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::NotInProgress);
        }
        let submitted = normalize_input(raw);
        if submitted.is_empty() {
            return Err(SessionError::BlankAnswer);
        }
        let item = self
            .order
            .get(self.cursor)
            .cloned()
            .ok_or(SessionError::Empty)?;

        let correct = self.matcher.matches(&submitted, item.expected_answer());
        self.total += 1;
        if correct {
            self.correct += 1;
        }

        self.cursor += 1;
        if self.cursor >= self.order.len() {
            self.order = shuffle(&self.pool, rng);
            self.cursor = 0;
        }

        Ok(TimedAnswer {
            item,
            submitted,
            correct,
        })
    }

    /// Count down one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::InProgress {
            return TickOutcome::Stopped;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.status = SessionStatus::Finished;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                time_left: self.time_left,
            }
        }
    }

    /// End the session early. Returns false if it had already ended.
    pub fn stop(&mut self) -> bool {
        if self.status == SessionStatus::InProgress {
            self.status = SessionStatus::Finished;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&DrillItem> {
        if self.is_running() {
            self.order.get(self.cursor)
        } else {
            None
        }
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs - self.time_left
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Correct answers per minute of elapsed countdown.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        throughput_per_minute(self.correct, self.elapsed_secs())
    }

    /// Percent correct; 100 before the first answer.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        timed_accuracy(self.correct, self.total)
    }

    /// Payload for `POST /api/session`, using the configured duration.
    #[must_use]
    pub fn to_report(&self) -> SessionReport {
        SessionReport {
            phase: DrillPhase::Speed.number(),
            mode: "speed".to_string(),
            duration: u64::from(self.duration_secs),
            total: self.total,
            correct: self.correct,
        }
    }
}

impl fmt::Debug for TimedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("pool_len", &self.pool.len())
            .field("cursor", &self.cursor)
            .field("time_left", &self.time_left)
            .field("total", &self.total)
            .field("correct", &self.correct)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(answers: &[&str]) -> Vec<DrillItem> {
        answers
            .iter()
            .map(|a| DrillItem::new(*a, format!("z-{a}"), *a, ItemType::Initial).unwrap())
            .collect()
    }

    fn answer_current(session: &mut TimedSession, rng: &mut StdRng) -> TimedAnswer {
        let expected = session.current_item().unwrap().expected_answer().to_string();
        session.submit_answer(&expected, rng).unwrap()
    }

    #[test]
    fn throughput_matches_elapsed_countdown() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session =
            TimedSession::start(pool(&["b", "p", "m", "f"]), 60, AnswerMatch::Exact, &mut rng)
                .unwrap();

        for _ in 0..10 {
            assert!(answer_current(&mut session, &mut rng).correct);
        }
        for _ in 0..30 {
            session.tick();
        }

        assert_eq!(session.elapsed_secs(), 30);
        assert!((session.throughput() - 20.0).abs() < f64::EPSILON);
        assert!((session.accuracy_percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_timed_session_reports_full_accuracy() {
        let mut rng = StdRng::seed_from_u64(2);
        let session = TimedSession::start(pool(&["b"]), 30, AnswerMatch::Exact, &mut rng).unwrap();
        assert_eq!(session.accuracy_percent(), 100.0);
        assert_eq!(session.throughput(), 0.0);
    }

    #[test]
    fn pool_cycles_instead_of_finishing() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session =
            TimedSession::start(pool(&["d", "t", "n"]), 60, AnswerMatch::Exact, &mut rng).unwrap();

        for _ in 0..10 {
            answer_current(&mut session, &mut rng);
            assert!(session.is_running());
            assert!(session.current_item().is_some());
        }
        assert_eq!(session.total(), 10);
        assert_eq!(session.correct(), 10);
    }

    #[test]
    fn wrong_answers_count_toward_total_only() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session =
            TimedSession::start(pool(&["g", "k"]), 60, AnswerMatch::Exact, &mut rng).unwrap();
        let outcome = session.submit_answer("zzz", &mut rng).unwrap();
        assert!(!outcome.correct);
        answer_current(&mut session, &mut rng);

        assert_eq!(session.total(), 2);
        assert_eq!(session.correct(), 1);
        assert!((session.accuracy_percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn countdown_expiry_ends_session() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = TimedSession::start(pool(&["h"]), 2, AnswerMatch::Exact, &mut rng).unwrap();

        assert_eq!(session.tick(), TickOutcome::Running { time_left: 1 });
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.tick(), TickOutcome::Stopped);
        assert_eq!(session.time_left(), 0);
        assert_eq!(
            session.submit_answer("h", &mut rng).unwrap_err(),
            SessionError::NotInProgress
        );

        let report = session.to_report();
        assert_eq!(report.phase, 5);
        assert_eq!(report.mode, "speed");
        assert_eq!(report.duration, 2);
    }

    #[test]
    fn stop_freezes_the_countdown() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = TimedSession::start(pool(&["j"]), 30, AnswerMatch::Exact, &mut rng).unwrap();
        session.tick();
        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.tick(), TickOutcome::Stopped);
        assert_eq!(session.time_left(), 29);
    }

    #[test]
    fn blank_input_is_not_counted() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = TimedSession::start(pool(&["q"]), 30, AnswerMatch::Exact, &mut rng).unwrap();
        assert_eq!(
            session.submit_answer("  ", &mut rng).unwrap_err(),
            SessionError::BlankAnswer
        );
        assert_eq!(session.total(), 0);
    }

    #[test]
    fn rejects_empty_pool_and_zero_duration() {
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(
            TimedSession::start(Vec::new(), 30, AnswerMatch::Exact, &mut rng).unwrap_err(),
            SessionError::Empty
        );
        assert_eq!(
            TimedSession::start(pool(&["x"]), 0, AnswerMatch::Exact, &mut rng).unwrap_err(),
            SessionError::InvalidDuration
        );
    }
}
