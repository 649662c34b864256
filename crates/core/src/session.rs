use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::evaluator::{AnswerMatch, normalize_input};
use crate::model::{
    AnswerMode, DrillItem, DrillPhase, ItemId, Mistake, SessionId, SessionSummary,
    SessionSummaryError, bounded_accuracy,
};
use crate::time::elapsed_secs;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no items available for session")]
    Empty,
    #[error("session is not in progress")]
    NotInProgress,
    #[error("session has not finished")]
    NotFinished,
    #[error("answer is blank")]
    BlankAnswer,
    #[error("answer does not select an option")]
    UnknownOption,
    #[error("item {item} has no option set")]
    MissingOptions { item: ItemId },
    #[error("session duration must be > 0")]
    InvalidDuration,
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}

impl SessionError {
    /// Malformed input that must leave the session untouched and show nothing.
    #[must_use]
    pub fn is_ignorable_input(&self) -> bool {
        matches!(self, SessionError::BlankAnswer | SessionError::UnknownOption)
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Parameters that distinguish one phase's session from another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub phase: DrillPhase,
    pub mode: AnswerMode,
    pub matcher: AnswerMatch,
}

impl SessionConfig {
    /// Typed answers compared exactly (case-insensitive).
    #[must_use]
    pub fn typing(phase: DrillPhase) -> Self {
        Self {
            phase,
            mode: AnswerMode::Input,
            matcher: AnswerMatch::Exact,
        }
    }

    /// Typed answers compared with tone marks removed.
    #[must_use]
    pub fn tone_insensitive(phase: DrillPhase) -> Self {
        Self {
            phase,
            mode: AnswerMode::Input,
            matcher: AnswerMatch::ToneInsensitive,
        }
    }

    /// Answers picked from each item's option set.
    #[must_use]
    pub fn choice(phase: DrillPhase) -> Self {
        Self {
            phase,
            mode: AnswerMode::MultipleChoice,
            matcher: AnswerMatch::Choice,
        }
    }
}

//
// ─── INPUT HANDLER ─────────────────────────────────────────────────────────────
//

/// What the session currently accepts as input.
///
/// Swapped on every transition, so a stale handler for a previous question
/// can never be consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputHandler {
    /// No question is open.
    Idle,
    /// Free text.
    Typing,
    /// One of these options, by 1-based number or by text.
    Choice { options: Vec<String> },
}

impl InputHandler {
    fn for_item(mode: AnswerMode, item: &DrillItem) -> Self {
        match mode {
            AnswerMode::Input => InputHandler::Typing,
            AnswerMode::MultipleChoice => InputHandler::Choice {
                options: item.options().map(<[String]>::to_vec).unwrap_or_default(),
            },
        }
    }

    /// Turn raw input into the answer to evaluate.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::BlankAnswer` for empty input,
    /// `SessionError::UnknownOption` for a choice that matches no option,
    /// and `SessionError::NotInProgress` when idle.
    pub fn resolve(&self, raw: &str) -> Result<String, SessionError> {
        let trimmed = raw.trim();
        if matches!(self, InputHandler::Idle) {
            return Err(SessionError::NotInProgress);
        }
        if trimmed.is_empty() {
            return Err(SessionError::BlankAnswer);
        }

        match self {
            InputHandler::Idle => Err(SessionError::NotInProgress),
            InputHandler::Typing => Ok(normalize_input(trimmed)),
            InputHandler::Choice { options } => {
                if let Ok(number) = trimmed.parse::<usize>() {
                    return number
                        .checked_sub(1)
                        .and_then(|idx| options.get(idx))
                        .cloned()
                        .ok_or(SessionError::UnknownOption);
                }
                options
                    .iter()
                    .find(|option| option.as_str() == trimmed)
                    .cloned()
                    .ok_or(SessionError::UnknownOption)
            }
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Finished,
}

/// Aggregated view of session progress, useful for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Result of one accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub item: DrillItem,
    pub submitted: String,
    pub correct: bool,
    pub finished: bool,
}

/// Bounded drill session: every item is asked once, in order.
///
/// `correct + wrong == cursor` holds between calls. The item list is fixed
/// once the session starts.
pub struct DrillSession {
    id: SessionId,
    config: SessionConfig,
    status: SessionStatus,
    items: Vec<DrillItem>,
    cursor: usize,
    correct: u32,
    wrong: u32,
    mistakes: Vec<Mistake>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    input: InputHandler,
}

impl DrillSession {
    /// A session that has not started yet.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: SessionId::generate(),
            config,
            status: SessionStatus::NotStarted,
            items: Vec::new(),
            cursor: 0,
            correct: 0,
            wrong: 0,
            mistakes: Vec::new(),
            started_at: None,
            completed_at: None,
            input: InputHandler::Idle,
        }
    }

    /// Create and start a session in one step.
    ///
    /// # Errors
    ///
    /// See [`DrillSession::start`].
    pub fn started(
        config: SessionConfig,
        items: Vec<DrillItem>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(config);
        session.start(items, started_at)?;
        Ok(session)
    }

    /// Start over with `items`, discarding whatever state the session had.
    ///
    /// On error the previous state is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `items` is empty, and
    /// `SessionError::MissingOptions` if a multiple-choice item has no options.
    pub fn start(
        &mut self,
        items: Vec<DrillItem>,
        started_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let Some(first) = items.first() else {
            return Err(SessionError::Empty);
        };
        if self.config.mode == AnswerMode::MultipleChoice {
            if let Some(bare) = items.iter().find(|item| item.options().is_none()) {
                return Err(SessionError::MissingOptions {
                    item: bare.id().clone(),
                });
            }
        }

        self.input = InputHandler::for_item(self.config.mode, first);
        self.id = SessionId::generate();
        self.status = SessionStatus::InProgress;
        self.items = items;
        self.cursor = 0;
        self.correct = 0;
        self.wrong = 0;
        self.mistakes = Vec::new();
        self.started_at = Some(started_at);
        self.completed_at = None;
        Ok(())
    }

    /// Evaluate an answer to the current item and advance by one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` before start or after finish.
    /// Returns `SessionError::BlankAnswer` / `SessionError::UnknownOption` for
    /// malformed input; the session is left untouched in that case.
    pub fn submit_answer(
        &mut self,
        raw: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::NotInProgress);
        }
        let submitted = self.input.resolve(raw)?;
        let item = self
            .items
            .get(self.cursor)
            .cloned()
            .ok_or(SessionError::NotInProgress)?;

        let correct = self.config.matcher.matches(&submitted, item.expected_answer());
        if correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
            self.mistakes.push(Mistake {
                prompt: item.prompt().to_string(),
                expected: item.expected_answer().to_string(),
                got: submitted.clone(),
            });
        }

        self.cursor += 1;
        match self.items.get(self.cursor) {
            Some(next) => self.input = InputHandler::for_item(self.config.mode, next),
            None => {
                self.status = SessionStatus::Finished;
                self.completed_at = Some(answered_at);
                self.input = InputHandler::Idle;
            }
        }

        Ok(AnswerOutcome {
            item,
            submitted,
            correct,
            finished: self.is_complete(),
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    #[must_use]
    pub fn input(&self) -> &InputHandler {
        &self.input
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&DrillItem> {
        if self.status == SessionStatus::InProgress {
            self.items.get(self.cursor)
        } else {
            None
        }
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.items.len(),
            answered: self.cursor,
            remaining: self.items.len().saturating_sub(self.cursor),
            is_complete: self.is_complete(),
        }
    }

    /// Percent correct so far; 0 when nothing has been answered.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        bounded_accuracy(self.correct, self.wrong)
    }

    /// Seconds since start, frozen once the session finishes.
    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => elapsed_secs(start, end),
            (Some(start), None) => elapsed_secs(start, now),
            _ => 0,
        }
    }

    /// Summary of a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` unless the session is finished.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        let (Some(started_at), Some(completed_at)) = (self.started_at, self.completed_at) else {
            return Err(SessionError::NotFinished);
        };
        Ok(SessionSummary::new(
            self.config.phase,
            self.config.mode,
            started_at,
            completed_at,
            self.correct,
            self.wrong,
            self.mistakes.clone(),
        )?)
    }
}

impl fmt::Debug for DrillSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillSession")
            .field("id", &self.id)
            .field("phase", &self.config.phase)
            .field("status", &self.status)
            .field("items_len", &self.items.len())
            .field("cursor", &self.cursor)
            .field("correct", &self.correct)
            .field("wrong", &self.wrong)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
