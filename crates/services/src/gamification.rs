use std::sync::Arc;

use chrono::NaiveDate;

use drill_core::Clock;
use storage::repository::{KeyValueStore, StorageError};

pub const XP_KEY: &str = "pinyin_xp";
pub const STREAK_KEY: &str = "pinyin_streak";
pub const LAST_VISIT_KEY: &str = "pinyin_last_visit";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which answers earn experience points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XpRule {
    /// Every submitted answer earns the fixed award, right or wrong.
    #[default]
    EveryAnswer,
    CorrectAnswers,
}

impl XpRule {
    #[must_use]
    pub fn awards(self, correct: bool) -> bool {
        match self {
            XpRule::CorrectAnswers => correct,
            XpRule::EveryAnswer => true,
        }
    }
}

/// XP and daily-streak counters kept in a key/value store.
#[derive(Clone)]
pub struct Gamification {
    store: Arc<dyn KeyValueStore>,
    clock: Clock,
    xp_per_answer: u32,
    rule: XpRule,
}

impl Gamification {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Clock, xp_per_answer: u32) -> Self {
        Self {
            store,
            clock,
            xp_per_answer,
            rule: XpRule::default(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: XpRule) -> Self {
        self.rule = rule;
        self
    }

    #[must_use]
    pub fn rule(&self) -> XpRule {
        self.rule
    }

    /// Total experience points.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn xp(&self) -> Result<u32, StorageError> {
        self.read_u32(XP_KEY).await
    }

    /// Add `amount` and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or written.
    pub async fn add_xp(&self, amount: u32) -> Result<u32, StorageError> {
        let total = self.xp().await?.saturating_add(amount);
        self.store.set(XP_KEY, &total.to_string()).await?;
        Ok(total)
    }

    /// Apply the per-answer award. Returns the new total, or `None` when the
    /// answer earns nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counter cannot be updated.
    pub async fn record_answer(&self, correct: bool) -> Result<Option<u32>, StorageError> {
        if !self.rule.awards(correct) {
            return Ok(None);
        }
        self.add_xp(self.xp_per_answer).await.map(Some)
    }

    /// Current streak without touching it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn streak(&self) -> Result<u32, StorageError> {
        self.read_u32(STREAK_KEY).await
    }

    /// Register today's visit and return the updated streak.
    ///
    /// A visit on the day after the last one extends the streak, a repeat
    /// visit on the same day leaves it alone, anything else restarts at 1.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counters cannot be read or written.
    pub async fn record_visit(&self) -> Result<u32, StorageError> {
        let today = self.clock.today();
        let last_visit = self.last_visit().await?;
        let current = self.streak().await?;

        if last_visit == Some(today) {
            return Ok(current);
        }

        let streak = match last_visit {
            Some(last) if last.succ_opt() == Some(today) => current.saturating_add(1),
            _ => 1,
        };
        self.store.set(STREAK_KEY, &streak.to_string()).await?;
        self.store
            .set(LAST_VISIT_KEY, &today.format(DATE_FORMAT).to_string())
            .await?;
        tracing::debug!(streak, %today, "visit recorded");
        Ok(streak)
    }

    async fn last_visit(&self) -> Result<Option<NaiveDate>, StorageError> {
        let Some(raw) = self.store.get(LAST_VISIT_KEY).await? else {
            return Ok(None);
        };
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(err) => {
                tracing::warn!(value = %raw, error = %err, "ignoring malformed last visit");
                Ok(None)
            }
        }
    }

    async fn read_u32(&self, key: &str) -> Result<u32, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(0);
        };
        Ok(raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "counter is not a number, treating as 0");
            0
        }))
    }
}
