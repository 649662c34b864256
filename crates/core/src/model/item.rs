use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::ItemId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("item prompt cannot be empty")]
    EmptyPrompt,

    #[error("expected answer cannot be empty")]
    EmptyAnswer,
}

//
// ─── ITEM TYPE ─────────────────────────────────────────────────────────────────
//

/// Category an item is reported under to the spaced-repetition tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Initial,
    Final,
    Character,
    Word,
    /// A spelling-rule quiz question.
    Rule,
}

impl ItemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Initial => "initial",
            ItemType::Final => "final",
            ItemType::Character => "character",
            ItemType::Word => "word",
            ItemType::Rule => "rule",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── DRILL ITEM ────────────────────────────────────────────────────────────────
//

/// One question of a drill: what is shown, and what must be answered.
///
/// Items are immutable once drawn into a session. Multiple-choice option
/// sets are attached before the session starts (see [`crate::pool::with_choices`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillItem {
    id: ItemId,
    prompt: String,
    expected_answer: String,
    item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
}

impl DrillItem {
    /// Build a new item.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if the prompt or the expected answer is blank.
    pub fn new(
        id: impl Into<ItemId>,
        prompt: impl Into<String>,
        expected_answer: impl Into<String>,
        item_type: ItemType,
    ) -> Result<Self, ItemError> {
        let prompt = prompt.into();
        let expected_answer = expected_answer.into();
        if prompt.trim().is_empty() {
            return Err(ItemError::EmptyPrompt);
        }
        if expected_answer.trim().is_empty() {
            return Err(ItemError::EmptyAnswer);
        }

        Ok(Self {
            id: id.into(),
            prompt,
            expected_answer,
            item_type,
            options: None,
            hint: None,
            group: None,
        })
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.hint = (!hint.trim().is_empty()).then_some(hint);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    #[must_use]
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}
