use serde::{Deserialize, Serialize};

use crate::model::ids::ItemId;
use crate::model::item::{DrillItem, ItemType};

/// Quality score forwarded for a correct answer.
pub const QUALITY_CORRECT: u8 = 5;
/// Quality score forwarded for a wrong answer.
pub const QUALITY_WRONG: u8 = 1;

/// Body of `POST /api/review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub correct: bool,
    pub quality: u8,
}

impl ReviewEvent {
    /// Review signal for one answered item.
    #[must_use]
    pub fn for_answer(item: &DrillItem, correct: bool) -> Self {
        Self {
            item_id: item.id().clone(),
            item_type: item.item_type(),
            correct,
            quality: if correct { QUALITY_CORRECT } else { QUALITY_WRONG },
        }
    }
}

/// Body of `POST /api/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub phase: u8,
    pub mode: String,
    /// Seconds.
    pub duration: u64,
    pub total: u32,
    pub correct: u32,
}
