use std::sync::Arc;

use chrono::{DateTime, Utc};

use drill_core::model::{ItemType, MappingEntry, MappingTable};

use crate::api::{BackendClient, ItemProgress, ProgressSnapshot, SessionRecord};
use crate::error::ApiError;

const WEAK_ITEM_LIMIT: usize = 10;
const RECENT_SESSION_LIMIT: usize = 10;
const MASTERED_REPETITIONS: u32 = 3;

/// Mastery level 0..=4 for one item's history.
///
/// 0 never seen, 1 only wrong answers, 2 at least one repetition,
/// 3 at least three, 4 at least five.
#[must_use]
pub fn mastery_level(progress: Option<&ItemProgress>) -> u8 {
    let Some(progress) = progress else {
        return 0;
    };
    match progress.repetitions {
        5.. => 4,
        3..=4 => 3,
        1..=2 => 2,
        0 if progress.wrong_count > 0 => 1,
        0 => 0,
    }
}

/// One cell of the initials or finals grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryCell {
    pub pinyin: String,
    pub zhuyin: String,
    pub level: u8,
}

/// Presentation-agnostic row for a stored session.
///
/// Timestamps are left unformatted; the front end picks the locale.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub created_at: Option<DateTime<Utc>>,
    pub phase: u8,
    pub mode: String,
    pub duration: u64,
    pub total: u32,
    pub correct: u32,
    /// Rounded percent; 0 for an empty session.
    pub accuracy: u32,
}

impl SessionRow {
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_record(record: &SessionRecord) -> Self {
        let accuracy = if record.total == 0 {
            0
        } else {
            (f64::from(record.correct) / f64::from(record.total) * 100.0).round() as u32
        };
        Self {
            created_at: timestamp(record.created_at),
            phase: record.phase,
            mode: record.mode.clone(),
            duration: record.duration,
            total: record.total,
            correct: record.correct,
            accuracy,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Aggregated learning progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub studied: usize,
    pub mastered: usize,
    /// Initials plus finals.
    pub total_items: usize,
    pub session_count: usize,
    pub initials: Vec<MasteryCell>,
    pub finals: Vec<MasteryCell>,
    /// Items with wrong answers, most wrong first.
    pub weak_items: Vec<ItemProgress>,
    pub recent_sessions: Vec<SessionRow>,
}

impl Dashboard {
    #[must_use]
    pub fn build(snapshot: &ProgressSnapshot, mappings: &MappingTable) -> Self {
        let mut weak_items: Vec<ItemProgress> = snapshot
            .items
            .iter()
            .filter(|item| item.wrong_count > 0)
            .cloned()
            .collect();
        // Stable, so ties keep backend order.
        weak_items.sort_by(|a, b| b.wrong_count.cmp(&a.wrong_count));
        weak_items.truncate(WEAK_ITEM_LIMIT);

        Self {
            studied: snapshot.items.len(),
            mastered: snapshot
                .items
                .iter()
                .filter(|item| item.repetitions >= MASTERED_REPETITIONS)
                .count(),
            total_items: mappings.sound_count(),
            session_count: snapshot.sessions.len(),
            initials: grid(&mappings.initials, ItemType::Initial, &snapshot.items),
            finals: grid(&mappings.finals, ItemType::Final, &snapshot.items),
            weak_items,
            recent_sessions: snapshot
                .sessions
                .iter()
                .take(RECENT_SESSION_LIMIT)
                .map(SessionRow::from_record)
                .collect(),
        }
    }
}

fn grid(entries: &[MappingEntry], item_type: ItemType, items: &[ItemProgress]) -> Vec<MasteryCell> {
    entries
        .iter()
        .map(|entry| {
            let progress = items
                .iter()
                .find(|p| p.item_id == entry.pinyin && p.item_type == item_type.as_str());
            MasteryCell {
                pinyin: entry.pinyin.clone(),
                zhuyin: entry.zhuyin.clone(),
                level: mastery_level(progress),
            }
        })
        .collect()
}

/// Loads the dashboard from the backend.
#[derive(Clone)]
pub struct DashboardService {
    client: Arc<BackendClient>,
    mappings: MappingTable,
}

impl DashboardService {
    #[must_use]
    pub fn new(client: Arc<BackendClient>, mappings: MappingTable) -> Self {
        Self { client, mappings }
    }

    /// # Errors
    ///
    /// Returns `ApiError` when progress is neither reachable nor cached.
    pub async fn load(&self) -> Result<Dashboard, ApiError> {
        let snapshot = self.client.progress().await?;
        Ok(Dashboard::build(&snapshot, &self.mappings))
    }
}
