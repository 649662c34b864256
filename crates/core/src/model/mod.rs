mod app_settings;
mod ids;
mod item;
mod mapping;
mod phase;
mod report;
mod session;

pub use app_settings::{
    AppSettings, AppSettingsDraft, AppSettingsError, DEFAULT_CHARACTER_FALLBACK_SIZE,
    DEFAULT_CHARACTER_SESSION_SIZE, DEFAULT_SPEED_DURATIONS, DEFAULT_WORD_SESSION_SIZE,
    DEFAULT_XP_PER_ANSWER,
};
pub use ids::{ItemId, SessionId};
pub use item::{DrillItem, ItemError, ItemType};
pub use mapping::{ConfusionPair, GroupFilter, MappingEntry, MappingTable};
pub use phase::{AnswerMode, DrillPhase};
pub use report::{QUALITY_CORRECT, QUALITY_WRONG, ReviewEvent, SessionReport};
pub use session::{Mistake, SessionSummary, SessionSummaryError, bounded_accuracy};
