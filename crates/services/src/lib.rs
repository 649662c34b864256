#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod gamification;
pub mod item_source;
pub mod offline;
pub mod reporter;
pub mod sessions;

#[cfg(test)]
mod test_support;

pub use drill_core::Clock;

pub use api::{BackendClient, DisabledTransport, HttpTransport, Transport};
pub use app_services::{AppServices, MappingOrigin};
pub use dashboard::{Dashboard, DashboardService};
pub use error::{ApiError, AppServicesError, DrillError};
pub use gamification::{Gamification, XpRule};
pub use item_source::{CharacterLookup, ItemSource};
pub use offline::{CachedFetcher, FetchPolicy};
pub use reporter::{ProgressReporter, ProgressSink};
pub use sessions::{
    AnswerFeedback, DrillService, PhaseRequest, SpeedDrill, SpeedFeedback, SpeedService,
    SpeedStats,
};
