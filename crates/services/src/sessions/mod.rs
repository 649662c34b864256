mod drill;
mod speed;

// Public API of the session subsystem.
pub use drill::{AnswerFeedback, DrillService, PhaseRequest};
pub use speed::{SpeedDrill, SpeedFeedback, SpeedService, SpeedStats};
