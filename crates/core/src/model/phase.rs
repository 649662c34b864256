use serde::{Deserialize, Serialize};
use std::fmt;

/// The five practice phases of the drill app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillPhase {
    /// Zhuyin initials and finals, typed or recognized.
    Sounds,
    /// Spelling-rule quizzes.
    Rules,
    /// Single characters, typed without tone marks.
    Characters,
    /// Two-character words.
    Words,
    /// Timed throughput drill.
    Speed,
}

impl DrillPhase {
    pub const ALL: [DrillPhase; 5] = [
        DrillPhase::Sounds,
        DrillPhase::Rules,
        DrillPhase::Characters,
        DrillPhase::Words,
        DrillPhase::Speed,
    ];

    /// Phase number as reported to the backend (1-based).
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            DrillPhase::Sounds => 1,
            DrillPhase::Rules => 2,
            DrillPhase::Characters => 3,
            DrillPhase::Words => 4,
            DrillPhase::Speed => 5,
        }
    }

    /// Mode label sent with the session summary.
    #[must_use]
    pub fn mode_label(self, mode: AnswerMode) -> &'static str {
        match (self, mode) {
            (DrillPhase::Speed, _) => "speed",
            (DrillPhase::Rules, _) => "quiz",
            (_, AnswerMode::MultipleChoice) => "recognition",
            (_, AnswerMode::Input) => "typing",
        }
    }
}

impl fmt::Display for DrillPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrillPhase::Sounds => "sounds",
            DrillPhase::Rules => "rules",
            DrillPhase::Characters => "characters",
            DrillPhase::Words => "words",
            DrillPhase::Speed => "speed",
        };
        f.write_str(name)
    }
}

/// How answers are collected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Free text typed by the learner.
    #[default]
    Input,
    /// One of a fixed set of options.
    MultipleChoice,
}

impl AnswerMode {
    /// Parses the user-facing mode names (`typing` / `recognition`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "typing" | "input" => Some(Self::Input),
            "recognition" | "choice" | "multiple_choice" => Some(Self::MultipleChoice),
            _ => None,
        }
    }
}
