//! Answer comparison for typed and multiple-choice drills.

/// How a submitted answer is compared against the expected one.
///
/// Only the characters phase strips tone marks; the other typing phases
/// compare spellings as-is. The two are kept separate on purpose until
/// product decides whether tone-free input should be accepted everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMatch {
    /// Case-insensitive, whitespace-trimmed equality.
    #[default]
    Exact,
    /// Like `Exact`, after mapping tone-marked vowels to their base letter.
    ToneInsensitive,
    /// The chosen option must equal the canonical answer byte for byte.
    Choice,
}

impl AnswerMatch {
    /// Returns true when `submitted` counts as a correct answer to `expected`.
    #[must_use]
    pub fn matches(self, submitted: &str, expected: &str) -> bool {
        match self {
            AnswerMatch::Exact => normalize_input(submitted) == expected.to_lowercase(),
            AnswerMatch::ToneInsensitive => {
                strip_tone_marks(&normalize_input(submitted))
                    == strip_tone_marks(&expected.to_lowercase())
            }
            AnswerMatch::Choice => submitted == expected,
        }
    }
}

/// Trim surrounding whitespace and lowercase.
#[must_use]
pub fn normalize_input(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Map each tone-marked vowel to its unaccented base letter.
///
/// Tone-marked ü becomes `v`, the usual keyboard spelling; a bare `ü` is left alone.
#[must_use]
pub fn strip_tone_marks(text: &str) -> String {
    text.chars().map(base_vowel).collect()
}

fn base_vowel(c: char) -> char {
    match c {
        'ā' | 'á' | 'ǎ' | 'à' => 'a',
        'ē' | 'é' | 'ě' | 'è' => 'e',
        'ī' | 'í' | 'ǐ' | 'ì' => 'i',
        'ō' | 'ó' | 'ǒ' | 'ò' => 'o',
        'ū' | 'ú' | 'ǔ' | 'ù' => 'u',
        'ǖ' | 'ǘ' | 'ǚ' | 'ǜ' => 'v',
        other => other,
    }
}
