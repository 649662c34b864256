use thiserror::Error;
use url::Url;

pub const DEFAULT_CHARACTER_SESSION_SIZE: u32 = 30;
pub const DEFAULT_CHARACTER_FALLBACK_SIZE: u32 = 20;
pub const DEFAULT_WORD_SESSION_SIZE: u32 = 20;
pub const DEFAULT_SPEED_DURATIONS: [u32; 3] = [30, 60, 120];
pub const DEFAULT_XP_PER_ANSWER: u32 = 5;

/// Validated runtime settings for the drill app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSettings {
    api_base_url: Option<String>,
    character_session_size: u32,
    character_fallback_size: u32,
    word_session_size: u32,
    speed_durations: Vec<u32>,
    xp_per_answer: u32,
}

/// Unvalidated settings as collected from flags and environment.
#[derive(Clone, Debug, Default)]
pub struct AppSettingsDraft {
    pub api_base_url: Option<String>,
    pub character_session_size: Option<u32>,
    pub character_fallback_size: Option<u32>,
    pub word_session_size: Option<u32>,
    pub speed_durations: Option<Vec<u32>>,
    pub xp_per_answer: Option<u32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("invalid base URL")]
    InvalidBaseUrl,
    #[error("{field} must be > 0")]
    ZeroSize { field: &'static str },
    #[error("speed durations must be non-empty and > 0")]
    InvalidSpeedDurations,
}

impl AppSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the base URL does not parse or a size is zero.
    pub fn validate(self) -> Result<AppSettings, AppSettingsError> {
        let api_base_url = normalize_optional(self.api_base_url)
            .map(|url| url.trim_end_matches('/').to_string());
        if let Some(url) = api_base_url.as_ref() {
            if Url::parse(url).is_err() {
                return Err(AppSettingsError::InvalidBaseUrl);
            }
        }

        let character_session_size = positive(
            self.character_session_size,
            DEFAULT_CHARACTER_SESSION_SIZE,
            "character session size",
        )?;
        let character_fallback_size = positive(
            self.character_fallback_size,
            DEFAULT_CHARACTER_FALLBACK_SIZE,
            "character fallback size",
        )?;
        let word_session_size = positive(
            self.word_session_size,
            DEFAULT_WORD_SESSION_SIZE,
            "word session size",
        )?;

        let speed_durations = self
            .speed_durations
            .unwrap_or_else(|| DEFAULT_SPEED_DURATIONS.to_vec());
        if speed_durations.is_empty() || speed_durations.contains(&0) {
            return Err(AppSettingsError::InvalidSpeedDurations);
        }

        Ok(AppSettings {
            api_base_url,
            character_session_size,
            character_fallback_size,
            word_session_size,
            speed_durations,
            xp_per_answer: self.xp_per_answer.unwrap_or(DEFAULT_XP_PER_ANSWER),
        })
    }
}

impl AppSettings {
    /// Backend base URL; `None` runs fully offline.
    #[must_use]
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }

    #[must_use]
    pub fn character_session_size(&self) -> usize {
        usize::try_from(self.character_session_size).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn character_fallback_size(&self) -> usize {
        usize::try_from(self.character_fallback_size).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn word_session_size(&self) -> usize {
        usize::try_from(self.word_session_size).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn speed_durations(&self) -> &[u32] {
        &self.speed_durations
    }

    /// The default countdown: the middle offered duration.
    #[must_use]
    pub fn default_speed_duration(&self) -> u32 {
        self.speed_durations[self.speed_durations.len() / 2]
    }

    #[must_use]
    pub fn xp_per_answer(&self) -> u32 {
        self.xp_per_answer
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            character_session_size: DEFAULT_CHARACTER_SESSION_SIZE,
            character_fallback_size: DEFAULT_CHARACTER_FALLBACK_SIZE,
            word_session_size: DEFAULT_WORD_SESSION_SIZE,
            speed_durations: DEFAULT_SPEED_DURATIONS.to_vec(),
            xp_per_answer: DEFAULT_XP_PER_ANSWER,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn positive(
    value: Option<u32>,
    default: u32,
    field: &'static str,
) -> Result<u32, AppSettingsError> {
    match value {
        Some(0) => Err(AppSettingsError::ZeroSize { field }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_yields_defaults() {
        let settings = AppSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.default_speed_duration(), 60);
        assert_eq!(settings.xp_per_answer(), 5);
    }

    #[test]
    fn base_url_is_trimmed_and_checked() {
        let settings = AppSettingsDraft {
            api_base_url: Some(" http://localhost:8000/ ".into()),
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.api_base_url(), Some("http://localhost:8000"));

        let err = AppSettingsDraft {
            api_base_url: Some("not a url".into()),
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, AppSettingsError::InvalidBaseUrl);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let err = AppSettingsDraft {
            word_session_size: Some(0),
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppSettingsError::ZeroSize { .. }));

        let err = AppSettingsDraft {
            speed_durations: Some(vec![30, 0]),
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, AppSettingsError::InvalidSpeedDurations);
    }
}
