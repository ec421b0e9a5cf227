//! User preferences that influence how messages and badges are decorated.
//!
//! Preferences are a plain value handed to the engine on every call;
//! there is no process-wide preferences store.

use std::path::Path;

use chrono::{
    FixedOffset,
    format::{Item, StrftimeItems},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid preferences: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("UTC offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),
    #[error("invalid time format {0:?}")]
    InvalidTimeFormat(String),
}

/// The default `strftime`-style format of a message's time.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationPreferences {
    /// Debug option: append each event's display index to its time string.
    pub show_display_index: bool,
    /// The `chrono` format string used to render a message's time.
    pub time_format: String,
    /// The offset used to determine calendar dates and render times.
    /// If `None`, the system's local time zone is used.
    pub utc_offset_minutes: Option<i32>,
    /// Show a counter badge for rooms that only have unimportant unread messages.
    pub show_unimportant_counter_badge: bool,
}

impl Default for DecorationPreferences {
    fn default() -> Self {
        Self {
            show_display_index: false,
            time_format: DEFAULT_TIME_FORMAT.to_owned(),
            utc_offset_minutes: None,
            show_unimportant_counter_badge: true,
        }
    }
}

impl DecorationPreferences {
    pub fn from_json(json: &str) -> Result<Self, PreferencesError> {
        let prefs: Self = serde_json::from_str(json)?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Loads preferences from a JSON file. Missing fields take their default values.
    pub fn load(path: &Path) -> Result<Self, PreferencesError> {
        let json = std::fs::read_to_string(path).map_err(|source| PreferencesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), PreferencesError> {
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(PreferencesError::InvalidTimeFormat(self.time_format.clone()));
        }
        match self.utc_offset_minutes {
            Some(minutes) if self.fixed_offset().is_none() => {
                Err(PreferencesError::InvalidUtcOffset(minutes))
            }
            _ => Ok(()),
        }
    }

    /// The fixed UTC offset to use, or `None` to use the local time zone.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        let minutes = self.utc_offset_minutes?;
        FixedOffset::east_opt(minutes.checked_mul(60)?)
    }
}
