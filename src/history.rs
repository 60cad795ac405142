use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::{error::Result, plan::RenameRecord};

pub const MAX_ENTRIES: usize = 20;

const HISTORY_FILE_NAME: &str = ".batch_renamer_history.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Year,
    Season,
    Episode,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Year, Field::Season, Field::Episode];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Year => "year",
            Field::Season => "season",
            Field::Episode => "episode",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Previously submitted values for each input field, most recent last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryStore {
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub year: Vec<String>,
    #[serde(default)]
    pub season: Vec<String>,
    #[serde(default)]
    pub episode: Vec<String>,
}

/// Location of the history file in the user's home directory.
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(HISTORY_FILE_NAME)
}

impl HistoryStore {
    /// Reads the store from `path`. Never fails: a missing or corrupt file
    /// yields an empty store.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No history file yet");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read history");
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed history");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Saved history");
        Ok(())
    }

    pub fn values(&self, field: Field) -> &[String] {
        match field {
            Field::Title => &self.title,
            Field::Year => &self.year,
            Field::Season => &self.season,
            Field::Episode => &self.episode,
        }
    }

    fn values_mut(&mut self, field: Field) -> &mut Vec<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Year => &mut self.year,
            Field::Season => &mut self.season,
            Field::Episode => &mut self.episode,
        }
    }

    /// Value used to pre-fill `field`, or `""` when nothing was recorded.
    pub fn default_for(&self, field: Field) -> &str {
        self.values(field).last().map(String::as_str).unwrap_or("")
    }

    /// Remembers the fields of a confirmed submission.
    ///
    /// A value already present keeps its position; new values are appended
    /// and the oldest entries are dropped beyond [`MAX_ENTRIES`].
    pub fn record_submission(&mut self, record: &RenameRecord) {
        for field in Field::ALL {
            let value = record.field_value(field);
            let values = self.values_mut(field);
            if !values.contains(&value) {
                values.push(value);
            }
            if values.len() > MAX_ENTRIES {
                let excess = values.len() - MAX_ENTRIES;
                values.drain(..excess);
            }
        }
    }
}
