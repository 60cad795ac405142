use sanitize_filename::{Options, sanitize_with_options};
use tracing::debug;

use crate::{
    error::{Error, Result},
    history::Field,
    video::{MediaFile, episode_id},
};

/// The four fields describing a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    pub title: String,
    pub year: String,
    pub season: u32,
    pub episode: u32,
}

impl RenameRecord {
    /// Parses raw field text. An empty season or episode means 1.
    pub fn parse(title: &str, year: &str, season: &str, episode: &str) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            year: year.trim().to_string(),
            season: parse_number(Field::Season, season)?,
            episode: parse_number(Field::Episode, episode)?,
        })
    }

    /// The text remembered in history for `field`.
    pub fn field_value(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Year => self.year.clone(),
            Field::Season => self.season.to_string(),
            Field::Episode => self.episode.to_string(),
        }
    }
}

/// Parses a season or episode number; blank input defaults to 1.
pub fn parse_number(field: Field, text: &str) -> Result<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(1);
    }
    text.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "{field} must be a whole number of zero or more, got {text:?}"
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlanEntry {
    pub source: String,
    pub target: String,
    pub season: u32,
    pub episode: u32,
}

/// Drops characters that cannot appear in a filename. Never shortens the
/// text, so an over-long name fails when renaming instead of losing its
/// episode suffix.
fn clean_field(text: &str) -> String {
    sanitize_with_options(
        text,
        Options {
            truncate: false,
            ..Options::default()
        },
    )
}

/// Name of an episode under the fixed `Title (Year) - SxxExx.ext` scheme.
pub fn target_name(record: &RenameRecord, episode: u32, extension: &str) -> String {
    format!(
        "{} ({}) - {}.{}",
        clean_field(&record.title),
        clean_field(&record.year),
        episode_id(record.season, episode),
        extension.to_lowercase()
    )
}

/// Assigns consecutive episode numbers to `files`, in order, starting at
/// `record.episode`. The season never changes within a batch.
pub fn plan(files: &[MediaFile], record: &RenameRecord) -> Result<Vec<RenamePlanEntry>> {
    if clean_field(&record.title).trim().is_empty() {
        return Err(Error::InvalidInput(
            "title must contain characters allowed in a filename".to_string(),
        ));
    }
    let last_offset = u32::try_from(files.len().saturating_sub(1))
        .map_err(|_| Error::InvalidInput("too many files".to_string()))?;
    if record.episode.checked_add(last_offset).is_none() {
        return Err(Error::InvalidInput(format!(
            "episode numbers starting at {} overflow for {} files",
            record.episode,
            files.len()
        )));
    }

    let entries: Vec<RenamePlanEntry> = files
        .iter()
        .enumerate()
        .map(|(k, file)| {
            let episode = record.episode + k as u32;
            RenamePlanEntry {
                source: file.name.clone(),
                target: target_name(record, episode, &file.extension),
                season: record.season,
                episode,
            }
        })
        .collect();

    debug!(count = entries.len(), title = %record.title, "Planned renames");
    Ok(entries)
}
