use std::path::Path;

/// Extensions recognised as episodes, lower-case and without the dot.
pub const MEDIA_EXTENSIONS: [&str; 7] = ["mp4", "mkv", "avi", "mov", "flv", "wmv", "m4v"];

/// A media file found in the scanned folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub extension: String,
}

impl MediaFile {
    /// Builds a `MediaFile` from a bare filename, or `None` when the
    /// extension is not a recognised media format.
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = parse_extension(Path::new(name))?;
        Some(Self {
            name: name.to_string(),
            extension,
        })
    }
}

pub fn episode_id(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

/// Lower-cased extension of `path` if it is one of [`MEDIA_EXTENSIONS`].
pub fn parse_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    if !MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    Some(ext)
}
