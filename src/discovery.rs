use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    video::MediaFile,
};

/// Lists the media files directly inside `folder`.
///
/// Files are ordered by code point of their name, case-sensitive, so the
/// episode assignment does not depend on locale or directory order.
pub fn scan(folder: &Path) -> Result<Vec<MediaFile>> {
    if !folder.is_dir() {
        return Err(Error::discovery(folder, "not an existing directory"));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::discovery(folder, e)),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "Skipping file with non UTF-8 name");
            continue;
        };

        match MediaFile::from_name(name) {
            Some(file) => files.push(file),
            None => debug!(name, "Skipping non-media file"),
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    debug!(folder = %folder.display(), count = files.len(), "Scanned folder");
    Ok(files)
}
