use crate::data::Error;
use log::info;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What we need to know about a directory entry to pick record files out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Listing {
    pub path: PathBuf,
    pub is_file: bool,
}

/// A record file selected for accumulation, with its 8-digit stem already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordFile {
    pub path: PathBuf,
    pub name: String,
    pub stem: u32,
}

/// Lists `dir`, following symlinks when telling files from directories.
pub(crate) fn list_directory(dir: &Path) -> Result<Vec<Listing>, Error> {
    let mut listing = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, &e))? {
        let path = entry.map_err(|e| Error::io(dir, &e))?.path();
        listing.push(Listing {
            is_file: path.is_file(),
            path,
        });
    }
    Ok(listing)
}

/// Keeps the regular files whose name matches `pattern`, sorted by stem. Sorting here
/// means the contiguity check doesn't depend on the order the platform lists
/// directories in. Nothing matching is fine, it just means there are no sales.
pub(crate) fn select_record_files(
    listing: impl IntoIterator<Item = Listing>,
    pattern: &Regex,
) -> Vec<RecordFile> {
    let mut files: Vec<RecordFile> = listing
        .into_iter()
        .filter(|entry| entry.is_file)
        .filter_map(|entry| {
            let name = entry.path.file_name()?.to_str()?.to_owned();
            if !pattern.is_match(&name) {
                return None;
            }
            let stem = name.get(..8)?.parse().ok()?;
            Some(RecordFile {
                path: entry.path,
                name,
                stem,
            })
        })
        .collect();
    files.sort_by_key(|file| file.stem);
    info!("selected {} record files", files.len());
    files
}

/// Stems must go up by exactly one from each file to the next. Stops at the first gap.
pub(crate) fn check_sequence(files: &[RecordFile]) -> Result<(), Error> {
    for pair in files.windows(2) {
        let (former, latter) = (&pair[0], &pair[1]);
        if former.stem.checked_add(1) != Some(latter.stem) {
            return Err(Error::NonConsecutiveFiles {
                former: former.name.clone(),
                latter: latter.name.clone(),
            });
        }
    }
    Ok(())
}
