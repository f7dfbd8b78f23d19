use crate::error::{Result, SelfieError};
use chrono::{DateTime, Local};
use log::{info, warn};
use opencv::core::Vector;
use opencv::imgcodecs;
use opencv::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PREFIX: &str = "selfie_";
const EXTENSION: &str = ".png";

/// `selfie_YYYYMMDD-HHMMSS.png`, the name other tools use to discover
/// captures.
pub fn selfie_file_name(timestamp: DateTime<Local>) -> String {
    format!("{}{}{}", PREFIX, timestamp.format("%Y%m%d-%H%M%S"), EXTENSION)
}

pub fn is_selfie_file_name(name: &str) -> bool {
    name.starts_with(PREFIX) && name.ends_with(EXTENSION)
}

/// Timestamp part of a selfie file name, e.g. `20240115-143022`.
pub fn caption(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stamp = name.strip_prefix(PREFIX)?.strip_suffix(EXTENSION)?;
    Some(stamp.to_owned())
}

pub fn ensure_dir(directory: &Path) -> Result<()> {
    fs::create_dir_all(directory)?;
    Ok(())
}

/// Saves `frame` under a name derived from the current local time.
pub fn save(frame: &Mat, directory: &Path) -> Result<PathBuf> {
    save_at(frame, directory, Local::now())
}

/// Saves `frame` under a name derived from `timestamp`. A file with the
/// same name is overwritten.
pub fn save_at(frame: &Mat, directory: &Path, timestamp: DateTime<Local>) -> Result<PathBuf> {
    let path = directory.join(selfie_file_name(timestamp));
    let written = imgcodecs::imwrite(&path.to_string_lossy(), frame, &Vector::<i32>::new())
        .map_err(|err| {
            warn!("Error saving selfie: {}", err);
            SelfieError::Write(path.clone())
        })?;
    if !written {
        return Err(SelfieError::Write(path));
    }
    info!("Selfie saved as {}", path.display());
    Ok(path)
}

/// Number of selfie files in `directory`, 0 when it does not exist.
pub fn count(directory: &Path) -> usize {
    selfie_names(directory).len()
}

/// Selfie files in `directory`, newest first.
pub fn list(directory: &Path) -> Vec<PathBuf> {
    let mut names = selfie_names(directory);
    names.sort_unstable_by(|a, b| b.cmp(a));
    names.into_iter().map(|name| directory.join(name)).collect()
}

/// Count over the selfie directory plus the deprecated location older
/// versions wrote to. Only reads the legacy directory.
pub fn count_with_legacy(directory: &Path, legacy: &Path) -> usize {
    if same_dir(directory, legacy) {
        return count(directory);
    }
    count(directory) + count(legacy)
}

/// Listing over both locations, newest first by file name.
pub fn list_with_legacy(directory: &Path, legacy: &Path) -> Vec<PathBuf> {
    let mut paths = list(directory);
    if !same_dir(directory, legacy) {
        paths.extend(list(legacy));
    }
    paths.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    paths
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn selfie_names(directory: &Path) -> Vec<String> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!("Unable to list {}: {}", directory.display(), err);
            return Vec::new();
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|kind| kind.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_selfie_file_name(name))
        .collect()
}
