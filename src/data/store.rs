//! Reading and writing data files.
//!
//! Writes go through a temporary file in the target directory that is then
//! renamed over the destination, so a crash never leaves a half-written log.

use super::schema::{
    attempts_to_csv, catalog_to_csv, parse_attempts, parse_catalog, ImportError,
};
use crate::models::{AttemptRecord, Catalog};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Loads and validates an attempt log.
pub fn load_attempts(path: &Path) -> Result<Vec<AttemptRecord>, ImportError> {
    let content = read(path)?;
    let records = parse_attempts(&content)?;
    debug!("Loaded {} attempts from {}", records.len(), path.display());
    Ok(records)
}

/// Loads an attempt log, treating a missing file as an empty log.
pub fn load_attempts_or_empty(path: &Path) -> Result<Vec<AttemptRecord>, ImportError> {
    if path.exists() {
        load_attempts(path)
    } else {
        info!("No log at {}; starting empty", path.display());
        Ok(Vec::new())
    }
}

/// Loads and validates a catalog, replacing any previous one wholesale.
pub fn load_catalog(path: &Path) -> Result<Catalog, ImportError> {
    let content = read(path)?;
    let catalog = parse_catalog(&content)?;
    debug!("Loaded {} questions from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Appends one attempt to the log at `path`, creating it if needed.
///
/// Returns the number of records now in the log.
pub fn append_attempt(path: &Path, record: AttemptRecord) -> Result<usize, ImportError> {
    let mut records = load_attempts_or_empty(path)?;
    records.push(record);
    write_attempts(path, &records)?;
    Ok(records.len())
}

/// Writes the attempt log to `path`.
pub fn write_attempts(path: &Path, records: &[AttemptRecord]) -> Result<(), ImportError> {
    write_atomic(path, &attempts_to_csv(records)?)
}

/// Writes a catalog to `path`.
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<(), ImportError> {
    write_atomic(path, &catalog_to_csv(catalog)?)
}

/// Path of a user's log inside the data directory.
pub fn user_log_path(data_dir: &Path, user: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", user))
}

/// Names of users with a log in `data_dir`, sorted.
///
/// A missing directory yields an empty list.
pub fn list_users(data_dir: &Path) -> Result<Vec<String>, ImportError> {
    if !data_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut users = Vec::new();
    for entry in WalkDir::new(data_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ImportError::Io {
            path: data_dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            users.push(stem.to_string());
        }
    }

    users.sort();
    Ok(users)
}

fn read(path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, content: &str) -> Result<(), ImportError> {
    let io_err = |source: std::io::Error| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
