use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FixError;

#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub backup_path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
}

pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write a verbatim copy of `original` next to `path` and confirm it reads
/// back byte for byte.
pub fn write_backup(path: &Path, original: &[u8], suffix: &str) -> Result<BackupOutcome, FixError> {
    let target = backup_path(path, suffix);
    let fail = |reason: String| FixError::Backup {
        path: path.to_path_buf(),
        reason,
    };

    fs::write(&target, original)
        .map_err(|err| fail(format!("write {}: {err}", target.display())))?;
    let written = fs::read(&target)
        .map_err(|err| fail(format!("read back {}: {err}", target.display())))?;

    let expected = sha256_hex(original);
    let actual = sha256_hex(&written);
    if expected != actual {
        return Err(fail(format!(
            "digest mismatch for {} (expected {expected}, got {actual})",
            target.display()
        )));
    }

    Ok(BackupOutcome {
        backup_path: target,
        bytes: original.len(),
        sha256: expected,
    })
}

/// Copy the backup bytes over `path`. Returns the number of bytes restored.
pub fn restore_backup(path: &Path, suffix: &str) -> Result<usize, FixError> {
    let source = backup_path(path, suffix);
    if !source.is_file() {
        return Err(FixError::MissingBackup { path: source });
    }
    let bytes = fs::read(&source).map_err(|err| FixError::Io {
        path: source.clone(),
        source: err,
    })?;
    fs::write(path, &bytes).map_err(|err| FixError::Write {
        path: path.to_path_buf(),
        reason: format!("restore from {}: {err}", source.display()),
    })?;
    Ok(bytes.len())
}
