//! The fix-file state machine: read, back up, detect, parse every block,
//! merge, write, verify. Any failure before the write leaves the target
//! untouched; a failed verification restores the backup.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::FixError;
use crate::fixer::backup::{restore_backup, write_backup};
use crate::fixer::config::MergeConfig;
use crate::fixer::detect::BlockDetector;
use crate::fixer::merge::{MergeError, entry_count, merge_records};
use crate::fixer::parse::parse_block;
use crate::logging;

#[derive(Debug, Clone)]
pub struct FixSettings {
    pub merge: MergeConfig,
    pub backup_suffix: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    AlreadyValid {
        entries: Option<usize>,
    },
    Merged {
        blocks: usize,
        entries: usize,
        contributed: Vec<usize>,
        stray_lines: usize,
        written: bool,
    },
}

impl FixOutcome {
    pub fn summary(&self) -> String {
        match self {
            Self::AlreadyValid { entries: Some(n) } => format!("already valid ({n} entries)"),
            Self::AlreadyValid { entries: None } => "already valid".to_string(),
            Self::Merged {
                blocks,
                entries,
                contributed,
                stray_lines,
                written,
            } => {
                let verb = if *written { "merged" } else { "dry-run: would merge" };
                let per_block = contributed
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join("+");
                let mut out =
                    format!("{verb} {blocks} blocks into {entries} entries (per block: {per_block})");
                if *stray_lines > 0 {
                    out.push_str(&format!(", ignored {stray_lines} stray lines"));
                }
                out
            }
        }
    }
}

pub fn render_pretty(value: &Value) -> Result<String, serde_json::Error> {
    let body = serde_json::to_string_pretty(value)?;
    Ok(format!("{body}\n"))
}

/// Replace `path` through a sibling temp file so a crash mid-write never
/// leaves a half-written target.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), FixError> {
    let fail = |reason: String| FixError::Write {
        path: path.to_path_buf(),
        reason,
    };
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|err| fail(format!("create temp file in {}: {err}", parent.display())))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|err| fail(format!("write temp file: {err}")))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| fail(format!("sync temp file: {err}")))?;
    tmp.persist(path)
        .map_err(|err| fail(format!("rename over target: {}", err.error)))?;
    Ok(())
}

/// Re-read `path` and make sure it parses; otherwise put the original bytes
/// back (from the backup file, or from memory if the backup is unusable).
pub fn verify_or_restore(path: &Path, backup_suffix: &str, original: &[u8]) -> Result<(), FixError> {
    let reason = match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(_) => return Ok(()),
            Err(err) => format!("re-parse failed: {err}"),
        },
        Err(err) => format!("re-read failed: {err}"),
    };

    let restored = match restore_backup(path, backup_suffix) {
        Ok(_) => true,
        Err(_) => fs::write(path, original).is_ok(),
    };
    Err(FixError::Verify {
        path: path.to_path_buf(),
        restored,
        reason,
    })
}

pub fn read_document(path: &Path) -> Result<(Vec<u8>, String), FixError> {
    let bytes = fs::read(path).map_err(|err| FixError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    let text = String::from_utf8(bytes.clone()).map_err(|_| FixError::Encoding {
        path: path.to_path_buf(),
    })?;
    Ok((bytes, text))
}

pub fn fix_file(
    path: &Path,
    settings: &FixSettings,
    detector: &dyn BlockDetector,
) -> Result<FixOutcome, FixError> {
    let (original, text) = read_document(path)?;

    if !settings.dry_run {
        let backup = write_backup(path, &original, &settings.backup_suffix)?;
        logging::debug(format!(
            "backup {} bytes={} sha256={}",
            backup.backup_path.display(),
            backup.bytes,
            backup.sha256
        ));
    }

    let detection = detector.detect(&text);
    logging::debug(format!(
        "{}: strategy={} starts={} blocks={} stray_lines={}",
        path.display(),
        detection.strategy,
        detection.starts_found,
        detection.blocks.len(),
        detection.stray_lines
    ));

    if !detection.is_multi() {
        let record = parse_block(&detection.blocks[0], 0).map_err(|failure| FixError::Parse {
            path: path.to_path_buf(),
            failure,
        })?;
        return Ok(FixOutcome::AlreadyValid {
            entries: entry_count(&record, &settings.merge),
        });
    }

    let mut records = Vec::with_capacity(detection.blocks.len());
    for (index, block) in detection.blocks.iter().enumerate() {
        let record = parse_block(block, index).map_err(|failure| FixError::Parse {
            path: path.to_path_buf(),
            failure,
        })?;
        records.push(record);
    }

    let (merged, stats) = merge_records(&records, &settings.merge).map_err(|err| {
        let reason = match &err {
            MergeError::NoRecords => err.to_string(),
            MergeError::MissingPath { .. } => format!("{err}; not auto-repairable"),
        };
        FixError::Structural {
            path: path.to_path_buf(),
            reason,
        }
    })?;
    for (index, count) in stats.contributed.iter().enumerate() {
        logging::debug(format!("block {} contributed {count} entries", index + 1));
    }

    let outcome = FixOutcome::Merged {
        blocks: records.len(),
        entries: stats.total,
        contributed: stats.contributed,
        stray_lines: detection.stray_lines,
        written: !settings.dry_run,
    };
    if settings.dry_run {
        return Ok(outcome);
    }

    let rendered = render_pretty(&merged).map_err(|err| FixError::Write {
        path: path.to_path_buf(),
        reason: format!("serialize merged record: {err}"),
    })?;
    write_atomically(path, &rendered)?;
    verify_or_restore(path, &settings.backup_suffix, &original)?;

    Ok(outcome)
}
