use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::fixer::warn::{self, WarnEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at: String,
    pub phase: String,
    pub status: String,
    pub file: String,
    pub message: String,
}

pub fn append_event(
    logs_dir: &Path,
    phase: &str,
    status: &str,
    file: &Path,
    message: &str,
) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let event = AuditEvent {
        at: chrono::Utc::now().to_rfc3339(),
        phase: phase.to_string(),
        status: status.to_string(),
        file: file.display().to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = logs_dir.join("audit.log");
    let mut handle = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    handle.write_all(line.as_bytes())?;
    Ok(())
}

/// Audit failures never change an outcome; they only surface as a warning.
pub fn record(logs_dir: &Path, phase: &str, status: &str, file: &Path, message: &str) {
    if let Err(err) = append_event(logs_dir, phase, status, file, message) {
        warn::emit(WarnEvent {
            code: "AUDIT_WRITE_FAILED",
            stage: phase,
            action: "append-audit-event",
            file: &file.display().to_string(),
            reason: "audit-log-unwritable",
            err: &format!("{err:#}"),
        });
    }
}
