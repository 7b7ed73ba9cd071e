use std::path::PathBuf;

use thiserror::Error;

use crate::fixer::parse::ParseFailure;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },
    #[error("backup of {} failed: {reason}", .path.display())]
    Backup { path: PathBuf, reason: String },
    #[error("{} does not parse: {failure}", .path.display())]
    Parse {
        path: PathBuf,
        failure: ParseFailure,
    },
    #[error("{} cannot be merged: {reason}", .path.display())]
    Structural { path: PathBuf, reason: String },
    #[error("failed to write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
    #[error("written file {} failed verification (restored={restored}): {reason}", .path.display())]
    Verify {
        path: PathBuf,
        restored: bool,
        reason: String,
    },
    #[error("id {id} is outside the valid range {min}..={max}")]
    IdOutOfRange { id: u32, min: u32, max: u32 },
    #[error("no backup found at {}", .path.display())]
    MissingBackup { path: PathBuf },
    #[error("{} is not recoverable as JSON5 either: {reason}", .path.display())]
    Lenient { path: PathBuf, reason: String },
}

impl FixError {
    pub fn code(&self) -> FixErrorCode {
        match self {
            Self::Io { .. } => FixErrorCode::E001Io,
            Self::Encoding { .. } => FixErrorCode::E001Io,
            Self::Backup { .. } => FixErrorCode::E003Backup,
            Self::Parse { .. } => FixErrorCode::E002Parse,
            Self::Lenient { .. } => FixErrorCode::E002Parse,
            Self::Structural { .. } => FixErrorCode::E004Structural,
            Self::Write { .. } => FixErrorCode::E005Write,
            Self::Verify { .. } => FixErrorCode::E006Verify,
            Self::IdOutOfRange { .. } => FixErrorCode::E007IdRange,
            Self::MissingBackup { .. } => FixErrorCode::E003Backup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixErrorCode {
    E001Io,
    E002Parse,
    E003Backup,
    E004Structural,
    E005Write,
    E006Verify,
    E007IdRange,
}

impl FixErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001Io => "E001_IO",
            Self::E002Parse => "E002_PARSE",
            Self::E003Backup => "E003_BACKUP",
            Self::E004Structural => "E004_STRUCTURAL",
            Self::E005Write => "E005_WRITE",
            Self::E006Verify => "E006_VERIFY",
            Self::E007IdRange => "E007_ID_RANGE",
        }
    }
}
