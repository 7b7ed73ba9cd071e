use serde_json::Value;
use std::path::Path;

use crate::error::FixError;
use crate::fixer::backup::write_backup;
use crate::fixer::repair::{read_document, render_pretty, verify_or_restore, write_atomically};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubOutcome {
    Clean,
    Scrubbed {
        removed_chars: usize,
        /// Strict parsing still failed after cleanup and JSON5 rescued it.
        lenient: bool,
        written: bool,
    },
}

impl ScrubOutcome {
    pub fn summary(&self) -> String {
        match self {
            Self::Clean => "clean".to_string(),
            Self::Scrubbed {
                removed_chars,
                lenient,
                written,
            } => {
                let prefix = if *written { "scrubbed" } else { "dry-run: would scrub" };
                let via = if *lenient { " (re-serialized from JSON5)" } else { "" };
                format!("{prefix} {removed_chars} stray chars{via}")
            }
        }
    }
}

fn is_stray(ch: char) -> bool {
    match ch {
        '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' => true,
        '\t' | '\n' | '\r' => false,
        c => (c as u32) < 0x20,
    }
}

/// Drop BOMs, zero-width characters and C0 controls other than whitespace.
pub fn strip_stray_chars(text: &str) -> (String, usize) {
    let mut removed = 0usize;
    let cleaned = text
        .chars()
        .filter(|&ch| {
            let stray = is_stray(ch);
            if stray {
                removed += 1;
            }
            !stray
        })
        .collect();
    (cleaned, removed)
}

pub fn scrub_file(path: &Path, backup_suffix: &str, dry_run: bool) -> Result<ScrubOutcome, FixError> {
    let (original, text) = read_document(path)?;
    let (cleaned, removed_chars) = strip_stray_chars(&text);

    let (replacement, lenient) = match serde_json::from_str::<Value>(&cleaned) {
        Ok(_) if removed_chars == 0 => return Ok(ScrubOutcome::Clean),
        Ok(_) => (cleaned, false),
        Err(strict_err) => {
            let value = json5::from_str::<Value>(&cleaned).map_err(|err| FixError::Lenient {
                path: path.to_path_buf(),
                reason: format!("strict: {strict_err}; json5: {err}"),
            })?;
            let rendered = render_pretty(&value).map_err(|err| FixError::Write {
                path: path.to_path_buf(),
                reason: format!("serialize scrubbed record: {err}"),
            })?;
            (rendered, true)
        }
    };

    if dry_run {
        return Ok(ScrubOutcome::Scrubbed {
            removed_chars,
            lenient,
            written: false,
        });
    }

    write_backup(path, &original, backup_suffix)?;
    write_atomically(path, &replacement)?;
    verify_or_restore(path, backup_suffix, &original)?;

    Ok(ScrubOutcome::Scrubbed {
        removed_chars,
        lenient,
        written: true,
    })
}
