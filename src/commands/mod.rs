pub mod fix;
pub mod restore;
pub mod scrub;
pub mod status;

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::error::FixError;
use crate::fixer::batch::{BatchContext, BatchSummary};
use crate::fixer::config::load_config;
use crate::fixer::paths::resolve_paths;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

pub fn load_context(data_dir: Option<&Path>) -> Result<BatchContext> {
    let config = load_config()?;
    let paths = resolve_paths(data_dir)?;
    Ok(BatchContext { paths, config })
}

fn describe_error(err: &FixError) -> String {
    match err {
        FixError::Parse { failure, .. } if !failure.context.is_empty() => {
            format!("{err}\n{}", failure.render_context())
        }
        _ => err.to_string(),
    }
}

/// Fold per-file results into the report, one line per file plus a summary.
pub fn report_batch<T>(
    report: &mut CommandReport,
    summary: &BatchSummary<T>,
    describe: impl Fn(&T) -> String,
) {
    for item in &summary.results {
        match &item.result {
            Ok(outcome) => report.detail(format!(
                "#{} {}: {}",
                item.id,
                item.path.display(),
                describe(outcome)
            )),
            Err(err) => report.issue(format!(
                "#{} [{}] {}",
                item.id,
                err.code().as_str(),
                describe_error(err)
            )),
        }
    }
    report.detail(format!(
        "summary: success={} errors={}",
        summary.success, summary.errors
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixer::batch::FileResult;
    use std::path::PathBuf;

    #[test]
    fn report_batch_marks_failures_as_issues() {
        let summary = BatchSummary {
            results: vec![
                FileResult {
                    id: 1,
                    path: PathBuf::from("/d/hexagram_01.json"),
                    result: Ok(4usize),
                },
                FileResult {
                    id: 2,
                    path: PathBuf::from("/d/hexagram_02.json"),
                    result: Err(FixError::MissingBackup {
                        path: PathBuf::from("/d/hexagram_02.json.backup"),
                    }),
                },
            ],
            success: 1,
            errors: 1,
        };
        let mut report = CommandReport::new("restore");
        report_batch(&mut report, &summary, |n| format!("{n} bytes"));
        assert!(!report.ok);
        assert_eq!(report.details[0], "#1 /d/hexagram_01.json: 4 bytes");
        assert_eq!(report.details[1], "summary: success=1 errors=1");
        assert!(report.issues[0].starts_with("#2 [E003_BACKUP]"));
    }
}
