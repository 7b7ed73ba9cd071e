use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, report_batch};
use crate::fixer::batch::{Selection, scrub_selection};
use crate::fixer::scrub::ScrubOutcome;

#[derive(Debug, Clone)]
pub struct ScrubOptions {
    pub selection: Selection,
    pub dry_run: bool,
    pub data_dir: Option<PathBuf>,
}

pub fn run(opts: &ScrubOptions) -> Result<CommandReport> {
    let ctx = load_context(opts.data_dir.as_deref())?;
    let mut report = CommandReport::new("scrub");

    report.detail(format!("data_dir={}", ctx.paths.data_dir.display()));
    if opts.dry_run {
        report.detail("dry_run=true");
    }

    match scrub_selection(&ctx, opts.selection, opts.dry_run) {
        Ok(summary) => report_batch(&mut report, &summary, ScrubOutcome::summary),
        Err(err) => report.issue(format!("[{}] {err}", err.code().as_str())),
    }

    Ok(report)
}
