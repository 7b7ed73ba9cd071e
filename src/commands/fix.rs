use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, report_batch};
use crate::fixer::batch::{Selection, fix_selection};
use crate::fixer::config::DetectStrategy;
use crate::fixer::repair::FixOutcome;

#[derive(Debug, Clone)]
pub struct FixOptions {
    pub selection: Selection,
    pub dry_run: bool,
    pub strategy: Option<DetectStrategy>,
    pub data_dir: Option<PathBuf>,
}

pub fn run(opts: &FixOptions) -> Result<CommandReport> {
    let mut ctx = load_context(opts.data_dir.as_deref())?;
    if let Some(strategy) = opts.strategy {
        ctx.config.detect.strategy = strategy;
    }
    let mut report = CommandReport::new("fix");

    report.detail(format!("data_dir={}", ctx.paths.data_dir.display()));
    report.detail(format!("strategy={}", ctx.config.detect.strategy));
    if opts.dry_run {
        report.detail("dry_run=true");
    }

    let detector = ctx.config.detect.detector();
    match fix_selection(&ctx, opts.selection, opts.dry_run, detector.as_ref()) {
        Ok(summary) => report_batch(&mut report, &summary, FixOutcome::summary),
        Err(err) => report.issue(format!("[{}] {err}", err.code().as_str())),
    }

    Ok(report)
}
