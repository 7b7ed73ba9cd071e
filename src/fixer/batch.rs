use std::path::{Path, PathBuf};

use crate::error::FixError;
use crate::fixer::audit;
use crate::fixer::backup::restore_backup;
use crate::fixer::config::{FixerConfig, LayoutConfig};
use crate::fixer::detect::BlockDetector;
use crate::fixer::paths::FixerPaths;
use crate::fixer::repair::{FixOutcome, FixSettings, fix_file};
use crate::fixer::scrub::{ScrubOutcome, scrub_file};
use crate::fixer::warn::{self, WarnEvent};
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Single(u32),
}

#[derive(Debug)]
pub struct FileResult<T> {
    pub id: u32,
    pub path: PathBuf,
    pub result: Result<T, FixError>,
}

#[derive(Debug)]
pub struct BatchSummary<T> {
    pub results: Vec<FileResult<T>>,
    pub success: usize,
    pub errors: usize,
}

#[derive(Debug, Clone)]
pub struct BatchContext {
    pub paths: FixerPaths,
    pub config: FixerConfig,
}

/// Ids to process, ascending. A single id outside the configured range is
/// rejected before any file is touched.
pub fn select_ids(layout: &LayoutConfig, selection: Selection) -> Result<Vec<u32>, FixError> {
    match selection {
        Selection::All => Ok((layout.id_min..=layout.id_max).collect()),
        Selection::Single(id) if layout.contains(id) => Ok(vec![id]),
        Selection::Single(id) => Err(FixError::IdOutOfRange {
            id,
            min: layout.id_min,
            max: layout.id_max,
        }),
    }
}

fn run_each<T>(
    ctx: &BatchContext,
    selection: Selection,
    phase: &str,
    mut op: impl FnMut(&Path) -> Result<T, FixError>,
    describe: impl Fn(&T) -> String,
) -> Result<BatchSummary<T>, FixError> {
    let ids = select_ids(&ctx.config.layout, selection)?;
    let mut summary = BatchSummary {
        results: Vec::with_capacity(ids.len()),
        success: 0,
        errors: 0,
    };

    for id in ids {
        let path = ctx.paths.target_file(&ctx.config.layout, id);
        let result = op(&path);
        match &result {
            Ok(outcome) => {
                summary.success += 1;
                let message = describe(outcome);
                logging::debug(format!("{}: {message}", path.display()));
                audit::record(&ctx.paths.logs_dir, phase, "ok", &path, &message);
            }
            Err(err) => {
                summary.errors += 1;
                let code = err.code().as_str();
                warn::emit(WarnEvent {
                    code,
                    stage: phase,
                    action: "process-file",
                    file: &path.display().to_string(),
                    reason: "file-left-in-original-state",
                    err: &err.to_string(),
                });
                audit::record(
                    &ctx.paths.logs_dir,
                    phase,
                    "error",
                    &path,
                    &format!("{code}: {err}"),
                );
            }
        }
        summary.results.push(FileResult { id, path, result });
    }

    Ok(summary)
}

pub fn fix_selection(
    ctx: &BatchContext,
    selection: Selection,
    dry_run: bool,
    detector: &dyn BlockDetector,
) -> Result<BatchSummary<FixOutcome>, FixError> {
    let settings = FixSettings {
        merge: ctx.config.merge.clone(),
        backup_suffix: ctx.config.layout.backup_suffix.clone(),
        dry_run,
    };
    run_each(
        ctx,
        selection,
        "fix",
        |path| fix_file(path, &settings, detector),
        FixOutcome::summary,
    )
}

pub fn scrub_selection(
    ctx: &BatchContext,
    selection: Selection,
    dry_run: bool,
) -> Result<BatchSummary<ScrubOutcome>, FixError> {
    let suffix = ctx.config.layout.backup_suffix.clone();
    run_each(
        ctx,
        selection,
        "scrub",
        |path| scrub_file(path, &suffix, dry_run),
        ScrubOutcome::summary,
    )
}

pub fn restore_id(ctx: &BatchContext, id: u32) -> Result<BatchSummary<usize>, FixError> {
    let suffix = ctx.config.layout.backup_suffix.clone();
    run_each(
        ctx,
        Selection::Single(id),
        "restore",
        |path| restore_backup(path, &suffix),
        |bytes: &usize| format!("restored {bytes} bytes from backup"),
    )
}
