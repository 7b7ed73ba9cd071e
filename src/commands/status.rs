use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context};
use crate::fixer::backup::backup_path;
use crate::fixer::config::unknown_env_keys;

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub data_dir: Option<PathBuf>,
}

pub fn run(opts: &StatusOptions) -> Result<CommandReport> {
    let ctx = load_context(opts.data_dir.as_deref())?;
    let layout = &ctx.config.layout;
    let mut report = CommandReport::new("status");

    report.detail(format!("haqei_home={}", ctx.paths.haqei_home.display()));
    report.detail(format!("data_dir={}", ctx.paths.data_dir.display()));
    report.detail(format!("audit_log={}", ctx.paths.audit_log().display()));
    report.detail(format!(
        "files={}..{} (ids {}..={})",
        layout.file_name(layout.id_min),
        layout.file_name(layout.id_max),
        layout.id_min,
        layout.id_max
    ));
    report.detail(format!("backup_suffix={}", layout.backup_suffix));
    report.detail(format!("merge_path={}", ctx.config.merge.dotted_path()));
    report.detail(format!("sort_key={}", ctx.config.merge.sort_key));
    report.detail(format!(
        "detect={} marker_key={}",
        ctx.config.detect.strategy, ctx.config.detect.marker_key
    ));

    if !ctx.paths.data_dir.is_dir() {
        report.issue(format!(
            "missing data dir {} (set HAQEI_DATA_DIR or --data-dir)",
            ctx.paths.data_dir.display()
        ));
    } else {
        let mut present = 0usize;
        let mut backups = 0usize;
        for id in layout.id_min..=layout.id_max {
            let file = ctx.paths.target_file(layout, id);
            if file.is_file() {
                present += 1;
            }
            if backup_path(&file, &layout.backup_suffix).is_file() {
                backups += 1;
            }
        }
        report.detail(format!("present_files={present} backups={backups}"));
    }

    for key in unknown_env_keys(env::vars_os().filter_map(|(key, _)| key.into_string().ok())) {
        report.issue(format!("unknown environment variable {key} is set"));
    }

    Ok(report)
}
