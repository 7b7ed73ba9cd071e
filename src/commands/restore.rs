use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, report_batch};
use crate::fixer::batch::restore_id;

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub id: u32,
    pub data_dir: Option<PathBuf>,
}

pub fn run(opts: &RestoreOptions) -> Result<CommandReport> {
    let ctx = load_context(opts.data_dir.as_deref())?;
    let mut report = CommandReport::new("restore");
    report.detail(format!("data_dir={}", ctx.paths.data_dir.display()));

    match restore_id(&ctx, opts.id) {
        Ok(summary) => report_batch(&mut report, &summary, |bytes| {
            format!("restored {bytes} bytes from backup")
        }),
        Err(err) => report.issue(format!("[{}] {err}", err.code().as_str())),
    }

    Ok(report)
}
