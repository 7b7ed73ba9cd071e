use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use crate::fixer::config::LayoutConfig;

#[derive(Debug, Clone)]
pub struct FixerPaths {
    pub haqei_home: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl FixerPaths {
    pub fn target_file(&self, layout: &LayoutConfig, id: u32) -> PathBuf {
        self.data_dir.join(layout.file_name(id))
    }

    pub fn audit_log(&self) -> PathBuf {
        self.logs_dir.join("audit.log")
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

/// Resolve directories: `--data-dir` > `HAQEI_DATA_DIR` > `./data/hexagrams`.
pub fn resolve_paths(data_dir_override: Option<&Path>) -> Result<FixerPaths> {
    let home = required_home_dir()?;
    let haqei_home = env_or_default_path("HAQEI_HOME", home.join(".haqei"));

    let data_dir = match data_dir_override {
        Some(dir) => dir.to_path_buf(),
        None => env_or_default_path("HAQEI_DATA_DIR", PathBuf::from("data/hexagrams")),
    };
    let logs_dir = env_or_default_path("HAQEI_LOGS_DIR", haqei_home.join("logs"));

    Ok(FixerPaths {
        haqei_home,
        data_dir,
        logs_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_file_uses_padded_name() {
        let paths = FixerPaths {
            haqei_home: PathBuf::from("/h"),
            data_dir: PathBuf::from("/data"),
            logs_dir: PathBuf::from("/h/logs"),
        };
        let layout = LayoutConfig::default();
        assert_eq!(
            paths.target_file(&layout, 3),
            PathBuf::from("/data/hexagram_03.json")
        );
        assert_eq!(
            paths.target_file(&layout, 64),
            PathBuf::from("/data/hexagram_64.json")
        );
        assert_eq!(paths.audit_log(), PathBuf::from("/h/logs/audit.log"));
    }
}
