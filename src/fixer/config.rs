use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::fixer::detect::{BlockDetector, BraceDepthDetector, MarkerLineDetector};

include!(concat!(env!("OUT_DIR"), "/haqei_env_allowlist.rs"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectStrategy {
    #[default]
    Marker,
    Depth,
}

impl DetectStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Depth => "depth",
        }
    }
}

impl fmt::Display for DetectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" | "marker-line" | "heuristic" => Ok(Self::Marker),
            "depth" | "brace-depth" | "tokenizer" => Ok(Self::Depth),
            other => Err(anyhow!(
                "invalid detect strategy `{other}`; use `marker` or `depth`"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub file_prefix: String,
    pub id_width: usize,
    pub id_min: u32,
    pub id_max: u32,
    pub backup_suffix: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            file_prefix: "hexagram_".to_string(),
            id_width: 2,
            id_min: 1,
            id_max: 64,
            backup_suffix: ".backup".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn file_name(&self, id: u32) -> String {
        format!("{}{:0width$}.json", self.file_prefix, id, width = self.id_width)
    }

    pub fn contains(&self, id: u32) -> bool {
        (self.id_min..=self.id_max).contains(&id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    pub path: Vec<String>,
    pub sort_key: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            path: vec![
                "internal_team_analysis".to_string(),
                "interface_combinations".to_string(),
            ],
            sort_key: "interface_id".to_string(),
        }
    }
}

impl MergeConfig {
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    pub strategy: DetectStrategy,
    pub marker_key: String,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            strategy: DetectStrategy::Marker,
            marker_key: "hexagram_id".to_string(),
        }
    }
}

impl DetectConfig {
    pub fn detector(&self) -> Box<dyn BlockDetector> {
        match self.strategy {
            DetectStrategy::Marker => Box::new(MarkerLineDetector::new(&self.marker_key)),
            DetectStrategy::Depth => Box::new(BraceDepthDetector),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FixerConfig {
    pub layout: LayoutConfig,
    pub merge: MergeConfig,
    pub detect: DetectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFixerConfig {
    layout: Option<LayoutConfig>,
    merge: Option<MergeConfig>,
    detect: Option<DetectConfig>,
}

fn env_or_u32(lookup: &dyn Fn(&str) -> Option<String>, var: &str, fallback: u32) -> u32 {
    match lookup(var) {
        Some(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        None => fallback,
    }
}

fn env_or_usize(lookup: &dyn Fn(&str) -> Option<String>, var: &str, fallback: usize) -> usize {
    match lookup(var) {
        Some(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        None => fallback,
    }
}

fn env_or_string(lookup: &dyn Fn(&str) -> Option<String>, var: &str, fallback: &str) -> String {
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_dotted(
    lookup: &dyn Fn(&str) -> Option<String>,
    var: &str,
    fallback: &[String],
) -> Vec<String> {
    match lookup(var) {
        Some(v) => {
            let out = v
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        None => fallback.to_vec(),
    }
}

pub fn validate(cfg: &FixerConfig) -> Result<()> {
    let layout = &cfg.layout;
    if layout.id_min == 0 {
        return Err(anyhow!("invalid id range: id_min must be >= 1"));
    }
    if layout.id_min > layout.id_max {
        return Err(anyhow!(
            "invalid id range: require id_min <= id_max (got {}..={})",
            layout.id_min,
            layout.id_max
        ));
    }
    if layout.id_width == 0 {
        return Err(anyhow!("invalid id width: must be >= 1"));
    }
    if layout.file_prefix.trim().is_empty() {
        return Err(anyhow!("invalid file prefix: cannot be empty"));
    }
    if layout.file_prefix.contains(['/', '\\']) {
        return Err(anyhow!("invalid file prefix: cannot contain a path separator"));
    }
    if layout.backup_suffix.trim().is_empty() {
        return Err(anyhow!("invalid backup suffix: cannot be empty"));
    }
    if cfg.merge.path.is_empty() || cfg.merge.path.iter().any(|s| s.trim().is_empty()) {
        return Err(anyhow!("invalid merge path: segments cannot be empty"));
    }
    if cfg.merge.sort_key.trim().is_empty() {
        return Err(anyhow!("invalid sort key: cannot be empty"));
    }
    if cfg.detect.marker_key.trim().is_empty() {
        return Err(anyhow!("invalid marker key: cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(custom) = lookup("HAQEI_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".haqei").join("fixer.toml"))
}

fn merge_file_config(base: &mut FixerConfig, raw: &str, origin: &str) -> Result<()> {
    let parsed: PartialFixerConfig = toml::from_str(raw)
        .map_err(|err| anyhow!("failed to parse fixer config {origin}: {err}"))?;
    if let Some(layout) = parsed.layout {
        base.layout = layout;
    }
    if let Some(merge) = parsed.merge {
        base.merge = merge;
    }
    if let Some(detect) = parsed.detect {
        base.detect = detect;
    }
    Ok(())
}

fn apply_env(cfg: &mut FixerConfig, lookup: &dyn Fn(&str) -> Option<String>) -> Result<()> {
    cfg.layout.file_prefix = env_or_string(lookup, "HAQEI_FILE_PREFIX", &cfg.layout.file_prefix);
    cfg.layout.id_width = env_or_usize(lookup, "HAQEI_ID_WIDTH", cfg.layout.id_width);
    cfg.layout.id_min = env_or_u32(lookup, "HAQEI_ID_MIN", cfg.layout.id_min);
    cfg.layout.id_max = env_or_u32(lookup, "HAQEI_ID_MAX", cfg.layout.id_max);
    cfg.layout.backup_suffix =
        env_or_string(lookup, "HAQEI_BACKUP_SUFFIX", &cfg.layout.backup_suffix);
    cfg.merge.path = env_or_dotted(lookup, "HAQEI_MERGE_PATH", &cfg.merge.path);
    cfg.merge.sort_key = env_or_string(lookup, "HAQEI_SORT_KEY", &cfg.merge.sort_key);
    cfg.detect.marker_key = env_or_string(lookup, "HAQEI_MARKER_KEY", &cfg.detect.marker_key);
    if let Some(raw) = lookup("HAQEI_DETECT_STRATEGY")
        && !raw.trim().is_empty()
    {
        cfg.detect.strategy = raw.parse()?;
    }
    Ok(())
}

pub fn load_config_with(lookup: &dyn Fn(&str) -> Option<String>) -> Result<FixerConfig> {
    let mut cfg = FixerConfig::default();
    if let Some(path) = resolve_config_path(lookup)
        && path.exists()
    {
        let raw = fs::read_to_string(&path)
            .map_err(|err| anyhow!("failed to read fixer config {}: {err}", path.display()))?;
        merge_file_config(&mut cfg, &raw, &path.display().to_string())?;
    }
    apply_env(&mut cfg, lookup)?;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn load_config() -> Result<FixerConfig> {
    load_config_with(&|var: &str| env::var(var).ok())
}

/// `HAQEI_*` variables present in `vars` that nothing in this binary reads.
pub fn unknown_env_keys<I>(vars: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = vars
        .into_iter()
        .filter(|key| key.starts_with("HAQEI_"))
        .filter(|key| !GENERATED_HAQEI_ENV_ALLOWLIST.contains(&key.as_str()))
        .collect::<Vec<_>>();
    out.sort();
    out.dedup();
    out
}
