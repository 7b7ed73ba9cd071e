use std::env;
use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Verbosity {
    Quiet = 0,
    Normal = 1,
    Verbose = 2,
}

static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

fn parse_level(raw: &str) -> Option<Verbosity> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "quiet" | "silent" | "0" => Some(Verbosity::Quiet),
        "normal" | "info" | "1" => Some(Verbosity::Normal),
        "verbose" | "debug" | "2" => Some(Verbosity::Verbose),
        _ => None,
    }
}

/// Flags win over `HAQEI_LOG`; `--quiet` wins over `--verbose`.
pub fn resolve(verbose: bool, quiet: bool, env_value: Option<&str>) -> Verbosity {
    if quiet {
        return Verbosity::Quiet;
    }
    if verbose {
        return Verbosity::Verbose;
    }
    env_value.and_then(parse_level).unwrap_or(Verbosity::Normal)
}

pub fn init(verbose: bool, quiet: bool) {
    let from_env = env::var("HAQEI_LOG").ok();
    let level = resolve(verbose, quiet, from_env.as_deref());
    LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn enabled(level: Verbosity) -> bool {
    LEVEL.load(Ordering::Relaxed) >= level as u8
}

pub fn info(message: impl Display) {
    if enabled(Verbosity::Normal) {
        eprintln!("haqei-fix: {message}");
    }
}

pub fn debug(message: impl Display) {
    if enabled(Verbosity::Verbose) {
        eprintln!("haqei-fix[debug]: {message}");
    }
}
