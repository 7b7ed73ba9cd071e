use serde_json::Value;
use thiserror::Error;

use crate::fixer::config::MergeConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("no records to merge")]
    NoRecords,
    #[error("first record has no `{path}` array")]
    MissingPath { path: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Entries contributed by each record, in record order.
    pub contributed: Vec<usize>,
    pub total: usize,
}

fn json_pointer(path: &[String]) -> String {
    path.iter()
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Integer-like id used for ordering; anything unusable sorts as 0.
pub fn sort_id(entry: &Value, sort_key: &str) -> i64 {
    match entry.get(sort_key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|v| v.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Length of the merge-path array in `record`, when it has one.
pub fn entry_count(record: &Value, cfg: &MergeConfig) -> Option<usize> {
    record
        .pointer(&json_pointer(&cfg.path))
        .and_then(Value::as_array)
        .map(Vec::len)
}

pub fn merge_records(records: &[Value], cfg: &MergeConfig) -> Result<(Value, MergeStats), MergeError> {
    let pointer = json_pointer(&cfg.path);
    let Some(first) = records.first() else {
        return Err(MergeError::NoRecords);
    };

    let mut base = first.clone();
    let Some(combined) = base.pointer_mut(&pointer).and_then(Value::as_array_mut) else {
        return Err(MergeError::MissingPath {
            path: cfg.dotted_path(),
        });
    };

    let mut stats = MergeStats {
        contributed: vec![combined.len()],
        total: 0,
    };
    for record in &records[1..] {
        match record.pointer(&pointer).and_then(Value::as_array) {
            Some(entries) => {
                combined.extend(entries.iter().cloned());
                stats.contributed.push(entries.len());
            }
            None => stats.contributed.push(0),
        }
    }

    combined.sort_by_key(|entry| sort_id(entry, &cfg.sort_key));
    stats.total = combined.len();
    Ok((base, stats))
}
