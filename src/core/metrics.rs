//! Per-turn usage accounting and the JSON metrics log.
//!
//! The log is a single JSON array rewritten in full on every append. A
//! missing or unreadable file reads as an empty log and is recreated on the
//! next write. Single-process usage only; there is no locking.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::api::Usage;
use crate::core::constants::{COMPLETION_COST_PER_MILLION, PROMPT_COST_PER_MILLION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub timestamp: String,
    pub query: String,
    pub latency_ms: f64,
    pub total_tokens: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cost: f64,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_blocked: Option<bool>,
}

impl MetricRecord {
    /// Build a record for one completed turn. `query` is the text that was
    /// actually sent, so PII redaction has already happened by the time it
    /// lands here.
    pub fn new(query: &str, usage: &Usage, latency_ms: f64, model: &str) -> Self {
        let cost = calculate_cost(usage.prompt_tokens, usage.completion_tokens);
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            query: query.to_string(),
            latency_ms: round_to(latency_ms, 2),
            total_tokens: usage.total_tokens,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost: round_to(cost, 6),
            model: model.to_string(),
            moderation_blocked: None,
        }
    }

    /// Mark that the answer was withheld by output moderation. The turn is
    /// still logged; the completion call already happened.
    pub fn mark_output_blocked(&mut self) {
        self.moderation_blocked = Some(true);
    }
}

/// `prompt/1e6 * 0.15 + completion/1e6 * 0.60`, in USD.
pub fn calculate_cost(prompt_tokens: u32, completion_tokens: u32) -> f64 {
    (prompt_tokens as f64 / 1_000_000.0) * PROMPT_COST_PER_MILLION
        + (completion_tokens as f64 / 1_000_000.0) * COMPLETION_COST_PER_MILLION
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All recorded entries. A missing or undecodable file reads as empty.
    pub fn read_all(&self) -> Vec<MetricRecord> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Append one record: read the existing array, push, rewrite the whole
    /// file pretty-printed. The rewrite goes through a same-directory temp
    /// file and an atomic rename, so a crash never leaves a torn file.
    pub fn append(&self, record: MetricRecord) -> Result<(), Box<dyn std::error::Error>> {
        let mut records = self.read_all();
        records.push(record);

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => {
                fs::create_dir_all(p)?;
                p
            }
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut temp_file, &records)?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path)?;

        tracing::debug!(entries = records.len(), path = %self.path.display(), "metrics written");
        Ok(())
    }
}

/// Aggregates for the `stats` subcommand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSummary {
    pub turns: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub mean_latency_ms: f64,
    pub blocked_outputs: usize,
}

pub fn summarize(records: &[MetricRecord]) -> MetricsSummary {
    let turns = records.len();
    let total_tokens = records.iter().map(|r| u64::from(r.total_tokens)).sum();
    let total_cost = records.iter().map(|r| r.cost).sum();
    let total_latency: f64 = records.iter().map(|r| r.latency_ms).sum();
    let mean_latency_ms = if turns == 0 {
        0.0
    } else {
        total_latency / turns as f64
    };
    let blocked_outputs = records
        .iter()
        .filter(|r| r.moderation_blocked == Some(true))
        .count();

    MetricsSummary {
        turns,
        total_tokens,
        total_cost,
        mean_latency_ms,
        blocked_outputs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_usage(prompt: u32, completion: u32) -> Usage {
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        assert_eq!(calculate_cost(0, 0), 0.0);
    }

    #[test]
    fn cost_matches_published_rates() {
        // 1M prompt tokens at $0.15 plus 500K completion tokens at $0.60.
        let cost = calculate_cost(1_000_000, 500_000);
        assert!((cost - 0.45).abs() < 1e-9);
    }

    #[test]
    fn cost_of_small_counts_is_exact() {
        let cost = calculate_cost(1000, 500);
        let expected = (1000.0 / 1_000_000.0) * 0.15 + (500.0 / 1_000_000.0) * 0.60;
        assert!((cost - expected).abs() < 1e-12);
    }

    #[test]
    fn cost_is_linear_and_additive() {
        let (a, b, c) = (123_456, 789_012, 34_567);
        let combined = calculate_cost(a + b, c);
        let split = calculate_cost(a, c) + calculate_cost(b, 0);
        assert!((combined - split).abs() < 1e-9);
    }

    #[test]
    fn record_rounds_latency_and_cost() {
        let record = MetricRecord::new("q", &sample_usage(1000, 500), 12.3456, "gpt-4o-mini");
        assert_eq!(record.latency_ms, 12.35);
        assert_eq!(record.cost, 0.00045);
        assert_eq!(record.total_tokens, 1500);
        assert!(record.moderation_blocked.is_none());
    }

    #[test]
    fn append_creates_file_and_parent_directories() {
        let dir = TempDir::new().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics/metrics.json"));

        log.append(MetricRecord::new(
            "first",
            &sample_usage(10, 5),
            3.0,
            "gpt-4o-mini",
        ))
        .unwrap();

        let records = log.read_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "first");
    }

    #[test]
    fn appends_accumulate_in_order() {
        let dir = TempDir::new().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics.json"));

        for query in ["one", "two", "three"] {
            log.append(MetricRecord::new(
                query,
                &sample_usage(10, 5),
                1.0,
                "gpt-4o-mini",
            ))
            .unwrap();
        }

        let queries: Vec<String> = log.read_all().into_iter().map(|r| r.query).collect();
        assert_eq!(queries, ["one", "two", "three"]);
    }

    #[test]
    fn corrupt_log_reads_as_empty_and_is_recreated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, "{ not json").unwrap();

        let log = MetricsLog::new(&path);
        assert!(log.read_all().is_empty());

        log.append(MetricRecord::new(
            "fresh",
            &sample_usage(10, 5),
            1.0,
            "gpt-4o-mini",
        ))
        .unwrap();
        assert_eq!(log.read_all().len(), 1);
    }

    #[test]
    fn blocked_flag_round_trips_through_the_file() {
        let dir = TempDir::new().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics.json"));

        let mut record = MetricRecord::new("bad", &sample_usage(10, 5), 1.0, "gpt-4o-mini");
        record.mark_output_blocked();
        log.append(record).unwrap();

        let records = log.read_all();
        assert_eq!(records[0].moderation_blocked, Some(true));
    }

    #[test]
    fn unblocked_records_omit_the_flag_when_serialized() {
        let record = MetricRecord::new("ok", &sample_usage(10, 5), 1.0, "gpt-4o-mini");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("moderation_blocked"));
    }

    #[test]
    fn summary_aggregates_records() {
        let mut blocked = MetricRecord::new("b", &sample_usage(100, 50), 20.0, "gpt-4o-mini");
        blocked.mark_output_blocked();
        let records = vec![
            MetricRecord::new("a", &sample_usage(100, 50), 10.0, "gpt-4o-mini"),
            blocked,
        ];

        let summary = summarize(&records);
        assert_eq!(summary.turns, 2);
        assert_eq!(summary.total_tokens, 300);
        assert_eq!(summary.blocked_outputs, 1);
        assert!((summary.mean_latency_ms - 15.0).abs() < 1e-9);
    }

    #[test]
    fn summary_of_empty_log_is_all_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.turns, 0);
        assert_eq!(summary.total_tokens, 0);
        assert_eq!(summary.mean_latency_ms, 0.0);
    }
}
