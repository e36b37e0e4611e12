use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Requests kept when `METRICS_CAPACITY` is not set.
pub const DEFAULT_CAPACITY: usize = 1_000;

/// One handled `/inventory` request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub at: DateTime<Utc>,
    pub operation: &'static str,
    /// "created" | "updated" | "exact" | "partial" | "deleted", or an error kind
    pub outcome: &'static str,
    /// Item name or search query the request was about, when known
    pub item: Option<String>,
    pub elapsed_us: f64,
    /// Store size right after the operation; `None` when it was rejected
    pub items_after: Option<usize>,
    pub success: bool,
}

/// Bounded log of recent requests. Once full, the oldest record is evicted
/// for every new one.
#[derive(Debug)]
pub struct RequestLog {
    entries: VecDeque<RequestRecord>,
    capacity: usize,
    total_recorded: u64,
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RequestLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            total_recorded: 0,
        }
    }

    pub fn record(&mut self, entry: RequestRecord) {
        self.total_recorded += 1;
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every request seen since start-up (or the last reset), retained or not.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn evicted(&self) -> u64 {
        self.total_recorded - self.entries.len() as u64
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_recorded = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestRecord> {
        self.entries.iter()
    }

    /// Per-operation breakdown of the retained records, ordered by operation.
    pub fn summary(&self) -> Vec<OperationSummary> {
        let mut by_op: BTreeMap<&'static str, OperationSummary> = BTreeMap::new();

        for e in &self.entries {
            let s = by_op.entry(e.operation).or_insert_with(|| OperationSummary {
                operation: e.operation,
                ..OperationSummary::default()
            });
            s.requests += 1;
            if !e.success {
                s.failures += 1;
            }
            *s.outcomes.entry(e.outcome).or_default() += 1;
            s.mean_us += e.elapsed_us;
            s.max_us = s.max_us.max(e.elapsed_us);
        }

        by_op
            .into_values()
            .map(|mut s| {
                s.mean_us /= s.requests as f64;
                s
            })
            .collect()
    }

    /// Items named most often in retained requests, busiest first; ties by name.
    pub fn busiest_items(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for name in self.entries.iter().filter_map(|e| e.item.as_deref()) {
            *counts.entry(name).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, n)| (name.to_string(), n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Retained records as CSV, oldest first.
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "at",
            "operation",
            "outcome",
            "item",
            "elapsed_us",
            "items_after",
            "success",
        ])?;

        for e in &self.entries {
            wtr.write_record([
                e.at.to_rfc3339(),
                e.operation.to_string(),
                e.outcome.to_string(),
                e.item.clone().unwrap_or_default(),
                format!("{:.3}", e.elapsed_us),
                e.items_after.map(|n| n.to_string()).unwrap_or_default(),
                e.success.to_string(),
            ])?;
        }

        Ok(String::from_utf8(wtr.into_inner()?)?)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationSummary {
    pub operation: &'static str,
    pub requests: usize,
    pub failures: usize,
    pub outcomes: BTreeMap<&'static str, usize>,
    pub mean_us: f64,
    pub max_us: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(operation: &'static str, outcome: &'static str, item: &str, us: f64) -> RequestRecord {
        RequestRecord {
            at: Utc::now(),
            operation,
            outcome,
            item: Some(item.to_string()),
            elapsed_us: us,
            items_after: Some(1),
            success: !outcome.contains('_') && outcome != "rejected",
        }
    }

    #[test]
    fn full_log_evicts_oldest_first() {
        let mut log = RequestLog::with_capacity(2);
        log.record(rec("add", "created", "apple", 1.0));
        log.record(rec("add", "updated", "apple", 1.0));
        log.record(rec("get", "exact", "pear", 1.0));

        assert_eq!(log.len(), 2);
        assert_eq!(log.total_recorded(), 3);
        assert_eq!(log.evicted(), 1);
        let outcomes: Vec<&str> = log.iter().map(|e| e.outcome).collect();
        assert_eq!(outcomes, vec!["updated", "exact"]);
    }

    #[test]
    fn zero_capacity_counts_but_keeps_nothing() {
        let mut log = RequestLog::with_capacity(0);
        log.record(rec("delete", "deleted", "apple", 1.0));
        assert_eq!(log.len(), 0);
        assert_eq!(log.total_recorded(), 1);
    }

    #[test]
    fn summary_groups_outcomes_per_operation() {
        let mut log = RequestLog::default();
        log.record(rec("adjust", "updated", "apple", 10.0));
        log.record(rec("adjust", "rejected", "apple", 30.0));
        log.record(rec("adjust", "not_found", "kiwi", 20.0));
        log.record(rec("add", "created", "apple", 5.0));

        let summary = log.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].operation, "add");

        let adjust = &summary[1];
        assert_eq!(adjust.requests, 3);
        assert_eq!(adjust.failures, 2);
        assert_eq!(adjust.outcomes["rejected"], 1);
        assert!((adjust.mean_us - 20.0).abs() < 1e-9);
        assert!((adjust.max_us - 30.0).abs() < 1e-9);
    }

    #[test]
    fn busiest_items_rank_by_count_then_name() {
        let mut log = RequestLog::default();
        for item in ["pear", "apple", "pear", "fig", "apple", "pear"] {
            log.record(rec("get", "exact", item, 1.0));
        }
        assert_eq!(
            log.busiest_items(2),
            vec![("pear".to_string(), 3), ("apple".to_string(), 2)]
        );
    }

    #[test]
    fn csv_leaves_unknown_fields_blank() {
        let mut log = RequestLog::default();
        log.record(RequestRecord {
            item: None,
            items_after: None,
            success: false,
            ..rec("add", "malformed_body", "", 2.0)
        });

        let csv = log.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("at,operation,outcome,item"));
        assert!(lines[1].ends_with(",add,malformed_body,,2.000,,false"));
    }

    #[test]
    fn clear_resets_counters() {
        let mut log = RequestLog::with_capacity(1);
        log.record(rec("get", "partial", "ap", 1.0));
        log.record(rec("get", "partial", "ap", 1.0));
        log.clear();
        assert_eq!((log.len(), log.total_recorded(), log.evicted()), (0, 0, 0));
    }
}
