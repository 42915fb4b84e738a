//! Usage record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committed assignment, as handed to audit sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub worker_id: String,
    pub skill_used: String,
    pub modality_used: String,
    #[serde(default)]
    pub requested_skill: Option<String>,
    #[serde(default)]
    pub requested_modality: Option<String>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub overflow: bool,
}

/// Aggregate view over a set of usage records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStats {
    pub total: usize,
    pub overflow: usize,
    pub weighted_total: f64,
    pub per_worker: BTreeMap<String, usize>,
    pub per_modality: BTreeMap<String, usize>,
}

impl UsageStats {
    pub fn from_records(records: &[UsageRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            if record.overflow {
                stats.overflow += 1;
            }
            stats.weighted_total += record.weight;
            *stats.per_worker.entry(record.worker_id.clone()).or_insert(0) += 1;
            *stats
                .per_modality
                .entry(record.modality_used.clone())
                .or_insert(0) += 1;
        }
        stats
    }

    /// Share of assignments that left the requested skill or modality, in percent
    pub fn overflow_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.overflow as f64 / self.total as f64 * 100.0
    }
}
