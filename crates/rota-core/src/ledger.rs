//! Per-worker assignment counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw and weighted count for one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub count: u64,
    pub weighted: f64,
}

impl Tally {
    fn add(&mut self, weight: f64) {
        self.count += 1;
        self.weighted += weight;
    }
}

/// Counters for one worker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerLedger {
    #[serde(default)]
    pub skills: BTreeMap<String, Tally>,
    #[serde(default)]
    pub modalities: BTreeMap<String, Tally>,
    #[serde(default)]
    pub total: Tally,
}

/// Row of [`Ledger::summary`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub worker_id: String,
    pub assignments: u64,
    pub weighted: f64,
}

/// Source of truth for the fairness ratios.
///
/// Only mutated through [`crate::Balancer`], inside the same critical section as the
/// selection that produced the assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub workers: BTreeMap<String, WorkerLedger>,
    #[serde(default)]
    pub last_reset: Option<DateTime<Utc>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book one assignment; returns the canonical worker id
    pub fn commit(&mut self, worker_id: &str, skill: &str, modality: &str, weight: f64) -> String {
        let entry = self.workers.entry(worker_id.to_string()).or_default();
        entry.skills.entry(skill.to_string()).or_default().add(weight);
        entry
            .modalities
            .entry(modality.to_string())
            .or_default()
            .add(weight);
        entry.total.add(weight);
        worker_id.to_string()
    }

    pub fn worker(&self, worker_id: &str) -> Option<&WorkerLedger> {
        self.workers.get(worker_id)
    }

    /// Weighted count for one skill across modalities
    pub fn skill_weighted(&self, worker_id: &str, skill: &str) -> f64 {
        self.worker(worker_id)
            .and_then(|w| w.skills.get(skill))
            .map_or(0.0, |t| t.weighted)
    }

    pub fn modality_weighted(&self, worker_id: &str, modality: &str) -> f64 {
        self.worker(worker_id)
            .and_then(|w| w.modalities.get(modality))
            .map_or(0.0, |t| t.weighted)
    }

    /// Global weighted total, the numerator of the fairness ratio
    pub fn total_weighted(&self, worker_id: &str) -> f64 {
        self.worker(worker_id).map_or(0.0, |w| w.total.weighted)
    }

    /// Sum of all workers' weighted totals
    pub fn grand_total(&self) -> f64 {
        self.workers.values().map(|w| w.total.weighted).sum()
    }

    /// Zero every counter, e.g. at the start of a new roster day
    pub fn reset(&mut self, at: DateTime<Utc>) {
        self.workers.clear();
        self.last_reset = Some(at);
    }

    /// Per-worker totals, heaviest first
    pub fn summary(&self) -> Vec<WorkerSummary> {
        let mut rows: Vec<WorkerSummary> = self
            .workers
            .iter()
            .map(|(id, w)| WorkerSummary {
                worker_id: id.clone(),
                assignments: w.total.count,
                weighted: w.total.weighted,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.weighted
                .total_cmp(&a.weighted)
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_commit_updates_every_bucket() {
        let mut ledger = Ledger::new();
        let id = ledger.commit("anna", "Herz", "ct", 1.5);
        ledger.commit("anna", "Herz", "mr", 2.0);
        ledger.commit("anna", "Normal", "ct", 0.5);

        assert_eq!(id, "anna");
        let anna = ledger.worker("anna").unwrap();
        assert_eq!(anna.skills["Herz"], Tally { count: 2, weighted: 3.5 });
        assert_eq!(anna.modalities["ct"], Tally { count: 2, weighted: 2.0 });
        assert_eq!(anna.total, Tally { count: 3, weighted: 4.0 });
        assert_eq!(ledger.skill_weighted("anna", "Herz"), 3.5);
        assert_eq!(ledger.modality_weighted("anna", "mr"), 2.0);
    }

    #[test]
    fn test_unknown_worker_reads_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.total_weighted("nobody"), 0.0);
        assert_eq!(ledger.skill_weighted("nobody", "Herz"), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut ledger = Ledger::new();
        ledger.commit("anna", "Herz", "ct", 1.0);
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
        ledger.reset(at);

        assert!(ledger.workers.is_empty());
        assert_eq!(ledger.last_reset, Some(at));
        assert_eq!(ledger.grand_total(), 0.0);
    }

    #[test]
    fn test_summary_order() {
        let mut ledger = Ledger::new();
        ledger.commit("ben", "Herz", "ct", 1.0);
        ledger.commit("anna", "Herz", "ct", 3.0);
        ledger.commit("cleo", "Herz", "ct", 1.0);

        let ids: Vec<_> = ledger.summary().into_iter().map(|r| r.worker_id).collect();
        assert_eq!(ids, vec!["anna", "ben", "cleo"]);
    }

    #[test]
    fn test_ledger_snapshot_roundtrip() {
        let mut ledger = Ledger::new();
        ledger.commit("anna", "Herz", "ct", 1.25);

        let json = serde_json::to_string(&ledger).unwrap();
        let parsed: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ledger);

        let empty: Ledger = serde_json::from_str("{}").unwrap();
        assert!(empty.workers.is_empty());
    }
}
