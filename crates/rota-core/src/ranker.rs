//! Two-phase minimum balancer over work-hour-adjusted load ratios

use crate::config::BalancerConfig;
use crate::filter::Candidate;
use crate::ledger::Ledger;
use crate::types::{Roster, SkillValue};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Which part of the pool the pick was restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Active workers still below `min_assignments_per_skill`
    Minimum,
    /// Whole pool
    Normal,
}

/// Outcome of ranking a pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Index of the pick in the ranked pool
    pub index: usize,
    pub ratio: f64,
    /// Mean ratio over the distinct workers of the pool
    pub mean_ratio: f64,
    pub phase: Phase,
}

/// Picks the least-loaded candidate
#[derive(Debug, Clone, Copy)]
pub struct FairnessRanker<'a> {
    roster: &'a Roster,
    ledger: &'a Ledger,
    settings: &'a BalancerConfig,
}

impl<'a> FairnessRanker<'a> {
    pub fn new(roster: &'a Roster, ledger: &'a Ledger, settings: &'a BalancerConfig) -> Self {
        Self {
            roster,
            ledger,
            settings,
        }
    }

    /// Weighted assignments per hour worked; lower is less loaded
    pub fn ratio(&self, worker_id: &str, now: DateTime<Utc>) -> f64 {
        let hours = self
            .roster
            .hours_worked(worker_id, now)
            .max(self.settings.min_work_hours);
        self.ledger.total_weighted(worker_id) / hours
    }

    /// Active candidate whose weighted count for its skill is below the minimum
    fn is_under_minimum(&self, candidate: &Candidate<'_>) -> bool {
        let minimum = self.settings.min_assignments_per_skill;
        minimum > 0
            && candidate.value == SkillValue::Active
            && self
                .ledger
                .skill_weighted(candidate.worker_id(), &candidate.skill)
                < f64::from(minimum)
    }

    /// Argmin ratio, restricted to under-served active workers while any remain.
    /// Ties go to the lower worker id, then to the earlier pool position.
    pub fn rank(&self, pool: &[Candidate<'_>], now: DateTime<Utc>) -> Option<Ranked> {
        self.rank_with(pool, now, true)
    }

    /// Argmin ratio over the whole pool, skipping the minimum phase
    pub fn rank_by_ratio(&self, pool: &[Candidate<'_>], now: DateTime<Utc>) -> Option<Ranked> {
        self.rank_with(pool, now, false)
    }

    fn rank_with(&self, pool: &[Candidate<'_>], now: DateTime<Utc>, minimum: bool) -> Option<Ranked> {
        if pool.is_empty() {
            return None;
        }

        let mut ratios: BTreeMap<&str, f64> = BTreeMap::new();
        for candidate in pool {
            ratios
                .entry(candidate.worker_id())
                .or_insert_with(|| self.ratio(candidate.worker_id(), now));
        }
        let mean_ratio = ratios.values().sum::<f64>() / ratios.len() as f64;

        let under_served: Vec<usize> = (0..pool.len())
            .filter(|&i| minimum && self.is_under_minimum(&pool[i]))
            .collect();
        let (phase, eligible) = if under_served.is_empty() {
            (Phase::Normal, (0..pool.len()).collect::<Vec<_>>())
        } else {
            (Phase::Minimum, under_served)
        };

        eligible
            .into_iter()
            .min_by(|&a, &b| {
                let (ca, cb) = (&pool[a], &pool[b]);
                ratios[ca.worker_id()]
                    .total_cmp(&ratios[cb.worker_id()])
                    .then_with(|| ca.worker_id().cmp(cb.worker_id()))
                    .then_with(|| a.cmp(&b))
            })
            .map(|index| Ranked {
                index,
                ratio: ratios[pool[index].worker_id()],
                mean_ratio,
                phase,
            })
    }

    /// The pick sits above the pool mean by more than the configured threshold
    pub fn is_imbalanced(&self, ranked: &Ranked) -> bool {
        let limit = ranked.mean_ratio * (1.0 + self.settings.imbalance_threshold_pct / 100.0);
        ranked.ratio > limit
    }
}
