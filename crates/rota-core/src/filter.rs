//! Strict and fallback candidate pools

use crate::types::{Roster, SkillValue, Worker};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

/// A worker considered for one (skill, modality) combination
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub worker: &'a Worker,
    pub skill: String,
    pub modality: String,
    pub value: SkillValue,
}

impl Candidate<'_> {
    pub fn worker_id(&self) -> &str {
        &self.worker.id
    }
}

/// Level 1 and level 2 pools for one combination
#[derive(Debug, Clone, Default)]
pub struct Pools<'a> {
    /// Active or weighted, not hit by an exclusion rule
    pub strict: Vec<Candidate<'a>>,
    /// Anything but excluded; exclusion rules ignored
    pub fallback: Vec<Candidate<'a>>,
}

impl Pools<'_> {
    pub fn is_empty(&self) -> bool {
        self.strict.is_empty() && self.fallback.is_empty()
    }
}

/// Derives candidate pools from the availability snapshot
#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter<'a> {
    roster: &'a Roster,
    exclusions: &'a BTreeMap<String, Vec<String>>,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(roster: &'a Roster, exclusions: &'a BTreeMap<String, Vec<String>>) -> Self {
        Self { roster, exclusions }
    }

    pub fn filter(&self, now: DateTime<Utc>, skill: &str, modality: &str) -> Pools<'a> {
        let mut pools = Pools::default();

        if !self.roster.covers_modality(modality) {
            warn!(modality, "availability snapshot has no shifts for modality");
            return pools;
        }

        let excluded_by: &[String] = self
            .exclusions
            .get(skill)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for worker in &self.roster.workers {
            let Some(value) = worker.skill_value(modality, skill) else {
                continue;
            };
            if !value.is_assignable() || !self.roster.is_on_shift(&worker.id, modality, now) {
                continue;
            }

            let candidate = Candidate {
                worker,
                skill: skill.to_string(),
                modality: modality.to_string(),
                value,
            };

            let excluded = excluded_by
                .iter()
                .any(|other| worker.skill_value(modality, other) == Some(SkillValue::Active));
            if value.is_primary() && !excluded {
                pools.strict.push(candidate.clone());
            }
            pools.fallback.push(candidate);
        }

        pools
    }
}
