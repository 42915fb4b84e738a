//! Level 1 / level 2 selection across skill and modality fallback chains

use crate::config::{Config, FallbackStrategy, TaskTarget};
use crate::filter::{Candidate, CandidateFilter};
use crate::ledger::Ledger;
use crate::ranker::{FairnessRanker, Phase};
use crate::types::{Roster, SkillValue};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Where the pick came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Strict pool of the requested combination
    Primary,
    /// Fallback pool, possibly another skill or modality
    Fallback,
}

/// A request after special-task resolution. Always has at least one target.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    now: DateTime<Utc>,
    /// Combinations ranked together at level 1; the first one anchors the chains
    targets: Vec<TaskTarget>,
    allow_fallback: bool,
}

impl ResolvedRequest {
    pub fn new(now: DateTime<Utc>, skill: &str, modality: &str) -> Self {
        Self {
            now,
            targets: vec![TaskTarget::new(skill, modality)],
            allow_fallback: true,
        }
    }

    /// `None` when `targets` is empty
    pub fn with_targets(now: DateTime<Utc>, targets: Vec<TaskTarget>) -> Option<Self> {
        if targets.is_empty() {
            return None;
        }
        Some(Self {
            now,
            targets,
            allow_fallback: true,
        })
    }

    pub fn strict(mut self) -> Self {
        self.allow_fallback = false;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn targets(&self) -> &[TaskTarget] {
        &self.targets
    }

    pub fn allows_fallback(&self) -> bool {
        self.allow_fallback
    }

    pub fn skill(&self) -> &str {
        &self.targets[0].skill
    }

    pub fn modality(&self) -> &str {
        &self.targets[0].modality
    }

    fn is_target(&self, skill: &str, modality: &str) -> bool {
        self.targets
            .iter()
            .any(|t| t.skill == skill && t.modality == modality)
    }
}

/// The chosen candidate, not yet committed
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub candidate: Candidate<'a>,
    pub ratio: f64,
    pub level: Level,
    pub phase: Phase,
}

type Combo = (String, String);

/// Walks the configured fallback chains using one of three strategies
#[derive(Debug, Clone, Copy)]
pub struct FallbackCascade<'a> {
    config: &'a Config,
    filter: CandidateFilter<'a>,
    ranker: FairnessRanker<'a>,
}

impl<'a> FallbackCascade<'a> {
    pub fn new(config: &'a Config, roster: &'a Roster, ledger: &'a Ledger) -> Self {
        Self {
            config,
            filter: CandidateFilter::new(roster, &config.exclusions),
            ranker: FairnessRanker::new(roster, ledger, &config.balancer),
        }
    }

    pub fn select(&self, request: &ResolvedRequest) -> Option<Selection<'a>> {
        let now = request.now;

        let strict: Vec<Candidate<'a>> = request
            .targets
            .iter()
            .flat_map(|t| self.filter.filter(now, &t.skill, &t.modality).strict)
            .collect();

        let primary = self.ranker.rank(&strict, now).map(|ranked| {
            let imbalanced = self.ranker.is_imbalanced(&ranked);
            let selection = Selection {
                candidate: strict[ranked.index].clone(),
                ratio: ranked.ratio,
                level: Level::Primary,
                phase: ranked.phase,
            };
            (selection, imbalanced)
        });

        let Some((primary, imbalanced)) = primary else {
            return if request.allow_fallback {
                self.walk(request, false)
            } else {
                None
            };
        };

        if !(request.allow_fallback && imbalanced && self.config.balancer.imbalance_fallback) {
            return Some(primary);
        }

        debug!(
            worker = primary.candidate.worker_id(),
            ratio = primary.ratio,
            "level 1 pick is imbalanced, consulting fallback"
        );
        match self.walk(request, true) {
            Some(fallback) if fallback.ratio < primary.ratio => Some(fallback),
            _ => Some(primary),
        }
    }

    /// Level 2: rank stage by stage, first stage with a candidate wins.
    /// `by_ratio` drops the minimum phase, used when level 1 was imbalanced.
    fn walk(&self, request: &ResolvedRequest, by_ratio: bool) -> Option<Selection<'a>> {
        let now = request.now;
        for stage in self.fallback_stages(request) {
            let pool: Vec<Candidate<'a>> = stage
                .iter()
                .flat_map(|(skill, modality)| self.filter.filter(now, skill, modality).fallback)
                .filter(|c| !self.vetoed(c, request))
                .collect();

            let ranked = if by_ratio {
                self.ranker.rank_by_ratio(&pool, now)
            } else {
                self.ranker.rank(&pool, now)
            };
            if let Some(ranked) = ranked {
                debug!(?stage, "fallback stage produced a candidate");
                return Some(Selection {
                    candidate: pool[ranked.index].clone(),
                    ratio: ranked.ratio,
                    level: Level::Fallback,
                    phase: ranked.phase,
                });
            }
        }
        None
    }

    /// Ordered level 2 stages of (skill, modality) combinations, deduplicated
    pub fn fallback_stages(&self, request: &ResolvedRequest) -> Vec<Vec<Combo>> {
        let skill = request.skill().to_string();
        let modality = request.modality().to_string();

        let skill_stages: Vec<Vec<String>> = std::iter::once(vec![skill.clone()])
            .chain(
                self.config
                    .skill_fallback
                    .get(&skill)
                    .map(|chain| chain.stages())
                    .unwrap_or_default(),
            )
            .collect();
        let modality_stages: Vec<Vec<String>> = std::iter::once(vec![modality.clone()])
            .chain(
                self.config
                    .modality_fallback
                    .get(&modality)
                    .map(|chain| chain.stages())
                    .unwrap_or_default(),
            )
            .collect();

        let mut stages: Vec<Vec<Combo>> = Vec::new();
        match self.config.balancer.strategy {
            FallbackStrategy::SkillPriority => {
                for modalities in &modality_stages {
                    for skills in &skill_stages {
                        stages.push(cross(skills, modalities));
                    }
                }
            }
            FallbackStrategy::ModalityPriority => {
                for modalities in &modality_stages {
                    stages.push(cross(std::slice::from_ref(&skill), modalities));
                }
                for skills in skill_stages.iter().skip(1) {
                    stages.push(cross(skills, std::slice::from_ref(&modality)));
                }
            }
            FallbackStrategy::PoolPriority => {
                let skills: Vec<String> = skill_stages.concat();
                let modalities: Vec<String> = modality_stages.concat();
                stages.push(cross(&skills, &modalities));
            }
        }

        let targets: Vec<Combo> = request
            .targets
            .iter()
            .map(|t| (t.skill.clone(), t.modality.clone()))
            .collect();
        if let Some(first) = stages.first_mut() {
            let rest = std::mem::take(first);
            *first = targets.into_iter().chain(rest).collect();
        }

        let mut seen: HashSet<Combo> = HashSet::new();
        stages
            .into_iter()
            .map(|stage| {
                stage
                    .into_iter()
                    .filter(|combo| seen.insert(combo.clone()))
                    .collect::<Vec<_>>()
            })
            .filter(|stage| !stage.is_empty())
            .collect()
    }

    /// An explicit -1 for the anchor skill keeps the worker out of every combination
    /// reached through the chains. A combination that is itself a target is judged only
    /// by its own skill value.
    fn vetoed(&self, candidate: &Candidate<'_>, request: &ResolvedRequest) -> bool {
        if request.is_target(&candidate.skill, &candidate.modality) {
            return false;
        }
        let skill = request.skill();
        [request.modality(), candidate.modality.as_str()]
            .into_iter()
            .any(|m| candidate.worker.skill_value(m, skill) == Some(SkillValue::Excluded))
    }
}

fn cross(skills: &[String], modalities: &[String]) -> Vec<Combo> {
    modalities
        .iter()
        .flat_map(|m| skills.iter().map(move |s| (s.clone(), m.clone())))
        .collect()
}
