//! Lock-guarded engine: selection and ledger update in one critical section

use crate::cascade::{FallbackCascade, Level, ResolvedRequest};
use crate::config::{Config, SpecialTask};
use crate::error::{ConfigError, EngineError};
use crate::ledger::Ledger;
use crate::ranker::FairnessRanker;
use crate::types::{AssignRequest, Assignment, Roster, SkillValue};
use crate::usage::UsageSink;
use crate::weight::WeightModel;
use chrono::{DateTime, Utc};
use rota_telemetry::UsageRecord;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

struct State {
    config: Arc<Config>,
    roster: Arc<Roster>,
    ledger: Ledger,
}

/// Current load of one rostered worker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerLoad {
    pub worker_id: String,
    pub name: String,
    pub hours_worked: f64,
    pub weighted: f64,
    pub assignments: u64,
    pub ratio: f64,
    /// Modalities the worker is on shift for at the time of the report
    pub on_shift: Vec<String>,
}

/// The assignment engine.
///
/// One process-wide lock covers the config, roster and ledger, so filtering, ranking
/// and committing happen atomically per request. Share it behind an `Arc`.
pub struct Balancer {
    state: Mutex<State>,
    sinks: Vec<Box<dyn UsageSink>>,
}

impl Balancer {
    pub fn new(config: Config, roster: Roster) -> Result<Self, EngineError> {
        Self::with_ledger(config, roster, Ledger::new())
    }

    /// Start from a persisted counter snapshot
    pub fn with_ledger(config: Config, roster: Roster, ledger: Ledger) -> Result<Self, EngineError> {
        config.validate()?;
        roster.validate()?;
        Ok(Self {
            state: Mutex::new(State {
                config: Arc::new(config),
                roster: Arc::new(roster),
                ledger,
            }),
            sinks: Vec::new(),
        })
    }

    pub fn add_sink(&mut self, sink: Box<dyn UsageSink>) {
        self.sinks.push(sink);
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, EngineError> {
        self.state.lock().map_err(|_| EngineError::Poisoned)
    }

    /// Pick the least-loaded eligible worker and book the assignment.
    ///
    /// `Ok(None)` means no candidate was found; nothing is booked in that case.
    pub fn select_and_commit(&self, request: &AssignRequest) -> Result<Option<Assignment>, EngineError> {
        let (assignment, record) = {
            let mut state = self.lock()?;
            let config = Arc::clone(&state.config);
            let roster = Arc::clone(&state.roster);

            let (resolved, task) = resolve(&config, request)?;
            let cascade = FallbackCascade::new(&config, &roster, &state.ledger);
            let Some(selection) = cascade.select(&resolved) else {
                debug!(
                    skill = %request.skill,
                    modality = %request.modality,
                    strict = !resolved.allows_fallback(),
                    "no candidate"
                );
                return Ok(None);
            };

            let candidate = &selection.candidate;
            let weight = WeightModel::new(&config).weight(
                &candidate.skill,
                &candidate.modality,
                candidate.worker,
                task,
                request.code.as_deref(),
            )?;

            let overflow = !resolved
                .targets()
                .iter()
                .any(|t| t.skill == candidate.skill && t.modality == candidate.modality);
            let assignment = Assignment {
                worker_id: candidate.worker.id.clone(),
                worker_name: candidate.worker.display_name().to_string(),
                skill_used: candidate.skill.clone(),
                modality_used: candidate.modality.clone(),
                is_weighted: candidate.value == SkillValue::Weighted,
                weight,
                overflow,
                timestamp: request.timestamp,
            };
            let level = selection.level;

            state.ledger.commit(
                &assignment.worker_id,
                &assignment.skill_used,
                &assignment.modality_used,
                weight,
            );

            info!(
                worker = %assignment.worker_id,
                skill = %assignment.skill_used,
                modality = %assignment.modality_used,
                weight,
                fallback = level == Level::Fallback,
                "assigned"
            );

            let record = UsageRecord {
                timestamp: assignment.timestamp,
                worker_id: assignment.worker_id.clone(),
                skill_used: assignment.skill_used.clone(),
                modality_used: assignment.modality_used.clone(),
                requested_skill: Some(resolved.skill().to_string()),
                requested_modality: Some(resolved.modality().to_string()),
                weight,
                overflow,
            };
            (assignment, record)
        };

        for sink in &self.sinks {
            sink.record(&record);
        }

        Ok(Some(assignment))
    }

    /// Swap in a fresh availability snapshot
    pub fn replace_roster(&self, roster: Roster) -> Result<(), EngineError> {
        roster.validate()?;
        self.lock()?.roster = Arc::new(roster);
        Ok(())
    }

    /// Swap in a new configuration; an invalid one leaves the current config in place
    pub fn reload_config(&self, config: Config) -> Result<(), EngineError> {
        config.validate()?;
        self.lock()?.config = Arc::new(config);
        Ok(())
    }

    pub fn config(&self) -> Result<Arc<Config>, EngineError> {
        Ok(Arc::clone(&self.lock()?.config))
    }

    pub fn roster(&self) -> Result<Arc<Roster>, EngineError> {
        Ok(Arc::clone(&self.lock()?.roster))
    }

    /// Consistent copy of the counters, for persistence
    pub fn ledger(&self) -> Result<Ledger, EngineError> {
        Ok(self.lock()?.ledger.clone())
    }

    pub fn reset_counters(&self, at: DateTime<Utc>) -> Result<(), EngineError> {
        self.lock()?.ledger.reset(at);
        Ok(())
    }

    /// Load of every rostered worker at `now`, least loaded first
    pub fn load_report(&self, now: DateTime<Utc>) -> Result<Vec<WorkerLoad>, EngineError> {
        let state = self.lock()?;
        let ranker = FairnessRanker::new(&state.roster, &state.ledger, &state.config.balancer);

        let mut rows: Vec<WorkerLoad> = state
            .roster
            .workers
            .iter()
            .map(|worker| {
                let totals = state.ledger.worker(&worker.id).map(|w| w.total).unwrap_or_default();
                let mut on_shift: Vec<String> = state
                    .roster
                    .windows
                    .iter()
                    .filter(|w| w.worker_id == worker.id && w.contains(now))
                    .map(|w| w.modality.clone())
                    .collect();
                on_shift.sort();
                on_shift.dedup();
                WorkerLoad {
                    worker_id: worker.id.clone(),
                    name: worker.display_name().to_string(),
                    hours_worked: state.roster.hours_worked(&worker.id, now),
                    weighted: totals.weighted,
                    assignments: totals.count,
                    ratio: ranker.ratio(&worker.id, now),
                    on_shift,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            a.ratio
                .total_cmp(&b.ratio)
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });
        Ok(rows)
    }
}

fn resolve<'c>(
    config: &'c Config,
    request: &AssignRequest,
) -> Result<(ResolvedRequest, Option<&'c SpecialTask>), EngineError> {
    let Some(name) = &request.special_task else {
        let resolved = ResolvedRequest::new(request.timestamp, &request.skill, &request.modality);
        let resolved = if request.strict {
            resolved.strict()
        } else {
            resolved
        };
        return Ok((resolved, None));
    };

    let task = config
        .special_tasks
        .get(name)
        .ok_or_else(|| EngineError::UnknownTask(name.clone()))?;
    let resolved = ResolvedRequest::with_targets(request.timestamp, task.targets.clone()).ok_or_else(
        || ConfigError::InvalidTask {
            task: name.clone(),
            reason: "no target (skill, modality) combinations".to_string(),
        },
    )?;
    let resolved = if task.allow_overflow && !request.strict {
        resolved
    } else {
        resolved.strict()
    };
    Ok((resolved, Some(task)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskTarget;
    use crate::types::{ShiftWindow, Worker};
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, hour, 0, 0).unwrap()
    }

    fn config() -> Config {
        let mut config = Config::new();
        config.skill_weights.insert("Herz".to_string(), 1.0);
        config.skill_weights.insert("Normal".to_string(), 1.0);
        config.special_tasks.insert(
            "cardio-mr".to_string(),
            SpecialTask {
                targets: vec![TaskTarget::new("Herz", "mr")],
                work_amount: 2.5,
                allow_overflow: false,
            },
        );
        config
    }

    fn roster() -> Roster {
        Roster {
            workers: vec![
                Worker::new("anna")
                    .with_name("Anna")
                    .with_skill("ct", "Herz", SkillValue::Active)
                    .with_skill("mr", "Herz", SkillValue::Active),
                Worker::new("tom")
                    .with_skill("ct", "Herz", SkillValue::Weighted)
                    .with_weighted_modifier(0.5),
            ],
            windows: vec![
                ShiftWindow::new("anna", "ct", at(7), at(15)),
                ShiftWindow::new("anna", "mr", at(7), at(15)),
                ShiftWindow::new("tom", "ct", at(7), at(15)),
            ],
        }
    }

    struct Collect(StdMutex<Vec<UsageRecord>>);

    impl UsageSink for Collect {
        fn name(&self) -> &str {
            "collect"
        }

        fn record(&self, record: &UsageRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    impl UsageSink for Arc<Collect> {
        fn name(&self) -> &str {
            "collect"
        }

        fn record(&self, record: &UsageRecord) {
            self.as_ref().record(record);
        }
    }

    #[test]
    fn test_select_and_commit_books_weight() {
        let balancer = Balancer::new(config(), roster()).unwrap();

        let first = balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap()
            .unwrap();
        assert_eq!(first.worker_id, "anna");
        assert_eq!(first.worker_name, "Anna");
        assert!(!first.is_weighted);
        assert!(!first.overflow);

        let second = balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap()
            .unwrap();
        assert_eq!(second.worker_id, "tom");
        assert!(second.is_weighted);
        assert_eq!(second.weight, 2.0);

        let ledger = balancer.ledger().unwrap();
        assert_eq!(ledger.total_weighted("anna"), 1.0);
        assert_eq!(ledger.total_weighted("tom"), 2.0);
    }

    #[test]
    fn test_no_candidate_leaves_ledger_untouched() {
        let balancer = Balancer::new(config(), roster()).unwrap();
        let result = balancer
            .select_and_commit(&AssignRequest::new(at(20), "Herz", "ct"))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(balancer.ledger().unwrap(), Ledger::new());
    }

    #[test]
    fn test_special_task_remaps_and_scales() {
        let balancer = Balancer::new(config(), roster()).unwrap();
        let assignment = balancer
            .select_and_commit(&AssignRequest::new(at(9), "Normal", "ct").with_task("cardio-mr"))
            .unwrap()
            .unwrap();

        assert_eq!(assignment.worker_id, "anna");
        assert_eq!(assignment.skill_used, "Herz");
        assert_eq!(assignment.modality_used, "mr");
        assert_eq!(assignment.weight, 2.5);
        assert!(!assignment.overflow);
    }

    #[test]
    fn test_unknown_task_is_an_error() {
        let balancer = Balancer::new(config(), roster()).unwrap();
        let result = balancer.select_and_commit(&AssignRequest::new(at(9), "Herz", "ct").with_task("nope"));
        assert!(matches!(result, Err(EngineError::UnknownTask(name)) if name == "nope"));
    }

    #[test]
    fn test_sinks_receive_records() {
        let collect = Arc::new(Collect(StdMutex::new(Vec::new())));
        let mut balancer = Balancer::new(config(), roster()).unwrap();
        balancer.add_sink(Box::new(Arc::clone(&collect)));

        balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap();

        let records = collect.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].worker_id, "anna");
        assert_eq!(records[0].requested_modality.as_deref(), Some("ct"));
    }

    #[test]
    fn test_invalid_reload_keeps_config() {
        let balancer = Balancer::new(config(), roster()).unwrap();
        let mut broken = config();
        broken.skill_weights.insert("Herz".to_string(), f64::NAN);

        assert!(matches!(balancer.reload_config(broken), Err(EngineError::Config(_))));
        assert_eq!(*balancer.config().unwrap(), config());
    }

    #[test]
    fn test_replace_roster_keeps_ledger() {
        let balancer = Balancer::new(config(), roster()).unwrap();
        balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap();

        let mut next = roster();
        next.windows.retain(|w| w.worker_id != "anna");
        balancer.replace_roster(next).unwrap();

        let assignment = balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap()
            .unwrap();
        assert_eq!(assignment.worker_id, "tom");
        assert_eq!(balancer.ledger().unwrap().total_weighted("anna"), 1.0);
        assert_eq!(balancer.roster().unwrap().windows.len(), 1);
    }

    #[test]
    fn test_invalid_roster_rejected() {
        let mut bad = roster();
        bad.workers[0].modifier = -1.0;
        assert!(matches!(Balancer::new(config(), bad), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_reset_and_load_report() {
        let balancer = Balancer::new(config(), roster()).unwrap();
        balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap();

        let report = balancer.load_report(at(9)).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].worker_id, "tom");
        assert_eq!(report[1].worker_id, "anna");
        assert_eq!(report[1].ratio, 0.5);
        assert_eq!(report[1].on_shift, vec!["ct", "mr"]);

        balancer.reset_counters(at(23)).unwrap();
        let ledger = balancer.ledger().unwrap();
        assert!(ledger.workers.is_empty());
        assert_eq!(ledger.last_reset, Some(at(23)));
    }
}
