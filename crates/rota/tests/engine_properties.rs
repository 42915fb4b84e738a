mod common;

use common::{at, chained_config, roster_on, sample_config};
use rota_core::{AssignRequest, Balancer, FallbackStrategy, SkillValue, WeightModel, Worker};
use std::sync::Arc;
use std::thread;

fn mixed_workers() -> Vec<Worker> {
    let values = [
        SkillValue::Active,
        SkillValue::Passive,
        SkillValue::Excluded,
        SkillValue::Weighted,
    ];
    (0..12)
        .map(|i| {
            let mut worker = Worker::new(format!("w{i:02}"));
            for (j, skill) in ["Herz", "Notfall", "Normal"].into_iter().enumerate() {
                worker = worker.with_skill("ct", skill, values[(i + j) % values.len()]);
            }
            worker
        })
        .collect()
}

#[test]
fn test_excluded_worker_never_returned() {
    for strategy in [
        FallbackStrategy::SkillPriority,
        FallbackStrategy::ModalityPriority,
        FallbackStrategy::PoolPriority,
    ] {
        let mut config = chained_config();
        config.balancer.strategy = strategy;
        config.balancer.min_assignments_per_skill = 2;
        let roster = roster_on(mixed_workers(), "ct", 7, 19);
        let balancer = Balancer::new(config, roster).unwrap();

        for round in 0..60 {
            let skill = ["Herz", "Notfall", "Normal"][round % 3];
            let request = AssignRequest::new(at(9), skill, "ct");
            let Some(assignment) = balancer.select_and_commit(&request).unwrap() else {
                continue;
            };
            let roster = balancer.roster().unwrap();
            let worker = roster.worker(&assignment.worker_id).unwrap();
            assert_ne!(
                worker.skill_value("ct", skill),
                Some(SkillValue::Excluded),
                "{strategy:?}: {} is excluded from {skill}",
                worker.id
            );
            assert_ne!(
                worker.skill_value(&assignment.modality_used, &assignment.skill_used),
                Some(SkillValue::Excluded)
            );
        }
    }
}

#[test]
fn test_strict_mode_ignores_fallback_pool() {
    let workers = vec![
        Worker::new("pia").with_skill("ct", "Herz", SkillValue::Passive),
        Worker::new("nick").with_skill("ct", "Normal", SkillValue::Active),
    ];
    let balancer = Balancer::new(chained_config(), roster_on(workers, "ct", 7, 15)).unwrap();

    let strict = balancer
        .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct").strict())
        .unwrap();
    assert!(strict.is_none());
    assert!(balancer.ledger().unwrap().workers.is_empty());

    let relaxed = balancer
        .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
        .unwrap();
    assert!(relaxed.is_some());
}

#[test]
fn test_weight_is_idempotent() {
    let mut config = sample_config();
    config.code_multipliers.insert("CT-POLY".to_string(), 1.5);
    let worker = Worker::new("tom")
        .with_skill("ct", "Herz", SkillValue::Weighted)
        .with_weighted_modifier(0.75);
    let model = WeightModel::new(&config);

    let first = model.weight("Herz", "ct", &worker, None, Some("CT-POLY")).unwrap();
    let second = model.weight("Herz", "ct", &worker, None, Some("CT-POLY")).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, 2.0);
}

#[test]
fn test_minimum_phase_never_returns_after_reached() {
    let mut config = sample_config();
    config.balancer.min_assignments_per_skill = 2;
    let workers = vec![
        common::active("anna", "ct", &["Herz"]),
        common::active("ben", "ct", &["Herz"]),
    ];
    let balancer = Balancer::new(config, roster_on(workers, "ct", 7, 15)).unwrap();

    for _ in 0..20 {
        balancer
            .select_and_commit(&AssignRequest::new(at(9), "Herz", "ct"))
            .unwrap()
            .unwrap();
        let ledger = balancer.ledger().unwrap();
        let anna = ledger.skill_weighted("anna", "Herz");
        let ben = ledger.skill_weighted("ben", "Herz");
        // equal hours and unit weights: nobody drifts more than one ahead
        assert!((anna - ben).abs() <= 1.0);
    }

    let ledger = balancer.ledger().unwrap();
    assert_eq!(ledger.skill_weighted("anna", "Herz"), 10.0);
    assert_eq!(ledger.skill_weighted("ben", "Herz"), 10.0);
}

#[test]
fn test_concurrent_commits_are_atomic() {
    let mut config = sample_config();
    config.code_multipliers.insert("HEAVY".to_string(), 2.5);
    let workers: Vec<Worker> = (0..8)
        .map(|i| {
            Worker::new(format!("w{i}"))
                .with_skill("ct", "Normal", SkillValue::Active)
                .with_modifier(if i % 2 == 0 { 1.0 } else { 0.5 })
        })
        .collect();
    let balancer = Arc::new(Balancer::new(config, roster_on(workers, "ct", 7, 19)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let balancer = Arc::clone(&balancer);
            thread::spawn(move || {
                let mut committed = Vec::new();
                for i in 0..50 {
                    let mut request = AssignRequest::new(at(12), "Normal", "ct");
                    if (t + i) % 3 == 0 {
                        request = request.with_code("HEAVY");
                    }
                    let assignment = balancer.select_and_commit(&request).unwrap().unwrap();
                    committed.push(assignment.weight);
                }
                committed
            })
        })
        .collect();

    let weights: Vec<f64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(weights.len(), 400);

    let expected: f64 = weights.iter().sum();
    let ledger = balancer.ledger().unwrap();
    assert!((ledger.grand_total() - expected).abs() < 1e-9);

    let assignments: u64 = ledger.workers.values().map(|w| w.total.count).sum();
    assert_eq!(assignments, 400);
}
