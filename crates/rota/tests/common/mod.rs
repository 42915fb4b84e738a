#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rota_core::{Config, FallbackChain, Ledger, Roster, ShiftWindow, SkillValue, Worker};

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, hour, 0, 0).unwrap()
}

/// Unit weights everywhere so ledger totals equal assignment counts
pub fn sample_config() -> Config {
    let mut config = Config::new();
    for skill in ["Normal", "Notfall", "Herz", "Chest"] {
        config.skill_weights.insert(skill.to_string(), 1.0);
    }
    for modality in ["ct", "mr", "xray"] {
        config.modality_factors.insert(modality.to_string(), 1.0);
    }
    config
}

/// `sample_config` plus Herz -> [Notfall, Normal] and xray -> ct -> mr
pub fn chained_config() -> Config {
    let mut config = sample_config();
    config.skill_fallback.insert(
        "Herz".to_string(),
        FallbackChain::Sequential(vec![FallbackChain::parallel(["Notfall", "Normal"])]),
    );
    config
        .modality_fallback
        .insert("xray".to_string(), FallbackChain::sequence(["ct", "mr"]));
    config
}

pub fn active(id: &str, modality: &str, skills: &[&str]) -> Worker {
    skills.iter().fold(Worker::new(id), |worker, skill| {
        worker.with_skill(modality, skill, SkillValue::Active)
    })
}

/// Every worker on shift for `modality` from `start` to `end`
pub fn roster_on(workers: Vec<Worker>, modality: &str, start: u32, end: u32) -> Roster {
    let windows = workers
        .iter()
        .map(|w| ShiftWindow::new(w.id.clone(), modality, at(start), at(end)))
        .collect();
    Roster { workers, windows }
}

pub fn ledger_with(entries: &[(&str, &str, &str, f64)]) -> Ledger {
    let mut ledger = Ledger::new();
    for (worker, skill, modality, weight) in entries {
        ledger.commit(worker, skill, modality, *weight);
    }
    ledger
}
