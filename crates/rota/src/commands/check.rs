use rota_telemetry::Paths;

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;

    let config = super::load_config(&paths)?;
    println!(
        "✓ {} ({} skills, {} modality factors, {} special tasks)",
        paths.config_file().display(),
        config.skill_weights.len(),
        config.modality_factors.len(),
        config.special_tasks.len()
    );

    let roster = super::load_roster(&paths)?;
    println!(
        "✓ {} ({} workers, {} shift windows)",
        paths.roster_file().display(),
        roster.workers.len(),
        roster.windows.len()
    );

    let ledger = super::load_ledger(&paths)?;
    let unknown: Vec<&String> = ledger
        .workers
        .keys()
        .filter(|id| roster.worker(id).is_none())
        .collect();
    if !unknown.is_empty() {
        println!("! ledger has counters for workers not on the roster: {unknown:?}");
    }

    Ok(())
}
