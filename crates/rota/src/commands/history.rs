use rota_telemetry::{read_jsonl, Paths, UsageRecord, UsageStats};

pub fn run(stats: bool, limit: usize) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let records: Vec<UsageRecord> = read_jsonl(&paths.usage_log())?;

    if records.is_empty() {
        println!("No usage history found.");
        return Ok(());
    }

    if stats {
        let summary = UsageStats::from_records(&records);
        println!("Usage statistics:");
        println!("  Assignments: {}", summary.total);
        println!("  Weighted total: {:.2}", summary.weighted_total);
        println!(
            "  Overflow: {} ({:.1}%)",
            summary.overflow,
            summary.overflow_pct()
        );
        println!("\nPer worker:");
        for (worker, count) in &summary.per_worker {
            println!("  {worker}: {count}");
        }
        println!("\nPer modality:");
        for (modality, count) in &summary.per_modality {
            println!("  {modality}: {count}");
        }
    } else {
        let start = records.len().saturating_sub(limit);
        for record in &records[start..] {
            println!(
                "{}  {:<12} {}/{}  w={:.2}{}",
                record.timestamp.format("%Y-%m-%d %H:%M"),
                record.worker_id,
                record.skill_used,
                record.modality_used,
                record.weight,
                if record.overflow { "  overflow" } else { "" }
            );
        }
    }

    Ok(())
}
