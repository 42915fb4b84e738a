use chrono::{DateTime, Utc};
use rota_telemetry::Paths;

pub fn run(at: Option<DateTime<Utc>>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let balancer = super::open_balancer(&paths)?;
    let now = at.unwrap_or_else(Utc::now);

    let ledger = balancer.ledger()?;
    let report = balancer.load_report(now)?;
    let on_shift = report.iter().filter(|w| !w.on_shift.is_empty()).count();

    let output = serde_json::json!({
        "at": now,
        "last_reset": ledger.last_reset,
        "on_shift": on_shift,
        "total_weighted": ledger.grand_total(),
        "workers": report,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
