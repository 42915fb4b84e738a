use chrono::Utc;
use rota_telemetry::{write_json_atomic, FileLock, Paths};

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let _lock = FileLock::acquire(&paths.lock_file())?;
    let mut ledger = super::load_ledger(&paths)?;
    let previous = ledger.grand_total();

    ledger.reset(Utc::now());
    write_json_atomic(&paths.ledger_file(), &ledger)?;

    println!("✓ Reset counters ({previous:.2} weighted assignments cleared)");
    Ok(())
}
