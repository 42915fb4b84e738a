pub mod assign;
pub mod check;
pub mod history;
pub mod init;
pub mod reset;
pub mod status;
pub mod version;

use anyhow::Context;
use rota_core::{Balancer, Config, JsonlUsageLog, Ledger, Roster};
use rota_telemetry::{read_json, Paths};

pub(crate) fn load_config(paths: &Paths) -> anyhow::Result<Config> {
    let path = paths.config_file();
    if !path.exists() {
        anyhow::bail!(
            "{} not found. Run `rota init` or set ROTA_HOME.",
            path.display()
        );
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Config::from_json_str(&content).with_context(|| format!("loading {}", path.display()))
}

pub(crate) fn load_roster(paths: &Paths) -> anyhow::Result<Roster> {
    let path = paths.roster_file();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no roster, nobody is on shift");
        return Ok(Roster::new());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Roster::from_json_str(&content).with_context(|| format!("loading {}", path.display()))
}

pub(crate) fn load_ledger(paths: &Paths) -> anyhow::Result<Ledger> {
    let path = paths.ledger_file();
    let ledger: Option<Ledger> =
        read_json(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(ledger.unwrap_or_default())
}

/// Engine over the files in the data directory, logging usage to `usage.jsonl`
pub(crate) fn open_balancer(paths: &Paths) -> anyhow::Result<Balancer> {
    let mut balancer = Balancer::with_ledger(
        load_config(paths)?,
        load_roster(paths)?,
        load_ledger(paths)?,
    )?;
    balancer.add_sink(Box::new(JsonlUsageLog::new(paths.usage_log())));
    Ok(balancer)
}
