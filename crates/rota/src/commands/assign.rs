use chrono::Utc;
use rota_core::AssignRequest;
use rota_telemetry::{write_json_atomic, FileLock, Paths};

use crate::cli::AssignArgs;

fn build_request(args: &AssignArgs) -> AssignRequest {
    let mut request = AssignRequest::new(
        args.at.unwrap_or_else(Utc::now),
        args.skill.clone(),
        args.modality.clone(),
    );
    request.strict = args.strict;
    request.code = args.code.clone();
    request.special_task = args.task.clone();
    request
}

pub fn run(args: &AssignArgs) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    // held from ledger load until the ledger is persisted
    let _lock = FileLock::acquire(&paths.lock_file())?;
    let balancer = super::open_balancer(&paths)?;

    let request = build_request(args);
    match balancer.select_and_commit(&request)? {
        Some(assignment) => {
            write_json_atomic(&paths.ledger_file(), &balancer.ledger()?)?;
            println!("{}", serde_json::to_string_pretty(&assignment)?);
        }
        None => {
            let output = serde_json::json!({
                "status": "no_candidate",
                "skill": request.skill,
                "modality": request.modality,
                "strict": request.strict,
                "timestamp": request.timestamp,
            });
            println!("{output}");
        }
    }
    Ok(())
}
