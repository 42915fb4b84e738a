use rota_core::{Config, Roster};
use rota_telemetry::{write_json_atomic, Paths};

pub fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    std::fs::create_dir_all(paths.home())?;

    let config_path = paths.config_file();
    if config_path.exists() && !force {
        println!("- {} exists, keeping it (use --force to overwrite)", config_path.display());
    } else {
        write_json_atomic(&config_path, &Config::starter())?;
        println!("✓ Wrote starter config to {}", config_path.display());
    }

    let roster_path = paths.roster_file();
    if roster_path.exists() && !force {
        println!("- {} exists, keeping it", roster_path.display());
    } else {
        write_json_atomic(&roster_path, &Roster::new())?;
        println!("✓ Wrote empty roster to {}", roster_path.display());
    }

    println!("\nNext: add workers and shift windows to roster.json, then run `rota check`.");
    Ok(())
}
