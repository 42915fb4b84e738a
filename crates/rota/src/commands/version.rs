pub fn run() -> anyhow::Result<()> {
    println!("rota {}", env!("CARGO_PKG_VERSION"));
    println!("Skill-aware least-loaded work assignment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        let result = run();
        assert!(result.is_ok());
    }
}
