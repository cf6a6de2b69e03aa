use std::path::Path;

use super::types::AppConfig;

/// Load configuration from `./maestro.toml` when present, falling back to
/// defaults.
pub fn load_default() -> anyhow::Result<AppConfig> {
    let local_config = Path::new("maestro.toml");
    if local_config.exists() {
        load_from_path(local_config)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let raw = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&raw)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_from_an_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[executor]\nmax_in_flight = 9").unwrap();
        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.executor.max_in_flight, 9);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "executor = nonsense").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }
}
