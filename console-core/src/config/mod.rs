//! Layered configuration loading.
//!
//! Settings come from a required YAML file in a `config/` directory, overlaid
//! by environment variables (`APP_SECTION__KEY=value`).

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "APP";

/// Locate the `config/` directory for a workspace member.
///
/// Works both when the process runs from the member directory and from the
/// workspace root.
pub fn config_directory(base_path: &Path, member: &str) -> PathBuf {
    if base_path.ends_with(member) {
        base_path.join("config")
    } else {
        base_path.join(member).join("config")
    }
}

/// Build settings from `<dir>/<base_file>` plus `APP_` environment overrides.
pub fn load_layered<T: DeserializeOwned>(
    directory: &Path,
    base_file: &str,
) -> Result<T, config::ConfigError> {
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(File::from(directory.join(base_file)).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Sample {
        api: SampleApi,
    }

    #[derive(Debug, Deserialize)]
    struct SampleApi {
        base_url: String,
        timeout_secs: u64,
    }

    #[test]
    fn test_config_directory_from_member() {
        let dir = config_directory(Path::new("/work/inventory-console"), "inventory-console");
        assert_eq!(dir, PathBuf::from("/work/inventory-console/config"));
    }

    #[test]
    fn test_config_directory_from_workspace_root() {
        let dir = config_directory(Path::new("/work"), "inventory-console");
        assert_eq!(dir, PathBuf::from("/work/inventory-console/config"));
    }

    #[test]
    fn test_load_layered_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("base.yaml")).unwrap();
        writeln!(file, "api:\n  base_url: \"http://localhost:3000/api\"\n  timeout_secs: 50").unwrap();

        let sample: Sample = load_layered(dir.path(), "base.yaml").unwrap();
        assert_eq!(sample.api.base_url, "http://localhost:3000/api");
        assert_eq!(sample.api.timeout_secs, 50);
    }

    #[test]
    fn test_load_layered_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Sample, _> = load_layered(dir.path(), "base.yaml");
        assert!(result.is_err());
    }
}
