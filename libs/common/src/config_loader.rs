//! Configuration loading helper functions
//!
//! Values are layered with priority: CLI overrides > ENV > config file > defaults.

use std::path::Path;

use errors::{config_error, LoadTestError, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

/// Supported config file formats, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(config_error!(
                "unsupported config file extension: {} (expected .yaml, .yml, .toml or .json)",
                path.display()
            )),
        }
    }
}

/// Load a configuration struct from layered sources
///
/// # Arguments
/// * `defaults` - Built-in default values (lowest priority)
/// * `file` - Optional config file; it must exist when given
/// * `env_prefix` - Environment variable prefix, e.g. `MBLOAD_`
/// * `overrides` - Explicit values (highest priority); serialize unset fields
///   as absent (`skip_serializing_if = "Option::is_none"`) so they do not mask
///   lower layers
pub fn load_layered<T, O>(
    defaults: &T,
    file: Option<&Path>,
    env_prefix: &str,
    overrides: &O,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    O: Serialize,
{
    let mut figment = Figment::from(Serialized::defaults(defaults));

    if let Some(path) = file {
        if !path.is_file() {
            return Err(config_error!("config file not found: {}", path.display()));
        }

        figment = match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => figment.merge(Yaml::file(path)),
            ConfigFormat::Toml => figment.merge(Toml::file(path)),
            ConfigFormat::Json => figment.merge(Json::file(path)),
        };
        info!("Using config file {}", path.display());
    }

    debug!("Reading environment overrides with prefix {}", env_prefix);
    figment = figment
        .merge(Env::prefixed(env_prefix))
        .merge(Serialized::defaults(overrides));

    figment
        .extract()
        .map_err(|e| LoadTestError::Configuration(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        host: String,
        port: u16,
        verbose: bool,
    }

    #[derive(Debug, Default, Serialize)]
    struct SampleOverrides {
        #[serde(skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
    }

    fn defaults() -> Sample {
        Sample {
            host: "localhost".to_string(),
            port: 502,
            verbose: true,
        }
    }

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_only() {
        let loaded: Sample = load_layered(
            &defaults(),
            None,
            "CFG_TEST_DEFAULTS_",
            &SampleOverrides::default(),
        )
        .unwrap();
        assert_eq!(loaded, defaults());
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let file = write_file(".yaml", "host: plc.local\nport: 1502\n");
        let loaded: Sample = load_layered(
            &defaults(),
            Some(file.path()),
            "CFG_TEST_YAML_",
            &SampleOverrides::default(),
        )
        .unwrap();
        assert_eq!(loaded.host, "plc.local");
        assert_eq!(loaded.port, 1502);
        assert!(loaded.verbose);
    }

    #[test]
    fn test_toml_file() {
        let file = write_file(".toml", "verbose = false\n");
        let loaded: Sample = load_layered(
            &defaults(),
            Some(file.path()),
            "CFG_TEST_TOML_",
            &SampleOverrides::default(),
        )
        .unwrap();
        assert!(!loaded.verbose);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_file(".json", r#"{"port": 1502}"#);
        std::env::set_var("CFG_TEST_ENV_PORT", "2502");
        let loaded: Sample = load_layered(
            &defaults(),
            Some(file.path()),
            "CFG_TEST_ENV_",
            &SampleOverrides::default(),
        )
        .unwrap();
        std::env::remove_var("CFG_TEST_ENV_PORT");
        assert_eq!(loaded.port, 2502);
    }

    #[test]
    fn test_explicit_overrides_win() {
        std::env::set_var("CFG_TEST_CLI_HOST", "from-env");
        let overrides = SampleOverrides {
            host: Some("from-cli".to_string()),
            port: None,
        };
        let loaded: Sample =
            load_layered(&defaults(), None, "CFG_TEST_CLI_", &overrides).unwrap();
        std::env::remove_var("CFG_TEST_CLI_HOST");
        assert_eq!(loaded.host, "from-cli");
        assert_eq!(loaded.port, 502);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result: Result<Sample> = load_layered(
            &defaults(),
            Some(Path::new("/nonexistent/mbload.yaml")),
            "CFG_TEST_MISSING_",
            &SampleOverrides::default(),
        );
        assert!(matches!(result, Err(LoadTestError::Configuration(_))));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(ConfigFormat::from_path(Path::new("config.ini")).is_err());
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.YML")).unwrap(),
            ConfigFormat::Yaml
        );
    }

    #[test]
    fn test_bad_value_is_configuration_error() {
        let file = write_file(".yaml", "port: not-a-number\n");
        let result: Result<Sample> = load_layered(
            &defaults(),
            Some(file.path()),
            "CFG_TEST_BAD_",
            &SampleOverrides::default(),
        );
        assert!(matches!(result, Err(LoadTestError::Configuration(_))));
    }
}
