use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use super::{Config, ConfigRaw, defaults};
use crate::config::ConfigError;

const ENV_PREFIX: &str = "VGRAPH_";

/// Loads configuration from layered sources (lowest to highest priority):
/// typed defaults, `config.toml` in the working directory, the file passed
/// with `--config`, then `VGRAPH_*` environment variables (`__` nests).
pub(crate) fn load_configuration(custom_config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = figment(custom_config_path)?
        .extract::<ConfigRaw>()
        .map_err(Box::new)?;

    tracing::debug!("Configuration loaded successfully");

    config.resolve()
}

fn figment(custom_config_path: Option<&Path>) -> Result<Figment, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(defaults::config()));

    if Path::new("config.toml").exists() {
        figment = figment.merge(Toml::file("config.toml"));
    }

    if let Some(config_path) = custom_config_path {
        if !config_path.exists() {
            return Err(ConfigError::MissingConfig(config_path.display().to_string()));
        }
        tracing::debug!(path = %config_path.display(), "Loading custom config file");
        figment = figment.merge(Toml::file(config_path));
    }

    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use figment::Jail;
    use vgraph_reasoner::Profile;
    use vgraph_triple_store::TripleStoreBackendType;

    use super::*;

    #[test]
    fn layers_file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    app_data_path = "/var/lib/vgraph"

                    [reasoning]
                    timeout_ms = 5000

                    [triple_store]
                    backend = "memory"
                "#,
            )?;
            jail.set_env("VGRAPH_REASONING__PROFILE", "EL");

            let config = load_configuration(None).map_err(|error| error.to_string())?;
            assert_eq!(config.app_data_path, Path::new("/var/lib/vgraph"));
            assert_eq!(config.reasoning.timeout, Duration::from_millis(5000));
            assert_eq!(config.reasoning.profile, Profile::El);
            assert_eq!(config.triple_store.backend, TripleStoreBackendType::Memory);
            Ok(())
        });
    }

    #[test]
    fn custom_file_overrides_working_directory_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[reasoning]\ntimeout_ms = 5000\n")?;
            jail.create_file("custom.toml", "[reasoning]\ntimeout_ms = 750\n")?;

            let config = load_configuration(Some(Path::new("custom.toml")))
                .map_err(|error| error.to_string())?;
            assert_eq!(config.reasoning.timeout, Duration::from_millis(750));
            Ok(())
        });
    }

    #[test]
    fn missing_custom_file_is_reported() {
        Jail::expect_with(|_| {
            let error = load_configuration(Some(Path::new("absent.toml")))
                .expect_err("missing file must fail");
            assert!(matches!(error, ConfigError::MissingConfig(_)));
            Ok(())
        });
    }
}
