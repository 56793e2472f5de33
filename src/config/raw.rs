use std::{path::PathBuf, time::Duration};

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};
use vgraph_reasoner::{InferenceCategory, Profile};
use vgraph_triple_store::TripleStoreManagerConfig;

use crate::{
    config::ConfigError,
    logger::{LoggerConfig, TelemetryConfig},
    services::{LifecycleConfig, LoaderConfig, ReasoningConfig, SchemaSource},
};

/// Application paths derived from the root data directory.
///
/// ```text
/// {root}/
/// └── triple-store/
///     └── vgraph/     <- oxigraph store
/// ```
#[derive(Debug, Clone)]
pub(crate) struct AppPaths {
    pub triple_store: PathBuf,
}

impl AppPaths {
    pub(crate) fn from_root(root: PathBuf) -> Self {
        Self {
            triple_store: root.join("triple-store"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReasoningConfigRaw {
    /// OWL profile IRI, e.g. `http://www.w3.org/ns/owl-profile/DL`
    pub profile: String,
    pub timeout_ms: u64,
    pub categories: Vec<InferenceCategory>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub app_data_path: PathBuf,
    pub triple_store: TripleStoreManagerConfig,
    pub reasoning: ReasoningConfigRaw,
    pub loader: LoaderConfig,
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub schemas: Vec<SchemaSource>,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub app_data_path: PathBuf,
    pub triple_store: TripleStoreManagerConfig,
    pub reasoning: ReasoningConfig,
    pub loader: LoaderConfig,
    pub lifecycle: LifecycleConfig,
    pub schemas: Vec<SchemaSource>,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

impl ConfigRaw {
    pub(crate) fn resolve(self) -> Result<Config, ConfigError> {
        Ok(Config {
            app_data_path: self.app_data_path,
            triple_store: self.triple_store,
            reasoning: self.reasoning.resolve()?,
            loader: validate_loader(self.loader)?,
            lifecycle: validate_lifecycle(self.lifecycle)?,
            schemas: self.schemas,
            logger: self.logger,
            telemetry: self.telemetry,
        })
    }
}

impl ReasoningConfigRaw {
    fn resolve(self) -> Result<ReasoningConfig, ConfigError> {
        let profile: Profile = self
            .profile
            .parse()
            .map_err(|error| ConfigError::InvalidConfig(format!("reasoning.profile: {error}")))?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "reasoning.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(ReasoningConfig {
            profile,
            timeout: Duration::from_millis(self.timeout_ms),
            categories: self.categories,
        })
    }
}

fn validate_namespace(field: &str, namespace: &str) -> Result<(), ConfigError> {
    NamedNode::new(format!("{namespace}x"))
        .map(|_| ())
        .map_err(|error| ConfigError::InvalidConfig(format!("{field} '{namespace}': {error}")))
}

fn validate_loader(loader: LoaderConfig) -> Result<LoaderConfig, ConfigError> {
    validate_namespace("loader.artifact_namespace", &loader.artifact_namespace)?;
    validate_namespace("loader.inferred_prefix", &loader.inferred_prefix)?;
    if loader.temporary_prefixes.iter().any(String::is_empty) {
        return Err(ConfigError::InvalidConfig(
            "loader.temporary_prefixes must not contain empty prefixes".to_string(),
        ));
    }
    if loader
        .temporary_prefixes
        .iter()
        .any(|prefix| loader.artifact_namespace.starts_with(prefix.as_str()))
    {
        return Err(ConfigError::InvalidConfig(
            "loader.artifact_namespace must not start with a temporary prefix".to_string(),
        ));
    }
    Ok(loader)
}

fn validate_lifecycle(lifecycle: LifecycleConfig) -> Result<LifecycleConfig, ConfigError> {
    for predicate in &lifecycle.containment_predicates {
        NamedNode::new(predicate.as_str()).map_err(|error| {
            ConfigError::InvalidConfig(format!(
                "lifecycle.containment_predicates '{predicate}': {error}"
            ))
        })?;
    }
    Ok(lifecycle)
}
