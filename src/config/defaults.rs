//! Typed default configuration, the lowest figment layer.

use std::path::PathBuf;

use vgraph_domain::vocab;
use vgraph_reasoner::{InferenceCategory, Profile};
use vgraph_triple_store::TripleStoreManagerConfig;

use super::{ConfigRaw, ReasoningConfigRaw};
use crate::{
    logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig},
    services::{LifecycleConfig, LoaderConfig},
};

pub(crate) fn config() -> ConfigRaw {
    ConfigRaw {
        app_data_path: PathBuf::from("data"),
        triple_store: TripleStoreManagerConfig::default(),
        reasoning: ReasoningConfigRaw {
            profile: Profile::Dl.iri().to_string(),
            timeout_ms: 60_000,
            categories: InferenceCategory::defaults(),
        },
        loader: LoaderConfig {
            temporary_prefixes: vec!["urn:temp:".to_string()],
            artifact_namespace: "urn:vgraph:artifact:".to_string(),
            inferred_prefix: "urn:vgraph:inferred:".to_string(),
        },
        lifecycle: LifecycleConfig {
            containment_predicates: vec![
                vocab::CONTAINS.to_string(),
                vocab::ARTIFACT_HAS_TOP_OBJECT.to_string(),
            ],
        },
        schemas: Vec::new(),
        logger: LoggerConfig {
            level: "vgraph_engine=info,vgraph_triple_store=info,vgraph_reasoner=info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: TelemetryConfig {
            metrics: TelemetryMetricsConfig {
                enabled: false,
                bind_address: "127.0.0.1:9464".to_string(),
            },
        },
    }
}
