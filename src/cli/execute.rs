use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vgraph_domain::DocumentIdentity;
use vgraph_triple_store::ManagementGraph;

use super::{Cli, CliCommand, Input};
use crate::{bootstrap, error::AppError, services::ArtifactLifecycleManager};

/// Identity as printed on stdout.
#[derive(Debug, Serialize)]
struct IdentityOutput<'a> {
    document_iri: &'a str,
    version_iri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    inferred_iri: Option<&'a str>,
}

impl<'a> From<&'a DocumentIdentity> for IdentityOutput<'a> {
    fn from(identity: &'a DocumentIdentity) -> Self {
        Self {
            document_iri: identity.document_iri(),
            version_iri: identity.version_iri(),
            inferred_iri: identity.inferred_iri(),
        }
    }
}

pub(crate) async fn execute(cli: Cli) -> Result<(), AppError> {
    let core = bootstrap::build_core(cli.config_path.as_deref()).await?;
    tracing::debug!(
        data_path = %core.config.app_data_path.display(),
        schemas = core.schemas.len(),
        "Engine ready"
    );
    run_command(&core.services.lifecycle, cli.command).await
}

async fn run_command(
    lifecycle: &ArtifactLifecycleManager,
    command: CliCommand,
) -> Result<(), AppError> {
    match command {
        CliCommand::Load { input, format } => {
            let data = read_input(&input).await?;
            let identity = lifecycle.load_new(&data, &format).await?;
            write_json(&IdentityOutput::from(&identity)).await
        }
        CliCommand::Get {
            document_iri,
            version_iri,
            include_inferred,
            format,
        } => {
            let document = match version_iri {
                Some(version_iri) => {
                    lifecycle
                        .get_version(&document_iri, &version_iri, include_inferred, &format)
                        .await?
                }
                None => lifecycle.get(&document_iri, include_inferred, &format).await?,
            };
            write_stdout(&document.data).await
        }
        CliCommand::Edit {
            document_iri,
            input,
            format,
            mode,
            allow_dangling,
        } => {
            let data = read_input(&input).await?;
            let identity = lifecycle
                .edit(&document_iri, &data, &format, mode, allow_dangling)
                .await?;
            write_json(&IdentityOutput::from(&identity)).await
        }
        CliCommand::Delete {
            document_iri,
            format,
        } => {
            let snapshot = lifecycle.delete(&document_iri, &format).await?;
            tracing::info!(
                document = %snapshot.document.identity,
                versions = snapshot.versions.len(),
                management_graph = %snapshot.graph,
                "Deleted; printing last version"
            );
            write_stdout(&snapshot.document.data).await
        }
        CliCommand::List { graph } => {
            let identities = lifecycle.list(graph).await?;
            let output: Vec<IdentityOutput<'_>> =
                identities.iter().map(IdentityOutput::from).collect();
            write_json(&ListOutput { graph, documents: output }).await
        }
    }
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    graph: ManagementGraph,
    documents: Vec<IdentityOutput<'a>>,
}

async fn read_input(input: &Input) -> Result<Vec<u8>, AppError> {
    match input {
        Input::Stdin => {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .map_err(|source| AppError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(data)
        }
        Input::File(path) => tokio::fs::read(path).await.map_err(|source| AppError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

async fn write_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut rendered = serde_json::to_vec_pretty(value)
        .map_err(|error| AppError::Usage(format!("Failed to render output: {error}")))?;
    rendered.push(b'\n');
    write_stdout(&rendered).await
}

async fn write_stdout(data: &[u8]) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    let result = async {
        stdout.write_all(data).await?;
        stdout.flush().await
    }
    .await;
    result.map_err(|source| AppError::Io {
        path: "<stdout>".to_string(),
        source,
    })
}
