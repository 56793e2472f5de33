//! Command line surface: argument parsing and command dispatch.

mod execute;

use std::{ffi::OsString, path::PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command};
pub(crate) use execute::execute;
use vgraph_domain::EditMode;
use vgraph_triple_store::ManagementGraph;

const DEFAULT_FORMAT: &str = "text/turtle";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cli {
    pub config_path: Option<PathBuf>,
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    Load {
        input: Input,
        format: String,
    },
    Get {
        document_iri: String,
        version_iri: Option<String>,
        include_inferred: bool,
        format: String,
    },
    Edit {
        document_iri: String,
        input: Input,
        format: String,
        mode: EditMode,
        allow_dangling: bool,
    },
    Delete {
        document_iri: String,
        format: String,
    },
    List {
        graph: ManagementGraph,
    },
}

/// Where a payload is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn from_arg(value: &str) -> Self {
        if value == "-" {
            Input::Stdin
        } else {
            Input::File(PathBuf::from(value))
        }
    }
}

fn command() -> Command {
    let format = Arg::new("format")
        .short('f')
        .long("format")
        .value_name("MEDIA_TYPE")
        .default_value(DEFAULT_FORMAT)
        .help("Serialization format, e.g. text/turtle or application/n-quads");
    let document = Arg::new("document")
        .value_name("DOCUMENT_IRI")
        .required(true)
        .help("Document IRI");
    let input = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .required(true)
        .help("Payload file, or - for stdin");

    Command::new("vgraph-engine")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Versioned graph document store with consistency checks and inference")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Sets a custom config file (.toml format)"),
        )
        .subcommand(
            Command::new("load")
                .about("Load a new artifact document")
                .arg(input.clone())
                .arg(format.clone()),
        )
        .subcommand(
            Command::new("get")
                .about("Print the current (or an explicit) version of a document")
                .arg(document.clone())
                .arg(
                    Arg::new("version-iri")
                        .long("version-iri")
                        .value_name("VERSION_IRI")
                        .help("Explicit version instead of the current one"),
                )
                .arg(
                    Arg::new("inferred")
                        .long("inferred")
                        .action(ArgAction::SetTrue)
                        .help("Include the inferred graph"),
                )
                .arg(format.clone()),
        )
        .subcommand(
            Command::new("edit")
                .about("Apply a fragment and publish a new version")
                .arg(document.clone())
                .arg(input)
                .arg(format.clone())
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_parser(["merge", "replace"])
                        .default_value("merge"),
                )
                .arg(
                    Arg::new("allow-dangling")
                        .long("allow-dangling")
                        .action(ArgAction::SetTrue)
                        .help("Publish even if objects are left uncontained"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a document and print its last version")
                .arg(document)
                .arg(format),
        )
        .subcommand(
            Command::new("list")
                .about("List current documents of a management graph")
                .arg(
                    Arg::new("graph")
                        .long("graph")
                        .value_parser(["artifact", "schema"])
                        .default_value("artifact"),
                ),
        )
}

pub(crate) fn parse() -> Result<Cli, clap::Error> {
    parse_from(std::env::args_os())
}

pub(crate) fn parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);

    let command = match matches.subcommand() {
        Some(("load", sub)) => CliCommand::Load {
            input: Input::from_arg(&string(sub, "input")),
            format: string(sub, "format"),
        },
        Some(("get", sub)) => CliCommand::Get {
            document_iri: string(sub, "document"),
            version_iri: sub.get_one::<String>("version-iri").cloned(),
            include_inferred: sub.get_flag("inferred"),
            format: string(sub, "format"),
        },
        Some(("edit", sub)) => CliCommand::Edit {
            document_iri: string(sub, "document"),
            input: Input::from_arg(&string(sub, "input")),
            format: string(sub, "format"),
            mode: match string(sub, "mode").as_str() {
                "replace" => EditMode::Replace,
                _ => EditMode::Merge,
            },
            allow_dangling: sub.get_flag("allow-dangling"),
        },
        Some(("delete", sub)) => CliCommand::Delete {
            document_iri: string(sub, "document"),
            format: string(sub, "format"),
        },
        Some(("list", sub)) => CliCommand::List {
            graph: match string(sub, "graph").as_str() {
                "schema" => ManagementGraph::Schema,
                _ => ManagementGraph::Artifact,
            },
        },
        _ => {
            return Err(command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required",
            ));
        }
    };

    Ok(Cli {
        config_path,
        command,
    })
}

fn string(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn parses_edit_with_global_config() {
        let cli = parse_from([
            "vgraph-engine",
            "edit",
            "http://example.org/doc",
            "--input",
            "fragment.ttl",
            "--mode",
            "replace",
            "--allow-dangling",
            "-c",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(cli.config_path, Some(PathBuf::from("custom.toml")));
        assert_eq!(
            cli.command,
            CliCommand::Edit {
                document_iri: "http://example.org/doc".to_string(),
                input: Input::File(PathBuf::from("fragment.ttl")),
                format: DEFAULT_FORMAT.to_string(),
                mode: EditMode::Replace,
                allow_dangling: true,
            }
        );
    }

    #[test]
    fn parses_load_from_stdin() {
        let cli = parse_from(["vgraph-engine", "load", "-i", "-", "-f", "application/n-triples"]).unwrap();
        assert_eq!(
            cli.command,
            CliCommand::Load {
                input: Input::Stdin,
                format: "application/n-triples".to_string(),
            }
        );
        assert!(cli.config_path.is_none());
    }

    #[test]
    fn list_defaults_to_artifacts() {
        let cli = parse_from(["vgraph-engine", "list"]).unwrap();
        assert_eq!(
            cli.command,
            CliCommand::List {
                graph: ManagementGraph::Artifact
            }
        );
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(
            parse_from(["vgraph-engine", "edit", "http://example.org/doc", "-i", "f.ttl", "--mode", "upsert"])
                .is_err()
        );
    }
}
