mod bootstrap;
mod cli;
mod config;
mod error;
mod logger;
mod managers;
mod services;

#[cfg(test)]
mod tests;

use std::process::ExitCode;

pub use error::{ErrorKind, LifecycleError};
pub use services::{
    ArtifactLifecycleManager, ArtifactSnapshot, LifecycleConfig, LoaderConfig, LoaderError,
    ReasoningConfig, SchemaSource, SerializedDocument,
};

/// Parses the command line, runs one command and maps the outcome to an
/// exit code. Failures are printed to stderr as JSON.
pub async fn run() -> ExitCode {
    let cli = match cli::parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(2));
        }
    };

    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "Command failed");
            eprintln!("{}", error.to_json());
            ExitCode::FAILURE
        }
    }
}
