use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    vgraph_engine::run().await
}
