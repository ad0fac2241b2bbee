// src/main.rs

use boot_k8s_cluster::{cli, logging, run};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = run(args).await {
        logging::ensure_default_logging();
        error!(error = %err, "failed to run pipeline");
        std::process::exit(err.exit_code());
    }
}
