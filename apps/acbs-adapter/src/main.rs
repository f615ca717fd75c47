//! ACBS Adapter Binary
//!
//! Connectivity check for an ACBS deployment: runs the IdP handshake and,
//! optionally, one classified GET.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin acbs-adapter -- [config-path] [probe-path]
//! ```
//!
//! - `config-path`: YAML configuration (default: `config.yaml`)
//! - `probe-path`: ACBS path to GET after authenticating, e.g.
//!   `/Portfolio/E1/Facility/0030000321`
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (overrides `observability.logging.level`)

use std::process::ExitCode;

use acbs_adapter::config::load_config;
use acbs_adapter::telemetry::init_tracing;
use acbs_adapter::{AcbsClient, ErrorClassifier, KnownErrorRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let probe_path = args.next();

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.observability.logging);

    match run(&config.acbs, probe_path.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ACBS connectivity check failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &acbs_adapter::AcbsConfig, probe_path: Option<&str>) -> anyhow::Result<()> {
    let client = AcbsClient::from_config(config)?;

    let mut operation = client.begin_operation().await?;
    tracing::info!("Obtained bearer token from the IdP");

    if let Some(path) = probe_path {
        let classifier = ErrorClassifier::read(
            format!("Failed to get {path} from ACBS."),
            KnownErrorRegistry::new(),
        );
        let response = operation.get(path, &classifier).await?;
        tracing::info!(
            path,
            status = %response.status(),
            bytes = response.body().len(),
            "Probe request succeeded"
        );
    }

    Ok(())
}
