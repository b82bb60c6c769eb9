use std::process::ExitCode;
use tracing::error;
use tribute_wall::{config::RemoteConfig, diagnostics, remote::RestTable};

#[tokio::main]
async fn main() -> ExitCode {
    tribute_wall::init_environment();

    let config = match RemoteConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("cannot check tribute table: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Query failures are reported but do not fail the process.
    if let Err(err) = diagnostics::check(&RestTable::new(&config)).await {
        error!("tribute table query failed: {err}");
    }
    ExitCode::SUCCESS
}
