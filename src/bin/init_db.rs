use std::process::ExitCode;
use tracing::error;
use tribute_wall::{config::RemoteConfig, diagnostics, remote::RestTable};

#[tokio::main]
async fn main() -> ExitCode {
    tribute_wall::init_environment();

    let config = match RemoteConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("cannot initialise tribute table: {err}");
            return ExitCode::FAILURE;
        }
    };

    match diagnostics::initialize(&RestTable::new(&config)).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("tribute table initialisation failed: {err}");
            ExitCode::FAILURE
        }
    }
}
