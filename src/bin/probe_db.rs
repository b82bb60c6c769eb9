use std::process::ExitCode;
use tracing::{error, info};
use tribute_wall::{
    config::RemoteConfig,
    diagnostics::{self, ProbeOutcome},
    remote::RestTable,
};

#[tokio::main]
async fn main() -> ExitCode {
    tribute_wall::init_environment();

    let config = match RemoteConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("cannot probe tribute table: {err}");
            return ExitCode::FAILURE;
        }
    };

    match diagnostics::probe(&RestTable::new(&config)).await {
        Ok(ProbeOutcome::Seeded(record)) => {
            info!(id = %record.id, "table was empty and has been seeded");
            ExitCode::SUCCESS
        }
        Ok(ProbeOutcome::Verified { before, after }) => {
            info!(
                before = before.candles,
                after = after.candles,
                "read/write path verified"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}
