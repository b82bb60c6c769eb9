use std::{path::PathBuf, process::ExitCode};
use tracing::error;
use tribute_wall::{build_info, config};

#[tokio::main]
async fn main() -> ExitCode {
    tribute_wall::init_environment();

    let dist_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("dist"));

    match build_info::package(&dist_dir, &config::environment_label()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("packaging failed: {err}");
            ExitCode::FAILURE
        }
    }
}
