use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use yolo_split::Args;

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Starting the split process...");

    match yolo_split::run(&args) {
        Ok((_, Some(stats))) if stats.failed_transfers > 0 => {
            error!(
                "Dataset split finished with {} failed transfers.",
                stats.failed_transfers
            );
            ExitCode::FAILURE
        }
        Ok(_) => {
            info!("Dataset splitting process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to split dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
