use std::env;
use std::process::ExitCode;

use traffic_signal_sim::error::{ControllerError, Result};
use traffic_signal_sim::{start_signal_controller, ControllerConfig, JunctionUploads};

async fn run(video1: &str, video2: &str) -> Result<()> {
    let config = ControllerConfig::from_env()?;
    let uploads = JunctionUploads::new(tokio::fs::read(video1).await?, tokio::fs::read(video2).await?);

    let (_plan, handle) = start_signal_controller(&config, &uploads, Vec::new()).await?;

    tokio::signal::ctrl_c().await?;
    println!("Stopping signal controller...");
    let state = handle.shutdown().await.map_err(ControllerError::from)?;
    log::info!("Stopped in {:?} with {}s remaining", state.stage(), state.remaining_seconds());
    Ok(())
}

fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("signal_controller_main")
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <junction1 video> <junction2 video>", program_name(&args));
        return ExitCode::FAILURE;
    }

    println!("Starting signal controller...");
    if let Err(e) = run(&args[1], &args[2]).await {
        eprintln!("Controller error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
