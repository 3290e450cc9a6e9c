use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use traffic_signal_sim::config::ENV_RESULT_PATH;
use traffic_signal_sim::flow_analyzer::{build_analysis_document, write_analysis_document};
use traffic_signal_sim::global_variables::RESULT_FILE_NAME;

fn parse_density(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("traffic_analyzer_main")
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let densities = match args.as_slice() {
        [_, d1, d2] => parse_density(d1).zip(parse_density(d2)),
        _ => None,
    };
    let Some((density1, density2)) = densities else {
        eprintln!("Usage: {} <junction1 density> <junction2 density>", program_name(&args));
        return ExitCode::FAILURE;
    };

    println!("Starting traffic analyzer...");
    let path = env::var(ENV_RESULT_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(RESULT_FILE_NAME));
    let document = build_analysis_document(density1, density2);

    if let Err(e) = write_analysis_document(&path, &document).await {
        eprintln!("Analyzer error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
