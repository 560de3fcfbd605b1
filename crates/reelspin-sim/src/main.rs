use tracing_subscriber::EnvFilter;

use reelspin_reel::PhysicsConfig;
use reelspin_sim::{RunOptions, run};
use reelspin_wheel::config::WheelConfig;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = RunOptions::from_args(std::env::args().skip(1));
    tracing::info!(?options, "Reelspin simulation starting");

    let summary = match run(&options, PhysicsConfig::load(), WheelConfig::load()) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        },
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("Failed to serialize summary: {e}");
            std::process::exit(1);
        },
    }
}
