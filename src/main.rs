use anyhow::Result;
use clap::Parser;

use invest_scout::generator::workflow::{RunStatus, launch};
use invest_scout::{cli, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    telemetry::init_tracing(args.trace, args.trace_json);
    let config = args.into_config()?;

    match launch(&config).await {
        Ok(outcome) => {
            let state = &outcome.state;
            match outcome.status {
                RunStatus::Reported => {
                    println!(
                        "✅ completed: recommend (score {})",
                        state.score.unwrap_or(0)
                    );
                    if let Some(path) = &state.artifacts.report_path {
                        println!("📄 report: {}", path.display());
                    }
                }
                RunStatus::Declined => {
                    println!(
                        "⏹️ completed: {} (no decision-worthy candidate, score {})",
                        state.decision.unwrap_or_default(),
                        state.score.unwrap_or(0)
                    );
                }
            }
            if let Some(path) = &state.artifacts.graph_path {
                println!("🗺️ graph: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ failed: {:#}", e);
            Err(e)
        }
    }
}
