use anyhow::Context;
use clap::Parser;
use sw_cli::{init_logging, Cli};
use sw_search::Orchestrator;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.run_config();
    let orchestrator = Orchestrator::new(sw_estimators::default_registry());
    let summary = orchestrator
        .run(&config)
        .with_context(|| format!("grid search {} failed", config.search_file.display()))?;

    match &summary.aggregate {
        Some(path) => tracing::info!(
            "Done: {} trained, {} skipped, results in {}.",
            summary.trained,
            summary.skipped,
            path.display()
        ),
        None => tracing::info!("Dry run complete: {} models planned.", summary.total),
    }
    Ok(())
}
