use anyhow::Result;
use clap::Parser;
use pullback_watch::app;
use pullback_watch::app::Outcome;
use pullback_watch::config::Cli;
use pullback_watch::config::Commands;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    utils::logging::init(cli.log_format);

    match cli.command {
        Commands::Watch(watch_args) => {
            tracing::info!("Starting pullback-watch {}", &**version::VERSION);
            match app::run_watch(*watch_args).await? {
                Outcome::Notified(recovery) => {
                    tracing::info!(cycle = recovery.cycle, "Watch finished");
                }
                Outcome::Interrupted => {
                    tracing::info!("Watch interrupted");
                }
            }
        }
        Commands::Check(check_args) => {
            app::run_check(check_args).await?;
        }
    }

    Ok(())
}
