use clap::{Parser, Subcommand};
use utils::logging::LogFormat;
use utils::version;

use crate::config::watch::CheckArgs;
use crate::config::watch::WatchArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, env = "PULLBACK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wait until the deployment recovers from ImagePullBackOff, then notify
    Watch(Box<WatchArgs>),
    /// Poll once and list the pods currently in ImagePullBackOff
    Check(CheckArgs),
}
