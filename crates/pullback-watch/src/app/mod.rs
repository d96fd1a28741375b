//! Wiring of the watcher, the cluster client and the notifier.

mod check;
mod watch;

pub use check::run_check;
pub use watch::run_watch;
pub use watch::run_watch_with;
pub use watch::wait_and_notify;
pub use watch::Outcome;
