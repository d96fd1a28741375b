pub mod backoff;
pub mod selector;
pub mod watcher;
