//! Helpers shared by the workspace binaries: logging setup and build version.

mod build_info;
pub mod logging;
pub mod version;
