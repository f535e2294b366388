//! Shared utilities

pub mod config;
pub mod context;
pub mod log;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::GlobalContext;
pub use log::LogSink;
pub use process::ProcessBuilder;
pub use shell::Shell;
