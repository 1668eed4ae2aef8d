pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod sysctl;

pub use error::{HoststatError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
