pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoststat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NetBSD host statistics exporter with Prometheus metrics", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Configuration file (JSON or YAML)")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run one collection cycle and print the metrics")]
    Scrape {
        #[arg(short, long, help = "Write the exposition to a file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, value_name = "COLLECTOR", help = "Enable a collector by name")]
        enable: Vec<String>,

        #[arg(long, value_name = "COLLECTOR", help = "Disable a collector by name")]
        disable: Vec<String>,
    },
    #[command(about = "Scrape repeatedly until interrupted")]
    Watch {
        #[arg(short, long, help = "Scrape interval in seconds")]
        interval: Option<u64>,
    },
    #[command(about = "List collectors and their enabled state")]
    List,
}
