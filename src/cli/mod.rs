use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "A multi-user RSS/Atom aggregation service", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the aggregation service until interrupted
    Serve,
    /// Run one sync cycle across all feeds, then exit
    Update,
    /// Run one retention sweep, then exit
    Sweep,
}
