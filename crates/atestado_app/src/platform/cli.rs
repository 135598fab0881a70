use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "atestado",
    version,
    about = "Submit legal documents for graph extraction and drive the RDF, inference and import steps"
)]
pub struct Cli {
    /// RON configuration file (defaults to ./atestado.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the processing backend
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory where downloaded artifacts are saved
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Delay between task status queries
    #[arg(long, global = true)]
    pub poll_interval: Option<humantime::Duration>,

    /// Also write logs to ./atestado.log
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Process a PDF or Word document, then export, infer and import
    Run {
        /// Document to process
        file: PathBuf,

        /// Last step to perform
        #[arg(long, value_enum, default_value_t = Step::Import)]
        stop_after: Step,
    },
    /// Generate RDF from a previously saved graph JSON
    Export {
        /// Graph JSON saved by an earlier run
        #[arg(long)]
        graph: PathBuf,
    },
    /// Run inference on a previously saved graph JSON
    Infer {
        /// Graph JSON saved by an earlier run
        #[arg(long)]
        graph: PathBuf,

        /// Import the inferred turtle into the graph store afterwards
        #[arg(long)]
        import: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Step {
    Process,
    Export,
    Infer,
    Import,
}
