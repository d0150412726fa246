use clap::{Parser, Subcommand};
use common::RunMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carousel")]
#[command(about = "Coffee Carousel - pairs subscribers up for a coffee")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Use the production tables and send real notifications
    #[arg(long, global = true)]
    pub deploy: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "CAROUSEL_CONFIG", default_value = "carousel.yaml")]
    pub config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the carousel once (default)
    Spin,

    /// Validate configuration without touching any table
    ///
    /// With `--deploy`, also require resolved mail credentials.
    Validate,

    /// Write a configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "carousel.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run; a bare `carousel` spins
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Spin)
    }

    pub fn run_mode(&self) -> RunMode {
        RunMode::from_deploy_flag(self.deploy)
    }

    /// Default log filter directive
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            configured
        }
    }
}
