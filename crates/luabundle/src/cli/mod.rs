use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub(crate) mod bundle;
pub(crate) mod config;

pub use self::bundle::BundleCommand;

#[derive(Debug, Clone, Subcommand)]
pub enum CliSubcommand {
    Bundle(BundleCommand),
}

/// Luabundle, a bundler for Lua scripts and the modules they require
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    subcommand: CliSubcommand,
}

impl Cli {
    pub fn new() -> Self {
        Self::parse()
    }

    pub async fn run(self) -> Result<ExitCode> {
        match self.subcommand {
            CliSubcommand::Bundle(cmd) => cmd.run().await,
        }
    }
}
