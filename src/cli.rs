use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Housekeeper - declarative schema management for ClickHouse
#[derive(Parser, Debug)]
#[command(name = "housekeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project directory containing housekeeper.yaml
    #[arg(short = 'C', long, default_value = ".", global = true)]
    pub project: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the plan against the live server and write a migration
    Diff {
        /// Print the plan without writing a migration file
        #[arg(long)]
        dry_run: bool
    },

    /// Apply pending migrations, resuming any partial run
    Migrate,

    /// Show migration status: local files against recorded revisions
    Status,

    /// Rewrite schema files in canonical form
    Fmt {
        /// Only report files that are not canonical; do not rewrite
        #[arg(long)]
        check: bool,

        /// Files to format; defaults to the configured schema entrypoint
        paths: Vec<PathBuf>
    },

    /// Verify the housekeeper.sum chain against the migrations directory
    Verify
}
