use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "mdump",
    about = "Extract collections from mongodump archives.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show more log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(
        visible_alias = "x",
        about = "Write collections of an archive to <db>.<collection>.bson files"
    )]
    Extract(ExtractArgs),

    #[command(visible_aliases = ["l", "ls"], about = "List the collections declared in an archive")]
    List(ListArgs),
}

#[derive(Debug, clap::Args)]
#[command(after_help = "\
\x1b[1m\x1b[4mExamples:\x1b[0m
  mdump extract dump.archive
  mdump extract --db juju -d out/ dump.archive
  mdump extract --db juju --db logs dump.archive")]
pub struct ExtractArgs {
    /// Archive written by `mongodump --archive`
    pub archive: PathBuf,

    /// Output directory [default: current directory]
    #[arg(short = 'd', long = "dir")]
    pub output: Option<PathBuf>,

    /// Only extract collections of this database (repeatable)
    #[arg(long = "db", value_name = "NAME")]
    pub databases: Vec<String>,

    /// Skip CRC-64 verification against the archive's EOF headers
    #[arg(long)]
    pub no_checksum: bool,

    /// Suppress per-file output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Archive written by `mongodump --archive`
    pub archive: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
