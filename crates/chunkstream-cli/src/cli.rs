use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chunkstream",
    about = "Store and retrieve chunked byte streams in Redis",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Store connection settings. Flags override the config file.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// TOML file with host/port/db/username/password
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub host: Option<String>,
    #[arg(long, global = true)]
    pub port: Option<u16>,
    #[arg(long, global = true)]
    pub db: Option<u32>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a stream from a file or stdin
    Put(PutArgs),
    /// Read a stream to a file or stdout
    Get(GetArgs),
    /// Read or replace stream metadata
    Meta(MetaArgs),
    /// Delete a stream and its metadata
    Delete(DeleteArgs),
    /// Show whether a stream exists, its chunk count and metadata
    Info(InfoArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    /// Input file (stdin if omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Add chunks after the existing ones instead of replacing the stream
    #[arg(long)]
    pub append: bool,
    /// Fail on the first rejected chunk append
    #[arg(long)]
    pub strict: bool,
    /// Bytes per chunk (0 uses the library default)
    #[arg(long, default_value = "65536")]
    pub chunk_size: usize,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, default_value = "0")]
    pub start_index: u64,
}

#[derive(Args)]
pub struct MetaArgs {
    #[command(subcommand)]
    pub action: MetaAction,
}

#[derive(Subcommand)]
pub enum MetaAction {
    Get { key: String },
    Set { key: String, json: String },
}

#[derive(Args)]
pub struct DeleteArgs {
    pub key: String,
}

#[derive(Args)]
pub struct InfoArgs {
    pub key: String,
}
