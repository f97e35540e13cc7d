use anyhow::Context;
use chunkstream::{ReadOptions, StreamAccess, WriteOptions};
use chunkstream_store::StoreConfig;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli.connection)?;
    tracing::debug!(host = %config.host, port = config.port, db = config.db, "connecting");
    let access = StreamAccess::connect(&config)
        .await
        .with_context(|| format!("cannot connect to {}:{}", config.host, config.port))?;

    match cli.command {
        Command::Put(args) => cmd_put(&access, args, &cli.format).await,
        Command::Get(args) => cmd_get(&access, args).await,
        Command::Meta(args) => cmd_meta(&access, args, &cli.format).await,
        Command::Delete(args) => {
            access.delete(&args.key).await?;
            println!("{} Deleted {}", "✓".green(), args.key.yellow());
            Ok(())
        }
        Command::Info(args) => cmd_info(&access, args, &cli.format).await,
    }
}

/// Config file first, then flag overrides.
pub fn resolve_config(args: &ConnectionArgs) -> anyhow::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(host) = &args.host { config.host = host.clone(); }
    if let Some(port) = args.port { config.port = port; }
    if let Some(db) = args.db { config.db = db; }
    Ok(config)
}

async fn cmd_put(access: &StreamAccess, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let options = WriteOptions { append: args.append, strict_appends: args.strict };
    let mut writer = access.create_write_stream(&args.key, options);
    match &args.file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open {}", path.display()))?;
            writer.copy_from(file, args.chunk_size).await?;
        }
        None => {
            writer.copy_from(tokio::io::stdin(), args.chunk_size).await?;
        }
    }
    let summary = writer.finish().await?;

    match format {
        OutputFormat::Json => println!("{}", json!({
            "key": args.key,
            "chunks": summary.chunks,
            "bytes": summary.bytes,
            "failed_appends": summary.failed_appends,
        })),
        OutputFormat::Text => {
            let verb = if args.append { "Appended" } else { "Wrote" };
            println!(
                "{} {} {} bytes in {} chunks to {}",
                "✓".green().bold(), verb, summary.bytes.to_string().bold(), summary.chunks, args.key.yellow()
            );
            if summary.failed_appends > 0 {
                println!("  {} {} chunks were not stored", "warning:".yellow().bold(), summary.failed_appends);
            }
        }
    }
    Ok(())
}

async fn cmd_get(access: &StreamAccess, args: GetArgs) -> anyhow::Result<()> {
    let mut reader = access.create_read_stream(&args.key, ReadOptions::from_index(args.start_index));
    let written = match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create {}", path.display()))?;
            reader.copy_to(&mut file).await?
        }
        None => reader.copy_to(&mut tokio::io::stdout()).await?,
    };
    // Chunk bytes may be on stdout, so status goes to stderr.
    eprintln!("{} Read {} bytes from {}", "✓".green(), written, args.key.yellow());
    Ok(())
}

async fn cmd_meta(access: &StreamAccess, args: MetaArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match args.action {
        MetaAction::Get { key } => match access.get_meta(&key).await? {
            Some(meta) => {
                let value = serde_json::Value::Object(meta);
                match format {
                    OutputFormat::Json => println!("{value}"),
                    OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&value)?),
                }
            }
            None => anyhow::bail!("no stream named {key}"),
        },
        MetaAction::Set { key, json } => {
            let data: serde_json::Value = serde_json::from_str(&json).context("metadata is not valid JSON")?;
            if !access.set_meta(&key, &data).await? {
                anyhow::bail!("no stream named {key}");
            }
            println!("{} Metadata set on {}", "✓".green(), key.yellow());
        }
    }
    Ok(())
}

async fn cmd_info(access: &StreamAccess, args: InfoArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let meta = access.get_meta(&args.key).await?;
    let chunks = access.chunk_count(&args.key).await?;
    match format {
        OutputFormat::Json => println!("{}", json!({
            "key": args.key,
            "exists": meta.is_some(),
            "chunks": chunks,
            "meta": meta,
        })),
        OutputFormat::Text => {
            println!("Stream {}", args.key.yellow().bold());
            match meta {
                Some(meta) => {
                    println!("  Exists: {}", "yes".green());
                    println!("  Chunks: {}", chunks.to_string().bold());
                    if let Some(created) = meta.get("created") {
                        println!("  Created: {}", created.to_string().cyan());
                    }
                    let extra = meta.keys().filter(|k| k.as_str() != "created").count();
                    println!("  Metadata fields: {extra}");
                }
                None => println!("  Exists: {}", "no".red()),
            }
        }
    }
    Ok(())
}
