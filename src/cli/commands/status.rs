//! Status command - inspect the cached copy of a script

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::commands::{cache_dir, resolve_source};
use crate::config::Config;
use crate::error::LoaderResult;
use crate::source::SourceIdentity;
use crate::store::{read_entry, CacheKeys, CachedEntry, FileStore};
use console::style;
use std::path::Path;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> LoaderResult<()> {
    let source = resolve_source(&args.target, config)?;
    let dir = cache_dir(args.cache_dir, config);

    // Read-only: a missing cache directory is just an empty cache
    let store = FileStore::existing(&dir);
    let entry = read_entry(&store, &CacheKeys::for_source(&source));

    match args.format {
        OutputFormat::Text => print_text(&source, &dir, entry.as_ref()),
        OutputFormat::Json => print_json(&source, &dir, entry.as_ref())?,
    }

    Ok(())
}

fn print_text(source: &SourceIdentity, dir: &Path, entry: Option<&CachedEntry>) {
    println!("{}", style(source.to_string()).bold());
    match entry {
        Some(entry) => {
            println!("  {} {}", style("version:").dim(), style(&entry.version).cyan());
            println!("  {} {} bytes", style("size:").dim(), entry.code.len());
        }
        None => println!("  {}", style("not cached").yellow()),
    }
    println!("  {} {}", style("cache:").dim(), dir.display());
}

fn print_json(source: &SourceIdentity, dir: &Path, entry: Option<&CachedEntry>) -> LoaderResult<()> {
    #[derive(serde::Serialize)]
    struct StatusJson<'a> {
        owner: &'a str,
        repo: &'a str,
        file: &'a str,
        branch: &'a str,
        cached: bool,
        version: Option<&'a str>,
        size: Option<usize>,
        cache_dir: String,
    }

    let status = StatusJson {
        owner: source.owner(),
        repo: source.repo(),
        file: source.file(),
        branch: source.branch(),
        cached: entry.is_some(),
        version: entry.map(|e| e.version.as_str()),
        size: entry.map(|e| e.code.len()),
        cache_dir: dir.display().to_string(),
    };

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
