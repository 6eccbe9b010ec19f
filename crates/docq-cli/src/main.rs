use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docq_config::DocqConfig;
use docq_query::DocService;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "docq", version, about = "Query package documentation registries")]
struct Cli {
    /// Config file (defaults to `DOCQ_CONFIG_PATH`, then `docq.toml` in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the documentation of an object
    Lookup(PathArgs),
    /// Show superclasses, mixins and children of an object
    Hierarchy(PathArgs),
    /// Show where an object is defined
    Source(PathArgs),
    /// Fuzzy search object paths in a package (or the active one)
    Search(SearchArgs),
    /// List installed packages
    Packages,
    /// Print registry cache statistics
    Stats,
}

#[derive(Args)]
struct PathArgs {
    /// Fully qualified object path, e.g. `Net::HTTP#get`
    path: String,
}

#[derive(Args)]
struct SearchArgs {
    query: String,
    /// Package to search (made active); all installed packages when omitted and none is active
    #[arg(long, short)]
    package: Option<String>,
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn load_config(path: Option<&PathBuf>) -> Result<(DocqConfig, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let config = DocqConfig::load_from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            Ok((config, Some(path.clone())))
        }
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            Ok(docq_config::load_for_dir(&cwd)?)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let (config, config_path) = load_config(cli.config.as_ref())?;
    docq_config::init_tracing(&config.logging);
    tracing::debug!(
        target: "docq.cli",
        config = ?config_path,
        root = %config.docs.root().display(),
        "starting"
    );
    let service = DocService::from_config(&config)?;

    match cli.command {
        Command::Lookup(args) => {
            let Some(doc) = service.lookup(&args.path)? else {
                return not_found(&args.path);
            };
            if cli.json {
                print_json(&doc)?;
            } else {
                match &doc.signature {
                    Some(signature) => println!("{} ({})", doc.path, signature),
                    None => println!("{}", doc.path),
                }
                println!("  package: {}", doc.package);
                println!("  kind: {}", label(&doc.kind)?);
                if !doc.docstring.is_empty() {
                    println!();
                    for chunk in service.docstring_chunks(&doc) {
                        print!("{chunk}");
                    }
                    println!();
                }
            }
            Ok(0)
        }
        Command::Hierarchy(args) => {
            let Some(hierarchy) = service.hierarchy(&args.path)? else {
                return not_found(&args.path);
            };
            if cli.json {
                print_json(&hierarchy)?;
            } else {
                println!("{} ({})", hierarchy.path, hierarchy.package);
                for ancestor in &hierarchy.ancestors {
                    match &ancestor.package {
                        Some(package) => println!("  < {} ({package})", ancestor.path),
                        None => println!("  < {} (not installed)", ancestor.path),
                    }
                }
                for mixin in &hierarchy.mixins {
                    println!("  includes {mixin}");
                }
                for child in &hierarchy.children {
                    println!("  - {child}");
                }
            }
            Ok(0)
        }
        Command::Source(args) => {
            let Some(location) = service.source_location(&args.path)? else {
                return not_found(&args.path);
            };
            if cli.json {
                print_json(&location)?;
            } else {
                println!("{}:{}", location.file, location.line);
            }
            Ok(0)
        }
        Command::Search(args) => {
            let hits = service.search(&args.query, args.limit, args.package.as_deref())?;
            if cli.json {
                print_json(&hits)?;
            } else {
                for hit in &hits {
                    println!("{}\t{}\t{}", hit.path, hit.package, label(&hit.kind)?);
                }
            }
            Ok(if hits.is_empty() { 1 } else { 0 })
        }
        Command::Packages => {
            let packages = service.list_packages();
            if cli.json {
                print_json(&packages)?;
            } else {
                for package in &packages {
                    println!("{} {}", package.name, package.version);
                }
            }
            Ok(0)
        }
        Command::Stats => {
            let report = service.cache_stats();
            if cli.json {
                print_json(&report)?;
            } else {
                println!("cache:");
                println!("  size: {}/{}", report.stats.size, report.stats.capacity);
                println!(
                    "  memory: {} / {} bytes ({:.1}%)",
                    report.stats.memory_usage_bytes,
                    report.stats.memory_budget_bytes,
                    report.usage_ratio * 100.0
                );
                println!("  pressure: {}", report.pressure);
                println!("  indexed packages: {}", report.indexed_packages);
            }
            Ok(0)
        }
    }
}

fn not_found(path: &str) -> Result<i32> {
    eprintln!("no documentation found for `{path}`");
    Ok(1)
}

/// Serialized name of a unit enum variant.
fn label<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(name) => Ok(name),
        other => Ok(other.to_string()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
