mod db;
mod parser;
mod price;
mod settings;
mod source;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use parser::query::SearchQuery;
use parser::store::StoreStrategy;
use parser::{Run, Tally};
use settings::{Settings, Source};
use source::{HtmlPage, TextBlockSource};

#[derive(Parser)]
#[command(name = "price_scout", about = "Collect product listings for price comparison")]
struct Cli {
    /// Settings file (TOML); missing file means built-in defaults
    #[arg(short, long, global = true, default_value = "price_scout.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the products table
    Init,
    /// Search every configured source and save new listings
    Run {
        /// Product to search for
        #[arg(required = true)]
        product: Vec<String>,
        /// Only these source labels (repeatable)
        #[arg(long)]
        only: Vec<String>,
    },
    /// Extract listings from a saved page
    Ingest {
        /// Product the page was searched for
        #[arg(required = true)]
        product: Vec<String>,
        /// Source label to record, e.g. "Google Shopping"
        #[arg(short, long)]
        label: String,
        /// Saved HTML page
        #[arg(short, long)]
        file: PathBuf,
        /// Infer sellers from the text after each price
        #[arg(long)]
        aggregator: bool,
    },
    /// Saved listings, newest first
    List {
        /// Keep names containing this text (any case)
        #[arg(short, long)]
        filter: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Row counts per source
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Database ready at {:?}", settings.db_path);
            Ok(())
        }
        Commands::Run { product, only } => {
            let query = parse_query(&product)?;
            let sources: Vec<&Source> = settings
                .sources
                .iter()
                .filter(|s| {
                    only.is_empty() || only.iter().any(|o| s.label.eq_ignore_ascii_case(o))
                })
                .collect();
            if sources.is_empty() {
                println!("No configured source matches {:?}.", only);
                return Ok(());
            }
            search_sources(&settings, &query, &sources).await
        }
        Commands::Ingest {
            product,
            label,
            file,
            aggregator,
        } => {
            let query = parse_query(&product)?;
            let mut source = settings.source(&label).cloned().unwrap_or_else(|| Source {
                label: label.trim().to_string(),
                url: file.display().to_string(),
                store: StoreStrategy::default(),
            });
            if aggregator {
                source.store = StoreStrategy::Aggregator;
            }
            ingest_file(&settings, &query, &source, &file)
        }
        Commands::List {
            filter,
            limit,
            json,
        } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_products(&conn, filter.as_deref(), limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No products found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<16} | {:<40} | {:<14} | {:<20} | {:<19}",
                "No", "Source", "Name", "Price", "Store", "Observed"
            );
            println!("{}", "-".repeat(128));
            for r in &rows {
                println!(
                    "{:>4} | {:<16} | {:<40} | {:<14} | {:<20} | {:<19}",
                    r.no,
                    truncate(&r.source, 16),
                    truncate(&r.name, 40),
                    truncate(&r.price, 14),
                    truncate(&r.store, 20),
                    r.observed_at.chars().take(19).collect::<String>(),
                );
            }
            println!(
                "\n{} products for {}",
                rows.len(),
                filter.as_deref().unwrap_or("all names")
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:   {}", s.total);
            for (source, count) in &s.by_source {
                println!("  {:<24} {}", truncate(source, 24), count);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn parse_query(words: &[String]) -> anyhow::Result<SearchQuery> {
    match SearchQuery::parse(&words.join(" ")) {
        Some(q) => Ok(q),
        None => bail!("Product to search for must not be empty"),
    }
}

/// One source at a time, blocks in page order. A source that fails to load is skipped.
async fn search_sources(
    settings: &Settings,
    query: &SearchQuery,
    sources: &[&Source],
) -> anyhow::Result<()> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let client = source::build_client(settings)?;
    info!(terms = ?query.terms(), sources = sources.len(), "starting run");
    let mut sink = db::ProductSink::new(&conn)?;
    let mut run = Run::new(query);

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut total = Tally::default();
    let mut unreachable = 0usize;
    for src in sources {
        pb.set_message(src.label.clone());
        let url = src.url_for(query);
        match source::fetch_page(&client, &url).await {
            Ok(html) => {
                let page = HtmlPage::parse(&html);
                let tally = run.process_source(src, &page, &mut sink);
                pb.println(format!("{:<16} {}", truncate(&src.label, 16), tally.summary()));
                total += tally;
            }
            Err(e) => {
                warn!(source = %src.label, "{:#}", e);
                unreachable += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(unique = run.unique(), "run finished");
    println!("Total: {}", total.summary());
    if unreachable > 0 {
        println!("{} of {} sources could not be fetched.", unreachable, sources.len());
    }
    println!("Saved to {:?}", settings.db_path);
    Ok(())
}

fn ingest_file(
    settings: &Settings,
    query: &SearchQuery,
    source: &Source,
    file: &Path,
) -> anyhow::Result<()> {
    let html =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let page = HtmlPage::parse(&html);
    info!(
        "Parsed {:?}: {} text blocks, store strategy {:?}",
        file,
        page.text_blocks().len(),
        source.store
    );

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let mut sink = db::ProductSink::new(&conn)?;
    let mut run = Run::new(query);
    let tally = run.process_source(source, &page, &mut sink);
    println!("{}: {}", source.label, tally.summary());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
