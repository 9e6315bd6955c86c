//! rustselfcite - Google Scholar self-citation analyzer
//!
//! ## Usage
//!
//! ```bash
//! rustselfcite "https://scholar.google.com/citations?user=XXXX" --max-citations 20 --output results.json
//! rustselfcite cookies import < cookies.json
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rustselfcite::analyzer::truncate_title;
use rustselfcite::cookies::CookieStore;
use rustselfcite::snapshot::{save_details_csv, JsonSnapshotWriter, SnapshotSink};
use rustselfcite::{analyze_profile, AnalysisOptions, ClientOptions, ProfileResult, ScholarClient};
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Analyze self-citations on a Google Scholar profile
#[derive(Parser)]
#[command(name = "rustselfcite")]
#[command(version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Cookie file (default: ~/.scholar_selfcite_cookies.json)
    #[arg(long, global = true)]
    cookie_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Google Scholar profile URL
    url: Option<String>,

    /// Maximum number of papers to analyze (0 = no limit)
    #[arg(long)]
    max_papers: Option<usize>,

    /// Maximum number of citations to check per paper (0 = no limit)
    #[arg(long)]
    max_citations: Option<usize>,

    /// Output file for detailed results (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pause on CAPTCHAs so they can be solved by hand
    #[arg(long)]
    visible: bool,

    /// Save a partial snapshot every N papers
    #[arg(long, default_value_t = rustselfcite::config::DEFAULT_SNAPSHOT_EVERY)]
    snapshot_every: usize,

    /// Proxy URL (e.g., http://127.0.0.1:7890)
    #[arg(long, env = "SCHOLAR_PROXY")]
    proxy: Option<String>,

    /// Mirror site URL
    #[arg(long, env = "SCHOLAR_MIRROR")]
    mirror: Option<String>,

    /// Also export the self-citation list as CSV
    #[arg(long)]
    details_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cookies
    Cookies {
        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Subcommand)]
enum CookieAction {
    /// Clear stored cookies
    Clear,
    /// Show cookie file path
    Path,
    /// Import a JSON cookie array exported from a browser (read from stdin)
    Import,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Cookies { action }) => handle_cookies(action, cli.cookie_file),
        None => run_analysis(cli.analyze, cli.cookie_file).await,
    }
}

// ============================================================================
// Analysis
// ============================================================================

async fn run_analysis(args: AnalyzeArgs, cookie_path: Option<PathBuf>) -> Result<()> {
    let url = args
        .url
        .context("Missing profile URL (e.g. https://scholar.google.com/citations?user=XXXX)")?;

    let mut client_options = ClientOptions {
        proxy: args.proxy,
        interactive: args.visible,
        cookie_path,
        ..Default::default()
    };
    if let Some(mirror) = args.mirror {
        client_options.base_url = mirror;
    }
    let client = ScholarClient::new(client_options).context("Failed to initialize Scholar client")?;

    let options = AnalysisOptions {
        max_papers: args.max_papers,
        max_citations_per_paper: args.max_citations,
        snapshot_every: args.snapshot_every,
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with partial results");
            on_interrupt.cancel();
        }
    });

    let writer = args.output.clone().map(JsonSnapshotWriter::new);
    let sink = writer.as_ref().map(|w| w as &dyn SnapshotSink);

    let outcome = analyze_profile(&client, &url, &options, sink, &cancel).await;
    let result = outcome.result;

    print_summary(&result);

    if let Some(writer) = writer.as_ref().filter(|_| outcome.saved) {
        println!("\nDetailed results saved to: {}", writer.output_path().display());
    }
    if let Some(path) = &args.details_csv {
        save_details_csv(path, &result.self_citation_details)
            .context("Failed to write self-citation CSV")?;
        println!("Self-citation list saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(result: &ProfileResult) {
    println!("\n======= RESULTS =======");
    println!("Author: {}", result.author.name);
    if let Some(affiliation) = &result.author.affiliation {
        println!("Affiliation: {}", affiliation);
    }
    println!(
        "Papers analyzed: {} of {}",
        result.analyzed_papers, result.total_papers
    );
    println!("Total citations: {}", result.total_citations);
    println!("Self-citations: {}", result.self_citations);
    println!(
        "Self-citation percentage: {:.2}%",
        result.self_citation_percentage
    );

    let details = &result.self_citation_details;
    if details.is_empty() {
        return;
    }

    println!("\nSelf-citation examples (first 5):");
    for (i, detail) in details.iter().take(5).enumerate() {
        println!("{}. Original: {}", i + 1, truncate_title(&detail.original_paper, 50));
        println!("   Citing: {}", truncate_title(&detail.citing_paper, 50));
    }
    if details.len() > 5 {
        println!("\n... and {} more self-citations", details.len() - 5);
    }
}

// ============================================================================
// Cookie Management
// ============================================================================

fn handle_cookies(action: CookieAction, path: Option<PathBuf>) -> Result<()> {
    let store = match path {
        Some(path) => CookieStore::with_path(path),
        None => CookieStore::new()?,
    };

    match action {
        CookieAction::Clear => {
            store.clear()?;
            println!("Cookies cleared.");
        }
        CookieAction::Path => {
            println!("Cookie file: {}", store.path().display());
        }
        CookieAction::Import => {
            eprintln!("Paste cookies as a JSON array, then end input (Ctrl-D):");
            eprintln!("Format: [{{\"name\":\"NID\",\"value\":\"xxx\",\"domain\":\".google.com\"}},...]");

            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read cookies from stdin")?;
            if input.trim().is_empty() {
                println!("No cookies provided. You can create the cookie file manually at:");
                println!("{}", store.path().display());
                return Ok(());
            }

            let count = store.import(&input).context("Invalid cookie JSON")?;
            println!("Successfully saved {} cookies to {}", count, store.path().display());
        }
    }

    Ok(())
}
