//! shopsearch: hybrid catalog search from the command line or over HTTP.
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use shopsearch_cli::http::{self, SearchReply};
use shopsearch_hybrid::{SearchRequest, SearchService};

#[derive(Parser)]
#[command(name = "shopsearch")]
#[command(author, version, about = "Hybrid TF-IDF + embedding search over a product catalog", long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to ./config.toml plus RUST_ENV overlay)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /search and GET /health
    Serve {
        /// Overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one search and print the results
    Query {
        text: String,

        #[arg(short, long)]
        rows: Option<i64>,

        /// RRF rank offset
        #[arg(short, long)]
        alpha: Option<f32>,

        #[arg(long)]
        no_sparse: bool,

        #[arg(long)]
        no_dense: bool,

        /// Return the dense (or sparse) list as is instead of fusing
        #[arg(long)]
        no_rerank: bool,

        /// Print the HTTP response body instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build the indexes and report what is available
    Inspect,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    shopsearch_cli::init_logging(cli.verbose);

    let config = shopsearch_cli::load_config(cli.config.as_deref()).map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    let service = shopsearch_cli::build_service(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(settings.server.host);
            let port = port.unwrap_or(settings.server.port);
            let service = Arc::new(service);
            let caps = service.warm_up();
            tracing::info!(sparse = caps.sparse_available, dense = caps.dense_available, "indexes warmed up");
            tokio::runtime::Runtime::new()?.block_on(http::serve(service, &format!("{host}:{port}")))?;
        }
        Commands::Query { text, rows, alpha, no_sparse, no_dense, no_rerank, json } => {
            let request = SearchRequest {
                rows,
                alpha,
                use_sparse: !no_sparse,
                use_dense: !no_dense,
                use_rerank: !no_rerank,
                ..SearchRequest::new(text)
            };
            run_query(&service, &request, json)?;
        }
        Commands::Inspect => {
            let stats = service.stats();
            println!("catalog items:  {}", stats.catalog_items);
            println!("vocabulary:     {}", stats.vocabulary);
            println!("sparse:         {}", availability(stats.capabilities.sparse_available));
            println!("dense:          {}", availability(stats.capabilities.dense_available));
            if let (Some(embedder), Some(dim)) = (stats.embedder, stats.dense_dim) {
                println!("embedder:       {embedder} ({dim} dims)");
            }
        }
    }
    Ok(())
}

fn run_query(service: &SearchService, request: &SearchRequest, json: bool) -> anyhow::Result<()> {
    let response = service.search(request)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&SearchReply::from(response))?);
        return Ok(());
    }
    println!("{} result(s) for \"{}\" [{:?}]", response.count, response.query, response.mode);
    for hit in &response.results {
        println!("{:>3}. {:<6} {:<32} {:>8.2}  score={:.4}", hit.rank, hit.id(), hit.item.title, hit.item.price, hit.score);
    }
    for note in &response.notes {
        println!("note: {note}");
    }
    Ok(())
}

fn availability(available: bool) -> &'static str { if available { "available" } else { "unavailable" } }
