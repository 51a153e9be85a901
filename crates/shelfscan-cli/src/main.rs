mod commands;
mod wiring;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Search a product catalog and look up product pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the catalog and print matching products as JSON
    Search {
        /// Search text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Drop products priced above this amount
        #[arg(long)]
        max_price: Option<Decimal>,
        /// Maximum number of products to return
        #[arg(long, default_value_t = shelfscan_core::query::DEFAULT_MAX_RESULTS)]
        max_results: usize,
        /// Number of listing pages to walk (configured default when omitted)
        #[arg(long)]
        page_budget: Option<u32>,
        /// Restrict the search to a catalog category slug
        #[arg(long)]
        category: Option<String>,
        /// Return only the single cheapest product
        #[arg(long)]
        cheapest: bool,
    },
    /// Fetch one product page and print its details as JSON
    Detail {
        /// Product URL, absolute or relative to the catalog
        url: String,
    },
    /// Manage the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    /// Remove every expired cache entry
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = shelfscan_core::load_app_config()?;

    // Logs go to stderr; stdout carries only JSON.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            text,
            max_price,
            max_results,
            page_budget,
            category,
            cheapest,
        } => {
            let mut query = shelfscan_core::SearchQuery::new(text.join(" "))
                .with_max_results(max_results);
            query.max_price = max_price;
            query.page_budget = page_budget;
            query.category = category;
            query.cheapest = cheapest;
            commands::run_search(&config, &query).await
        }
        Commands::Detail { url } => commands::run_detail(&config, &url).await,
        Commands::Cache {
            command: CacheCommands::Purge,
        } => commands::run_cache_purge(&config).await,
    }
}
