mod import;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "storesync-cli")]
#[command(about = "storesync operational command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import the Shopify catalog into a storefront partition.
    Import {
        /// Target storefront partition.
        #[arg(long)]
        storefront: String,
        /// Page size for the Admin product listing (max 250).
        #[arg(long, default_value_t = 250)]
        limit: u32,
        /// Print what would be imported without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Storefront partition management.
    Storefronts {
        #[command(subcommand)]
        command: StorefrontCommands,
    },
}

#[derive(Debug, Subcommand)]
enum StorefrontCommands {
    /// Print the enumerated storefront partitions.
    List,
    /// Provision a storefront partition (idempotent).
    Create { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = storesync_core::load_app_config()?;
    let pool_config = storesync_db::PoolConfig::from_app_config(&config);
    let pool = storesync_db::connect_pool(&config.database_url, pool_config).await?;
    storesync_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Import {
            storefront,
            limit,
            dry_run,
        } => {
            import::run_import(&pool, &config, &storefront, limit, dry_run).await?;
        }
        Commands::Storefronts { command } => match command {
            StorefrontCommands::List => {
                for name in
                    storesync_db::list_storefronts(&pool, &config.default_storefront).await
                {
                    println!("{name}");
                }
            }
            StorefrontCommands::Create { name } => {
                storesync_db::create_storefront(&pool, &name).await?;
                println!("storefront '{name}' ready");
            }
        },
    }

    Ok(())
}
