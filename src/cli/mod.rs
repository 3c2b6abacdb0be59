//! Operator CLI.
//!
//! The upload engine is driven by the enclosing application, so the CLI
//! deliberately exposes no delivery loop. It manages the config file and
//! lets an HQ operator inspect the retrieval catalog for their account.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldpost::config::{default_config_path, FieldpostConfig};
use fieldpost::model::AccountId;
use fieldpost::protocol::RemoteClient;
use fieldpost::retrieve::{CellValue, Column, RetrievalCatalog};

#[derive(Parser)]
#[command(name = "fieldpost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulletin delivery client", long_about = None)]
pub struct Cli {
    /// Path to config file (default: platform data dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default config file
    InitConfig,

    /// List the bulletins field offices have designated for an HQ account
    Catalog {
        /// HQ account id (hex public key)
        #[arg(long)]
        hq: String,
    },
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(default_config_path);

    match cli.command {
        Commands::InitConfig => {
            FieldpostConfig::create_default(&config_path)?;
            println!("Wrote {}", config_path.display());
            Ok(())
        }
        Commands::Catalog { hq } => {
            let config = FieldpostConfig::load(&config_path)?;
            init_tracing(&config.logging.level);

            let Some(server) = &config.server else {
                return Err("no [server] configured; edit the config file first".into());
            };
            let client = RemoteClient::new(&server.address);
            let mut catalog = RetrievalCatalog::initialize(client, AccountId(hq)).await;

            println!("{} bulletin(s) retrievable", catalog.row_count());
            for row in 0..catalog.row_count() {
                let title = cell_text(&mut catalog, row, Column::Title as usize).await;
                let author = cell_text(&mut catalog, row, Column::Author as usize).await;
                let size = catalog.size_at(row).unwrap_or(0);
                let verified = if catalog.is_unverifiable(row) {
                    " [unverified]"
                } else {
                    ""
                };
                println!("{row:>4}  {size:>10}  {author}  {title}{verified}");
            }
            Ok(())
        }
    }
}

async fn cell_text<C: fieldpost::protocol::ProtocolClient>(
    catalog: &mut RetrievalCatalog<C>,
    row: usize,
    column: usize,
) -> String {
    match catalog.value_at(row, column).await {
        Ok(CellValue::Text(text)) => text,
        _ => String::new(),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
