//! Command line parcel locator.
//!
//! Browses the TERYT hierarchy, lists cadastral regions of a municipality and
//! resolves parcels to map links.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dzialka::config::Config;
use dzialka::models::{sorted_by_name, AdminHierarchy};
use dzialka::teryt::load_hierarchy;
use dzialka::{LocatorError, ParcelResolver};

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Locate cadastral parcels through the ULDK registry")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TERYT administrative table, plain or .gz
    #[arg(long)]
    teryt: Option<PathBuf>,

    /// Directory of the persistent region cache
    #[arg(long)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the administrative hierarchy
    Tree {
        /// Only this voivodeship (e.g. 14)
        #[arg(long)]
        voivodeship: Option<String>,
    },

    /// List cadastral regions of a municipality (e.g. 146501_1)
    Regions { municipality_id: String },

    /// Resolve a parcel by full identifier or by number within a region
    Parcel {
        /// Parcel number (12/3) or full identifier (146501_1.0001.12/3)
        number: String,

        /// Region code (e.g. 146501_1.0001)
        #[arg(short, long)]
        region: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(path) = args.teryt {
        config.hierarchy.path = path;
    }
    if let Some(path) = args.cache {
        config.cache.path = Some(path);
    }

    match args.command {
        Command::Tree { voivodeship } => {
            let hierarchy = load_hierarchy(&config.hierarchy.path)?;
            print_tree(&hierarchy, voivodeship.as_deref())?;
        }
        Command::Regions { municipality_id } => {
            let resolver = ParcelResolver::from_config(&config)?;
            let regions = match resolver.regions(&municipality_id).await {
                Err(LocatorError::NotFound) => {
                    anyhow::bail!("Cannot find regions for {}", municipality_id)
                }
                other => other.context("Region lookup failed")?,
            };
            for region in regions {
                println!("{}\t{}", region.code, region.name);
            }
        }
        Command::Parcel { number, region } => {
            let resolver = ParcelResolver::from_config(&config)?;
            let parcel = match resolver.parcel(&number, region.as_deref()).await {
                Err(LocatorError::NotFound) => anyhow::bail!("Parcel {} not found", number),
                Err(LocatorError::InsufficientQuery) => anyhow::bail!(
                    "Not enough data: pass a full identifier or a number with --region"
                ),
                other => other.context("Parcel lookup failed")?,
            };
            println!("{}", serde_json::to_string_pretty(&parcel)?);
        }
    }

    Ok(())
}

fn print_tree(hierarchy: &AdminHierarchy, only: Option<&str>) -> Result<()> {
    let voivodeships = match only {
        Some(code) => vec![hierarchy
            .voivodeship(code)
            .with_context(|| format!("Unknown voivodeship {}", code))?],
        None => sorted_by_name(hierarchy.voivodeships()),
    };

    for voivodeship in voivodeships {
        println!("{} {}", voivodeship.code, voivodeship.name);
        for county in sorted_by_name(hierarchy.counties(voivodeship)) {
            println!("  {} {}", county.code, county.name);
            for municipality in sorted_by_name(hierarchy.municipalities(county)) {
                println!(
                    "    {} {}",
                    hierarchy.municipality_identifier(municipality),
                    municipality.name
                );
            }
        }
    }

    Ok(())
}
