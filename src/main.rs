//! steamdata - Steam profile lookup with a local SQLite store
//!
//! Main entry point for the steamdata CLI.

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;
use steamapi::steam_id;
use steamdata::config::SteamDataConfig;
use steamdata::models::SteamProfile;
use steamdata::store::{ProfileStore, SqliteProfileStore, StoreConfig};
use steamdata::{DataAccess, SteamDataError};
use tokio_util::sync::CancellationToken;

/// steamdata - Steam profiles served from a local store, fetched on first use
#[derive(Parser, Debug)]
#[command(name = "steamdata")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/steamdata/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Steam Web API developer key to store in the config
        #[arg(long, env = "STEAM_API_KEY")]
        key: Option<String>,
    },

    /// Show profiles, fetching unknown ones from Steam
    Profile {
        /// 64-bit or 32-bit Steam ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List stored profiles from a country (ISO 3166 code)
    Country { code: String },

    /// List stored profile ids
    Ids,

    /// Convert between 32-bit and 64-bit Steam ids
    Convert { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = steamdata::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> steamdata::Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(SteamDataConfig::default_path);

    if let Commands::Init { key } = &cli.command {
        return init_config(&config_path, key.clone());
    }

    let mut config = if config_path.exists() {
        SteamDataConfig::load(&config_path)?
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        SteamDataConfig::new()
    };
    if let Some(db) = cli.database {
        config.database.path = db;
    }

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Profile { ids } => {
            let ids = ids
                .iter()
                .map(|s| steam_id::parse_id64(s))
                .collect::<Result<Vec<_>, _>>()?;
            show_profiles(&config, &ids, cli.json).await
        }
        Commands::Country { code } => {
            let store = SqliteProfileStore::new(StoreConfig::from(&config.database))?;
            let profiles = store.profiles_by_country(&code.to_uppercase()).await?;
            print_profiles(&profiles, cli.json)
        }
        Commands::Ids => {
            let store = SqliteProfileStore::new(StoreConfig::from(&config.database))?;
            let mut ids = store.profile_ids().await?;
            ids.sort_unstable();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                println!("{} stored profiles", ids.len());
                for id in ids {
                    println!("  {}", id);
                }
            }
            Ok(())
        }
        Commands::Convert { id } => {
            let id64 = steam_id::parse_id64(&id)?;
            let id32 = steam_id::to_32(id64);
            if cli.json {
                println!("{}", serde_json::json!({ "id64": id64, "id32": id32 }));
            } else {
                println!("id64: {}", id64);
                println!("id32: {}", id32);
            }
            Ok(())
        }
    }
}

fn init_config(path: &Path, key: Option<String>) -> steamdata::Result<()> {
    if path.exists() {
        return Err(SteamDataError::Config(format!(
            "Config already exists: {}",
            path.display()
        )));
    }

    let mut config = SteamDataConfig::new();
    config.steam.developer_key = key;
    config.save(path)?;

    println!("Wrote {}", path.display());
    Ok(())
}

async fn show_profiles(config: &SteamDataConfig, ids: &[u64], json: bool) -> steamdata::Result<()> {
    let data = DataAccess::open(config).await?;

    // Ctrl-C aborts in-flight downloads and skips the store write
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, cancelling");
            on_signal.cancel();
        }
    });

    let profiles = data.steam().get_profiles(ids, &token).await?;
    let requested = ids.iter().collect::<HashSet<_>>().len();
    if profiles.len() < requested && !json {
        eprintln!(
            "{} of {} ids were not found on Steam",
            requested - profiles.len(),
            requested
        );
    }
    print_profiles(&profiles, json)
}

fn print_profiles(profiles: &[SteamProfile], json: bool) -> steamdata::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(profiles)?);
        return Ok(());
    }

    for p in profiles {
        println!("{} ({})", p.persona_name, p.id64);
        println!("  id32:       {}", p.id32());
        if let Some(code) = &p.country_code {
            println!("  country:    {}", code);
        }
        if let Some(created) = p.created_at() {
            println!("  created:    {}", created.format("%Y-%m-%d"));
        }
        println!("  visibility: {:?}", p.visibility());
        println!("  state:      {:?}", p.persona());
        println!("  avatar:     {} bytes", p.avatar_full_bytes.len());
    }
    Ok(())
}
