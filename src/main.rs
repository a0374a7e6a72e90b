use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;

use itam_sync::api::types::{AssetStatus, HardwareAssetQuery, SoftwareLicenseQuery};
use itam_sync::cache::CacheEvent;
use itam_sync::resources::keys;
use itam_sync::{logging, Config, Session};

#[derive(Parser, Debug)]
#[command(name = "itam-sync")]
#[command(about = "Query an IT asset management backend through the sync layer")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./itam-sync.yaml or $XDG_CONFIG_HOME/itam-sync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Override the API base URL
  #[arg(long)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Probe backend liveness
  Health,
  /// Poll health and print every change until interrupted
  Watch,
  /// List hardware assets
  Assets {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    /// in_stock, deployed, in_repair, retired or disposed
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    search: Option<String>,
  },
  /// Show one hardware asset
  Asset { id: u64 },
  /// List software licenses
  Licenses {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    search: Option<String>,
  },
  /// Show one software license
  License { id: u64 },
  /// License compliance summary
  Compliance,
  /// Licenses expiring soon
  Expiring {
    #[arg(long)]
    days: Option<u32>,
  },
  /// Assignments of a license
  Assignments { license_id: u64 },
  Users,
  Locations,
  Manufacturers,
  Categories,
  Publishers,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let _guard = logging::init(&config.logging)?;

  let session = Session::new(&config)?;
  let result = run(&session, args.command).await;
  session.end();
  result
}

async fn run(session: &Session, command: Command) -> Result<()> {
  match command {
    Command::Health => print(&session.health().check().await?),
    Command::Watch => watch(session).await,
    Command::Assets {
      page,
      limit,
      status,
      search,
    } => {
      let status = status.map(|s| parse_status(&s)).transpose()?;
      let query = HardwareAssetQuery {
        page,
        limit,
        status,
        search,
        ..Default::default()
      };
      print(&session.hardware().list(Some(&query)).await?)
    }
    Command::Asset { id } => match session.hardware().get(Some(id)).await? {
      Some(asset) => print(&asset),
      None => Err(eyre!("No asset selected")),
    },
    Command::Licenses {
      page,
      limit,
      search,
    } => {
      let query = SoftwareLicenseQuery {
        page,
        limit,
        search,
        ..Default::default()
      };
      print(&session.licenses().list(Some(&query)).await?)
    }
    Command::License { id } => match session.licenses().get(Some(id)).await? {
      Some(license) => print(&license),
      None => Err(eyre!("No license selected")),
    },
    Command::Compliance => print(&session.licenses().compliance_summary().await?),
    Command::Expiring { days } => print(&session.licenses().expiring(days).await?),
    Command::Assignments { license_id } => {
      print(&session.assignments().for_license(Some(license_id)).await?)
    }
    Command::Users => print(&session.lookups().users(None).await?),
    Command::Locations => print(&session.lookups().locations().await?),
    Command::Manufacturers => print(&session.lookups().manufacturers().await?),
    Command::Categories => print(&session.lookups().asset_categories().await?),
    Command::Publishers => print(&session.lookups().publishers().await?),
  }
}

async fn watch(session: &Session) -> Result<()> {
  let _subscription = session
    .cache()
    .subscribe(keys::health(), |key, event| match event {
      CacheEvent::FetchFailed(err) => eprintln!("{}: {}", key, err),
      other => eprintln!("{}: {:?}", key, other),
    });
  let health = session.health();
  let _monitor = session.monitor_health();

  tokio::signal::ctrl_c().await?;
  if let Some(last) = health.last_known() {
    print(&last)?;
  }
  Ok(())
}

fn parse_status(raw: &str) -> Result<AssetStatus> {
  serde_json::from_value(serde_json::Value::String(raw.to_string()))
    .map_err(|_| eyre!("Unknown asset status: {}", raw))
}

fn print<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
