mod config;
mod data;
mod display;
mod monitoring;
mod selection;
mod viewer;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use config::{Config, EnvConfig};
use data::images::ImageUrls;
use data::stats_api::{standing_for, StatsApiClient};
use data::types::TeamId;
use display::summary;
use monitoring::metrics::PollMetrics;
use viewer::access::AccessGate;
use viewer::commands::{Command, CommandError};
use viewer::controller::{Viewer, ViewerEvent, ViewerSettings};
use viewer::preferences::PreferenceStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, value_name = "PATH", default_value = "config.toml")]
    /// Configuration file
    config: String,

    #[arg(long, value_name = "KEY")]
    /// Access key for live game detail on a public host
    access_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow live games (default)
    Watch,
    /// List all teams
    Teams,
    /// Show followed teams
    Favorites,
    /// Follow or unfollow a team
    Toggle { team_id: TeamId },
    /// Standings for one team
    Standings { team_id: TeamId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env(&EnvConfig::load());
    if let Some(key) = cli.access_key {
        config.access.key = Some(key);
    }

    monitoring::logger::init(&config.logging.level)?;

    let client = Arc::new(StatsApiClient::new(
        &config.api.base_url,
        config.api.sport_id,
        config.request_timeout(),
    )?);
    let store = PreferenceStore::new(&config.storage.database_path)?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch(config, client, store).await?,
        Commands::Teams => {
            let teams = client.fetch_teams().await?;
            print!("{}", summary::teams_list(&teams, &store.load_favorites()?));
        }
        Commands::Favorites => {
            let teams = client.fetch_teams().await.unwrap_or_else(|e| {
                warn!(error = %e, "Team catalog unavailable, showing ids");
                Vec::new()
            });
            let images = ImageUrls::new(&config.api.logo_base_url, &config.api.headshot_base_url);
            print!("{}", summary::followed_teams(&store.load_favorites()?, &teams, &images));
        }
        Commands::Toggle { team_id } => {
            let favorites = store.load_favorites()?;
            if !favorites.contains(team_id) && favorites.is_full() {
                println!("Already following 3 teams, remove one first");
            } else {
                let updated = favorites.toggle(team_id);
                store.save_favorites(&updated)?;
                println!("{}", summary::favorites_line(&updated, &[]));
            }
        }
        Commands::Standings { team_id } => {
            let season = Utc::now().year();
            let standings = client.fetch_standings(season).await?;
            let teams = client.fetch_teams().await.unwrap_or_default();
            let name = teams.iter().find(|t| t.id == team_id).map(|t| t.name.as_str());
            print!("{}", summary::standings_card(team_id, name, &standing_for(&standings, team_id)));
        }
    }

    Ok(())
}

async fn watch(config: Config, client: Arc<StatsApiClient>, store: PreferenceStore) -> Result<()> {
    let access = AccessGate::new()?.check(&config.access.host, config.access.key.as_deref());
    let metrics = Arc::new(PollMetrics::new()?);
    let settings = ViewerSettings::from_config(&config);

    let mut viewer = Viewer::new(client, store, metrics.clone(), settings, access)?;
    spawn_command_reader(viewer.sender());

    info!(
        schedule_secs = config.polling.schedule_interval_secs,
        detail_secs = config.polling.detail_interval_secs,
        "diamondwatch starting"
    );

    tokio::select! {
        result = viewer.run(draw) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    viewer.stop();
    info!("Shutting down...\n{}", metrics.report()?);
    Ok(())
}

fn draw(frame: &str) {
    println!("{}", "─".repeat(48));
    println!("{}", frame.trim_end());
}

/// Forward typed lines to the viewer until stdin closes.
fn spawn_command_reader(tx: mpsc::Sender<ViewerEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(ViewerEvent::Command(command)).await.is_err() {
                            break;
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read command");
                    break;
                }
            }
        }
    });
}
