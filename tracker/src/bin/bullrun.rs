use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{error::ErrorKind, Parser, Subcommand};
use client::CardrunClient;
use storage::JsonStore;
use tokio::sync::Mutex;
use tracker::{
    analyze_card_similarity, analyze_leaderboard, report, Clock, DeckTracker, HotPlayerCache, Monitor,
    MonitorSettings, PlayLog, RoundManager, SystemClock, TrackerConfig, TrackerError,
};
use types::RoundId;

const DEFAULT_IMPORT_BASE_ROUND: RoundId = 355;
const DEFAULT_CLEAN_DAYS: u32 = 30;
const HOT_PLAYERS_SHOWN: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "bullrun", version, about = "Tracks decks played by the top card game players")]
struct Params {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the current round for new decks until interrupted
    Run,
    /// Show tracker, round and hot player statistics
    Stats,
    /// Show the most recent decks of a player
    History { username: String },
    /// Remove decks older than the given number of days
    Clean {
        #[arg(default_value_t = DEFAULT_CLEAN_DAYS)]
        days: u32,
    },
    /// Show the round manager status
    Status,
    /// Advance the round now
    Update,
    /// Show when the round advances next
    Next,
    /// Fetch recent leaderboards and rebuild the hot player list
    RefreshHot,
    /// Build the hot player list from a file of saved leaderboard responses
    Import {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_IMPORT_BASE_ROUND)]
        base_round: RoundId,
    },
}

struct Context {
    config: TrackerConfig,
    store: Arc<dyn JsonStore>,
    clock: Arc<dyn Clock>,
}

impl Context {
    async fn open(params: &Params) -> Result<Self, TrackerError> {
        let config = TrackerConfig::load(
            params.config.as_deref(),
            params.data_dir.clone(),
            params.database_url.clone(),
        )?;
        let store: Arc<dyn JsonStore> = config.storage.open().await?.into();
        Ok(Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        })
    }

    async fn deck_tracker(&self) -> DeckTracker {
        DeckTracker::initialize(self.store.clone(), self.clock.clone()).await
    }

    async fn round_manager(&self) -> RoundManager {
        RoundManager::initialize(self.store.clone(), self.clock.clone(), self.config.default_round_id).await
    }

    fn hot_player_cache(&self) -> HotPlayerCache {
        HotPlayerCache::new(self.store.clone(), self.clock.clone(), self.config.hot_players_max_age)
    }
}

async fn run(ctx: &Context) -> Result<(), TrackerError> {
    let rounds = ctx.round_manager().await;
    let tracker = ctx.deck_tracker().await;
    let client = Arc::new(CardrunClient::new(ctx.config.client_config())?);

    let hot_players = ctx
        .hot_player_cache()
        .resolve(
            client.as_ref(),
            rounds.current_round(),
            ctx.config.leaderboard_rounds,
            ctx.config.leaderboard_request_delay,
            false,
        )
        .await;
    println!("{}", report::format_hot_players(&hot_players, HOT_PLAYERS_SHOWN));
    println!(
        "{}",
        report::format_stats(
            &tracker.stats(),
            &rounds.state(),
            &rounds.next_update_info(),
            hot_players.len(),
            true
        )
    );

    let tracker = Arc::new(Mutex::new(tracker));
    let mut monitor = Monitor::new(
        tracker.clone(),
        Arc::new(Mutex::new(rounds)),
        client,
        PlayLog::new(ctx.store.clone()),
        hot_players,
        MonitorSettings::from(&ctx.config),
    );
    monitor.start();
    log::info!("Monitoring, press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
    log::info!("Shutting down");
    monitor.stop().await;
    tracker.lock().await.persist().await;
    Ok(())
}

async fn refresh_hot(ctx: &Context) -> Result<(), TrackerError> {
    let rounds = ctx.round_manager().await;
    let client = CardrunClient::new(ctx.config.client_config())?;
    let hot_players = ctx
        .hot_player_cache()
        .resolve(
            &client,
            rounds.current_round(),
            ctx.config.leaderboard_rounds,
            ctx.config.leaderboard_request_delay,
            true,
        )
        .await;
    println!("{}", report::format_hot_players(&hot_players, HOT_PLAYERS_SHOWN));
    println!(
        "{}",
        report::format_similarities(&analyze_card_similarity(&hot_players), HOT_PLAYERS_SHOWN)
    );
    Ok(())
}

async fn import(ctx: &Context, file: &std::path::Path, base_round: RoundId) -> Result<(), TrackerError> {
    let entries = client::import::read_leaderboard_file(file, base_round).await?;
    if entries.is_empty() {
        return Err(TrackerError::Config(format!(
            "No leaderboard entries found in {}",
            file.display()
        )));
    }
    let analysis = analyze_leaderboard(&entries);
    let document = ctx.hot_player_cache().save_analysis(&analysis, &entries).await;
    println!(
        "Imported {} entries, {} unique players, rounds {}",
        entries.len(),
        analysis.total_unique_players,
        document
            .round_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("{}", report::format_hot_players(&document.hot_players, HOT_PLAYERS_SHOWN));
    Ok(())
}

async fn execute(params: Params) -> Result<(), TrackerError> {
    let ctx = Context::open(&params).await?;
    match params.command {
        Command::Run => run(&ctx).await?,
        Command::Stats => {
            let tracker = ctx.deck_tracker().await;
            let rounds = ctx.round_manager().await;
            let hot_players = ctx
                .hot_player_cache()
                .load()
                .await
                .map_or(0, |document| document.hot_players.len());
            println!(
                "{}",
                report::format_stats(
                    &tracker.stats(),
                    &rounds.state(),
                    &rounds.next_update_info(),
                    hot_players,
                    false
                )
            );
        }
        Command::History { username } => {
            let tracker = ctx.deck_tracker().await;
            println!("{}", report::format_history(&username, tracker.history(&username)));
        }
        Command::Clean { days } => {
            let mut tracker = ctx.deck_tracker().await;
            let removed = tracker.clean_old_data(days).await;
            println!("{}", report::format_prune_report(&removed, days));
        }
        Command::Status => {
            let rounds = ctx.round_manager().await;
            println!(
                "{}",
                report::format_round_status(&rounds.state(), &rounds.next_update_info(), false)
            );
        }
        Command::Update => {
            let mut rounds = ctx.round_manager().await;
            let update = rounds.force_update_round().await;
            println!("Round updated: {} -> {}", update.old_round_id, update.new_round_id);
        }
        Command::Next => {
            let rounds = ctx.round_manager().await;
            println!("{}", report::format_next_update(&rounds.next_update_info()));
        }
        Command::RefreshHot => refresh_hot(&ctx).await?,
        Command::Import { file, base_round } => import(&ctx, &file, base_round).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let params = match Params::try_parse() {
        Ok(params) => params,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    log::debug!("args: {params:?}");

    match execute(params).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
