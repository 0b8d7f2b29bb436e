use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apify_client::ApifyClient;
use corrector::bot::{BotDeps, CorrectionBot};
use corrector::journal::CorrectionJournal;
use corrector::poster::XReplyPoster;
use corrector::scheduler::CycleScheduler;
use corrector::scraper::ApifyScraper;
use corrector::state::{FileBackend, MemoryBackend, StateBackend, StateStore};
use corrector_common::{BotProfile, Config};
use x_client::XClient;

/// Finds posts with common writing mistakes and replies with the fix.
#[derive(Parser, Debug)]
#[command(name = "corrector", version)]
struct Args {
    /// Which bot to run: `grammar` or `english`.
    profile: BotProfile,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    /// Keep state in memory only. Nothing is read from or written to disk.
    #[arg(long)]
    ephemeral_state: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("corrector=info".parse()?))
        .init();

    let args = Args::parse();
    info!(profile = %args.profile, once = args.once, "Corrector starting...");

    let config = Config::from_env(args.profile)?;
    config.log_redacted();
    let settings = config.settings.clone();

    let x = XClient::new(config.x_access_token.clone());
    let me = x
        .me()
        .await
        .context("X credential check failed; refusing to start")?;
    info!(username = me.username.as_str(), id = me.id.as_str(), "Authenticated with X");

    let backend: Box<dyn StateBackend> = if args.ephemeral_state {
        Box::new(MemoryBackend::new())
    } else {
        Box::new(FileBackend::for_profile(&config.data_dir, config.profile))
    };
    let store = StateStore::load(
        backend,
        settings.max_history,
        settings.daily_limit,
        Utc::now().date_naive(),
    );

    let scraper = ApifyScraper::new(
        ApifyClient::new(config.apify_api_key.clone()),
        config.profile.dictionary(),
        &settings,
    );
    info!(query = scraper.query(), "Search query");

    let journal = if args.ephemeral_state {
        CorrectionJournal::disabled()
    } else {
        CorrectionJournal::new(&config.data_dir, config.profile)
    };

    let deps = BotDeps::builder()
        .scraper(Box::new(scraper))
        .poster(Box::new(XReplyPoster::new(x)))
        .journal(journal)
        .build();
    let mut scheduler = CycleScheduler::new(CorrectionBot::new(config.profile, settings, store, deps));

    if args.once {
        let (stats, _) = scheduler.tick().await;
        info!(%stats, "Single cycle finished");
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    let bot = scheduler.run(shutdown).await;
    info!(
        profile = %bot.profile(),
        daily_count = bot.store().daily_count(),
        "Corrector stopped"
    );
    Ok(())
}
