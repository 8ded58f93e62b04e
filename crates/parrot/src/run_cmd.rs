use std::path::{Path, PathBuf};

use anyhow::Result;
use parrot_config::Config;
use parrot_core::{ChannelId, ThreadRandom};
use parrot_platform::{ChatPlatform, DiscordExecutor, GeminiGenerator, ScheduledPlatform, TextGenerator};
use parrot_scheduler::RequestScheduler;
use parrot_select::CandidateSelector;
use tokio_util::sync::CancellationToken;

use crate::logging::{self, ActivityLog};
use crate::orchestrator::{LoopSettings, Orchestrator};
use crate::timing::Pacing;

pub(crate) async fn handle_run(
    config_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_validated(config_path.as_deref())?;
    if let Some(path) = log_file {
        config.log.file = path;
    }

    let activity = logging::init_with_deferred_activity_log();

    let executor = DiscordExecutor::from_config(&config.discord)?;
    let platform = ScheduledPlatform::new(RequestScheduler::new(
        executor,
        config.scheduler_config(),
    ));
    let generator = GeminiGenerator::new(config.gemini.clone(), config.persona.clone());
    let settings = LoopSettings {
        channel: ChannelId::new(config.discord.channel_id.clone()),
        fetch_limit: config.discord.fetch_limit,
        banned_words: config.banned_words(),
    };

    let cancel = CancellationToken::new();
    let mut bot = Orchestrator::new(
        platform,
        generator,
        CandidateSelector::default(),
        Pacing::new(config.timing.clone()),
        settings,
        Box::new(ThreadRandom),
        cancel.clone(),
    );

    let watcher = tokio::spawn(stop_on_ctrl_c(cancel.clone()));
    let result = start_and_run(&mut bot, &activity, &config.log.file).await;
    cancel.cancel();
    let _ = watcher.await;
    result
}

/// The activity log is only reset once the token has been proven to work.
async fn start_and_run<P, G>(
    bot: &mut Orchestrator<P, G>,
    activity: &ActivityLog,
    log_file: &Path,
) -> Result<()>
where
    P: ChatPlatform,
    G: TextGenerator,
{
    bot.bootstrap().await?;
    let _log_guard = activity.attach(log_file)?;
    tracing::info!("Activity will be logged to {}", log_file.display());
    bot.run().await
}

pub(crate) fn handle_check(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_validated(config_path.as_deref())?;
    print!("{}", config.redacted().to_toml()?);
    println!("# configuration OK");
    Ok(())
}

fn load_validated(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

async fn stop_on_ctrl_c(cancel: CancellationToken) {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    tracing::info!("Caught interrupt signal (Ctrl+C). Stopping bot gracefully...");
                    cancel.cancel();
                }
                Err(err) => tracing::error!("failed to listen for Ctrl+C: {err}"),
            }
        }
        _ = cancel.cancelled() => {}
    }
}
