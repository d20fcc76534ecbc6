use anyhow::Context as _;
use dotenvy::dotenv;
use poise::serenity_prelude as serenity;
use serenity::{Client, model::gateway::GatewayIntents};
use songbird::SerenityInit;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod catalog;
mod command;
mod config;
mod navigation;
mod playback;
mod voice;

use command::*;
use config::Config;
use playback::PlaybackState;
use voice::{PresenceMonitor, VoiceSessions};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

const DEFAULT_LOG_FILTER: &str = "info,serenity=warn,songbird=warn";

pub struct Data {
    pub config: Config,
    pub playback: PlaybackState,
    pub sessions: Arc<VoiceSessions>,
    pub presence: Mutex<Option<PresenceMonitor>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

async fn reply_ephemeral(ctx: Context<'_>, content: impl Into<String>) {
    let reply = poise::CreateReply::default().content(content).ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send error reply: {}", e);
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
            std::process::exit(1);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            warn!("Error in command `{}`: {}", ctx.command().name, error);
            reply_ephemeral(ctx, error.to_string()).await;
        }
        poise::FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            let secs = remaining_cooldown.as_secs_f32().ceil() as u64;
            let notice = format!("Slow down! Try again in {} seconds.", secs.max(1));
            reply_ephemeral(ctx, notice).await;
        }
        poise::FrameworkError::NotAnOwner { ctx, .. } => {
            reply_ephemeral(ctx, "Only the bot owner can use this command.").await;
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e)
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::VoiceStateUpdate { new, .. } = event {
        voice::auto_join(ctx, new, data).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("Invalid configuration")?;
    if !config.music_dir.is_dir() {
        warn!(
            "Music directory {} not found, the catalog is empty until it exists",
            config.music_dir.display()
        );
    }

    let options = poise::FrameworkOptions {
        commands: vec![
            play(),
            next(),
            previous(),
            shuffle(),
            stop(),
            reload(),
            status(),
            help(),
        ],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(config.prefix.clone()),
            mention_as_prefix: true,
            edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                Duration::from_secs(3600),
            ))),
            ..Default::default()
        },
        // The global error handler for all error cases that may occur
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                info!("Executing command {}...", ctx.command().qualified_name);
            })
        },
        post_command: |ctx| {
            Box::pin(async move {
                info!("Executed command {}!", ctx.command().qualified_name);
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let token = config.token.clone();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES;

    let framework = poise::Framework::builder()
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                if let Some(guild_id) = config.guild_id {
                    let commands = &framework.options().commands;
                    poise::builtins::register_in_guild(ctx, commands, guild_id).await?;
                    info!("Registered commands for guild {}", guild_id);
                }

                // Setup runs on Ready, so the cache is populated before the first check.
                let sessions = Arc::new(VoiceSessions::new());
                let presence = PresenceMonitor::spawn(
                    ctx.clone(),
                    Arc::clone(&sessions),
                    config.presence_interval,
                );

                Ok(Data {
                    config,
                    playback: PlaybackState::new(),
                    sessions,
                    presence: Mutex::new(Some(presence)),
                    started_at: chrono::Utc::now(),
                })
            })
        })
        .options(options)
        .build();

    let mut client = Client::builder(token, intents)
        .framework(framework)
        .register_songbird()
        .await
        .context("Failed to create client")?;

    client.start().await.context("Client stopped with an error")?;
    Ok(())
}
