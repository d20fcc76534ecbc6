use super::sessions::VoiceSessions;
use poise::serenity_prelude as serenity;
use songbird::Songbird;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Periodically leaves voice channels where the bot is the only member.
///
/// Must be spawned after the gateway is ready, so the cache holds voice states.
pub struct PresenceMonitor {
    task: JoinHandle<()>,
}

impl PresenceMonitor {
    pub fn spawn(ctx: serenity::Context, sessions: Arc<VoiceSessions>, period: Duration) -> Self {
        info!("Presence monitor checking every {:?}", period);
        let task = tokio::spawn(run(ctx, sessions, period));
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
        info!("Presence monitor stopped");
    }
}

/// Members in `channel`, counted from the guild's voice states.
pub fn count_members(
    channels: impl IntoIterator<Item = Option<serenity::ChannelId>>,
    channel: serenity::ChannelId,
) -> usize {
    channels
        .into_iter()
        .filter(|c| *c == Some(channel))
        .count()
}

/// The bot's own voice state is always counted, so one member means alone.
pub fn is_alone(members: usize) -> bool {
    members == 1
}

async fn run(ctx: serenity::Context, sessions: Arc<VoiceSessions>, period: Duration) {
    let Some(manager) = songbird::get(&ctx).await else {
        error!("Songbird voice client not initialized, presence monitor not started");
        return;
    };

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut disconnects = JoinSet::new();

    loop {
        interval.tick().await;
        // Disconnects still hanging from the previous cycle are abandoned.
        disconnects.shutdown().await;
        check(&ctx, &manager, &sessions, &mut disconnects).await;
    }
}

async fn check(
    ctx: &serenity::Context,
    manager: &Arc<Songbird>,
    sessions: &Arc<VoiceSessions>,
    disconnects: &mut JoinSet<()>,
) {
    for guild_id in sessions.guilds() {
        let current_channel = match manager.get(guild_id) {
            Some(call) => call.lock().await.current_channel(),
            None => None,
        };

        let Some(channel) = current_channel else {
            sessions.forget(guild_id);
            continue;
        };
        let channel_id = serenity::ChannelId::new(channel.0.get());

        let members = ctx
            .cache
            .guild(guild_id)
            .map(|guild| {
                let channels = guild.voice_states.values().map(|vs| vs.channel_id);
                count_members(channels, channel_id)
            })
            .unwrap_or(0);

        if !is_alone(members) {
            continue;
        }

        info!(
            "Alone in voice channel {} of guild {}, disconnecting",
            channel_id, guild_id
        );

        let manager = Arc::clone(manager);
        let sessions = Arc::clone(sessions);
        disconnects.spawn(async move {
            match manager.remove(guild_id).await {
                Ok(()) => sessions.forget(guild_id),
                Err(e) => warn!("Failed to leave voice channel in guild {}: {:?}", guild_id, e),
            }
        });
    }
}
