use super::events::TrackErrorNotifier;
use super::sessions::VoiceSessions;
use crate::{Context, Data, Error};
use poise::serenity_prelude as serenity;
use songbird::{Call, Event, TrackEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Why a user may not start playback.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Rejection {
    #[error("You are not connected to a voice channel. Join <#{0}>!")]
    NotConnected(serenity::ChannelId),
    #[error("You are not in the <#{0}> channel.")]
    WrongChannel(serenity::ChannelId),
}

/// Checks that a user sitting in `user_channel` may summon the bot to `target`.
pub fn check_membership(
    user_channel: Option<serenity::ChannelId>,
    target: serenity::ChannelId,
) -> Result<(), Rejection> {
    match user_channel {
        None => Err(Rejection::NotConnected(target)),
        Some(channel) if channel != target => Err(Rejection::WrongChannel(target)),
        Some(_) => Ok(()),
    }
}

/// Whether a voice state change should pull the bot into the jukebox channel.
pub fn should_auto_join(
    bot_id: serenity::UserId,
    user_id: serenity::UserId,
    joined: Option<serenity::ChannelId>,
    target: serenity::ChannelId,
    already_connected: bool,
) -> bool {
    user_id != bot_id && joined == Some(target) && !already_connected
}

/// The guild's call if it is still connected to a channel.
pub async fn live_call(
    manager: &songbird::Songbird,
    guild_id: serenity::GuildId,
) -> Option<Arc<Mutex<Call>>> {
    let call = manager.get(guild_id)?;
    let connected = call.lock().await.current_channel().is_some();
    connected.then_some(call)
}

/// Joins `channel_id` and records the session.
pub async fn connect(
    manager: &songbird::Songbird,
    sessions: &VoiceSessions,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> Result<Arc<Mutex<Call>>, songbird::error::JoinError> {
    let call = manager.join(guild_id, channel_id).await?;

    {
        let mut handler = call.lock().await;
        handler.remove_all_global_events();
        handler.add_global_event(Event::Track(TrackEvent::Error), TrackErrorNotifier);
    }

    sessions.register(guild_id);
    info!("Joined voice channel {} in guild {}", channel_id, guild_id);
    Ok(call)
}

/// Makes sure the bot has a usable voice session before a song starts.
///
/// With no live session, the invoking user must be in the jukebox channel;
/// otherwise they get an ephemeral notice and `None` is returned. With a live
/// session, whatever is playing is stopped so the next song can take over.
pub async fn ensure_voice(ctx: Context<'_>) -> Result<Option<Arc<Mutex<Call>>>, Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let manager = songbird::get(ctx.serenity_context())
        .await
        .ok_or("Songbird voice client not initialized")?
        .clone();

    if let Some(call) = live_call(&manager, guild_id).await {
        data.sessions.register(guild_id);
        data.sessions.stop_if_playing(guild_id).await;
        return Ok(Some(call));
    }

    let target = data.config.jukebox_channel;
    let user_channel = ctx.guild().and_then(|guild| {
        guild
            .voice_states
            .get(&ctx.author().id)
            .and_then(|vs| vs.channel_id)
    });

    if let Err(rejection) = check_membership(user_channel, target) {
        warn!(
            "Rejected {} in guild {}: {:?}",
            ctx.author().name,
            guild_id,
            rejection
        );
        ctx.send(
            poise::CreateReply::default()
                .content(rejection.to_string())
                .ephemeral(true),
        )
        .await?;
        return Ok(None);
    }

    let call = connect(&manager, &data.sessions, guild_id, target).await?;
    Ok(Some(call))
}

/// Follows users into the jukebox channel when the bot is not already connected.
pub async fn auto_join(
    ctx: &serenity::Context,
    state: &serenity::VoiceState,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = state.guild_id else {
        return Ok(());
    };
    let target = data.config.jukebox_channel;
    if state.channel_id != Some(target) {
        return Ok(());
    }

    let manager = songbird::get(ctx)
        .await
        .ok_or("Songbird voice client not initialized")?
        .clone();

    let bot_id = ctx.cache.current_user().id;
    let connected = live_call(&manager, guild_id).await.is_some();
    if !should_auto_join(bot_id, state.user_id, state.channel_id, target, connected) {
        return Ok(());
    }

    info!("{} joined <#{}>, following", state.user_id, target);
    connect(&manager, &data.sessions, guild_id, target).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUKEBOX: u64 = 1077343507343212585;

    #[test]
    fn test_membership_accepts_jukebox_channel() {
        let target = serenity::ChannelId::new(JUKEBOX);
        assert_eq!(check_membership(Some(target), target), Ok(()));
    }

    #[test]
    fn test_membership_rejections() {
        let target = serenity::ChannelId::new(JUKEBOX);
        let elsewhere = serenity::ChannelId::new(5);

        assert_eq!(check_membership(None, target), Err(Rejection::NotConnected(target)));
        assert_eq!(
            check_membership(Some(elsewhere), target),
            Err(Rejection::WrongChannel(target))
        );
    }

    #[test]
    fn test_rejection_messages_mention_channel() {
        let target = serenity::ChannelId::new(JUKEBOX);
        assert_eq!(
            Rejection::NotConnected(target).to_string(),
            format!("You are not connected to a voice channel. Join <#{}>!", JUKEBOX)
        );
        assert_eq!(
            Rejection::WrongChannel(target).to_string(),
            format!("You are not in the <#{}> channel.", JUKEBOX)
        );
    }

    #[test]
    fn test_auto_join_rules() {
        let bot = serenity::UserId::new(99);
        let target = serenity::ChannelId::new(JUKEBOX);
        let user = serenity::UserId::new(1);
        let elsewhere = serenity::ChannelId::new(5);

        assert!(should_auto_join(bot, user, Some(target), target, false));
        assert!(!should_auto_join(bot, user, Some(target), target, true));
        assert!(!should_auto_join(bot, bot, Some(target), target, false));
        assert!(!should_auto_join(bot, user, Some(elsewhere), target, false));
        assert!(!should_auto_join(bot, user, None, target, false));
    }
}
