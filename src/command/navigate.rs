use super::play::play_song;
use crate::catalog;
use crate::navigation::{Direction, Selection};
use crate::voice::ensure_voice;
use crate::{Context, Error};
use tracing::debug;

async fn navigate(ctx: Context<'_>, direction: Direction) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    // Pick before touching voice so an empty catalog neither joins nor cuts the music.
    let songs = catalog::list_songs(&data.config.music_dir);
    let selection = Selection::step(
        &data.playback,
        guild_id,
        &songs,
        direction,
        &mut rand::thread_rng(),
    )?;
    debug!(
        "{:?} selected {} in guild {}",
        direction,
        selection.song().file_name,
        guild_id
    );

    let Some(call) = ensure_voice(ctx).await? else {
        return Ok(());
    };

    let song = selection.commit(&data.playback);
    play_song(ctx, call, song).await
}

/// Plays the next song in the local filesystem
#[poise::command(prefix_command, slash_command, guild_only, guild_cooldown = 5)]
pub async fn next(ctx: Context<'_>) -> Result<(), Error> {
    navigate(ctx, Direction::Next).await
}

/// Plays the previous song in the local filesystem
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    guild_cooldown = 5,
    aliases("prev")
)]
pub async fn previous(ctx: Context<'_>) -> Result<(), Error> {
    navigate(ctx, Direction::Previous).await
}

/// Plays a random song in the local filesystem
#[poise::command(prefix_command, slash_command, guild_only, guild_cooldown = 5)]
pub async fn shuffle(ctx: Context<'_>) -> Result<(), Error> {
    navigate(ctx, Direction::Shuffle).await
}
