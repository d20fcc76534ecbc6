use crate::voice::live_call;
use crate::{Context, Error};
use tracing::{error, info};

/// Stops the music and leaves the voice channel
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn stop(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let manager = songbird::get(ctx.serenity_context())
        .await
        .ok_or("Songbird voice client not initialized")?
        .clone();

    if live_call(&manager, guild_id).await.is_none() {
        ctx.send(
            poise::CreateReply::default()
                .content("Nothing is playing.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    data.sessions.stop_if_playing(guild_id).await;

    if let Err(e) = manager.remove(guild_id).await {
        error!("Failed to leave voice channel: {:?}", e);
    }
    data.sessions.forget(guild_id);

    info!("Left voice channel in guild {}", guild_id);

    ctx.say("Stopped playback. \u{1F44B}").await?;
    Ok(())
}
