use crate::{Context, Error};

/// Shows the available commands
#[poise::command(prefix_command, slash_command, track_edits)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "Join the jukebox voice channel, then pick a song with /play.",
            ephemeral: true,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}
