//! Owner-only maintenance commands.
//!
//! Only a fixed set of operations is exposed; there is no way to evaluate
//! arbitrary input.

use crate::catalog;
use crate::voice::PresenceMonitor;
use crate::{Context, Error};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// How long the success reaction stays before the command message is removed.
const ACK_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTarget {
    /// Rescan the music directory.
    Catalog,
    /// Restart the presence monitor.
    Presence,
    /// Re-register application commands.
    Commands,
}

impl ReloadTarget {
    pub const ALL: [ReloadTarget; 3] = [
        ReloadTarget::Catalog,
        ReloadTarget::Presence,
        ReloadTarget::Commands,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReloadTarget::Catalog => "catalog",
            ReloadTarget::Presence => "presence",
            ReloadTarget::Commands => "commands",
        }
    }
}

impl fmt::Display for ReloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReloadTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ReloadTarget::ALL
            .into_iter()
            .find(|target| target.name() == wanted)
            .ok_or_else(|| {
                let valid: Vec<_> = ReloadTarget::ALL.iter().map(|t| t.name()).collect();
                format!(
                    "Unknown reload target `{}`. Use one of: {}",
                    s.trim(),
                    valid.join(", ")
                )
            })
    }
}

/// An empty argument means every target.
pub fn parse_targets(arg: Option<&str>) -> Result<Vec<ReloadTarget>, String> {
    match arg.map(str::trim).filter(|a| !a.is_empty()) {
        None => Ok(ReloadTarget::ALL.to_vec()),
        Some(name) => Ok(vec![name.parse()?]),
    }
}

/// Renders an error and its sources, one per line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

pub fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

async fn reload_target(ctx: Context<'_>, target: ReloadTarget) -> Result<String, Error> {
    let data = ctx.data();

    match target {
        ReloadTarget::Catalog => {
            let songs = catalog::scan(&data.config.music_dir)?;
            Ok(format!("catalog: {} songs", songs.len()))
        }
        ReloadTarget::Presence => {
            let mut presence = data.presence.lock().await;
            if let Some(monitor) = presence.take() {
                monitor.stop();
            }
            *presence = Some(PresenceMonitor::spawn(
                ctx.serenity_context().clone(),
                Arc::clone(&data.sessions),
                data.config.presence_interval,
            ));
            Ok("presence: restarted".to_string())
        }
        ReloadTarget::Commands => {
            let framework = ctx.framework();
            let commands = &framework.options().commands;
            poise::builtins::register_globally(ctx.serenity_context(), commands).await?;
            if let Some(guild_id) = data.config.guild_id {
                poise::builtins::register_in_guild(ctx.serenity_context(), commands, guild_id)
                    .await?;
            }
            Ok(format!("commands: {} registered", commands.len()))
        }
    }
}

/// Unwraps the result of a reaction or cleanup that may fail without
/// affecting the command, logging the failure.
fn best_effort<T, E: fmt::Display>(action: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Failed to {}: {}", action, e);
            None
        }
    }
}

async fn acknowledge(ctx: Context<'_>, report: &[String]) -> Result<(), Error> {
    match ctx {
        poise::Context::Prefix(prefix) => {
            let http = ctx.serenity_context();
            let reacted = prefix.msg.react(http, '\u{1F44D}').await;
            if best_effort("react to reload message", reacted).is_some() {
                tokio::time::sleep(ACK_DELAY).await;
                best_effort("delete reload message", prefix.msg.delete(http).await);
            }
        }
        poise::Context::Application(_) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("Reloaded:\n{}", report.join("\n")))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

/// Reloads the catalog, presence monitor or command registrations
#[poise::command(
    prefix_command,
    slash_command,
    owners_only,
    hide_in_help,
    aliases("restart")
)]
pub async fn reload(
    ctx: Context<'_>,
    #[description = "catalog, presence or commands (everything when empty)"]
    target: Option<String>,
) -> Result<(), Error> {
    let targets = parse_targets(target.as_deref())?;

    let mut report = Vec::new();
    for target in targets {
        match reload_target(ctx, target).await {
            Ok(line) => {
                info!("Reloaded {}", target);
                report.push(line);
            }
            Err(e) => {
                error!("Failed to reload {}: {:?}", target, e);
                if let poise::Context::Prefix(prefix) = ctx {
                    let reacted = prefix.msg.react(ctx.serenity_context(), '\u{274C}').await;
                    best_effort("react to reload message", reacted);
                }
                ctx.say(format!(
                    "Failed to reload `{}`\n```\n{}\n```",
                    target,
                    error_chain(&*e)
                ))
                .await?;
                return Ok(());
            }
        }
    }

    acknowledge(ctx, &report).await
}

/// Shows uptime, catalog size and voice sessions
#[poise::command(prefix_command, slash_command, owners_only, hide_in_help)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let songs = catalog::list_songs(&data.config.music_dir).len();
    let uptime = format_duration(chrono::Utc::now() - data.started_at);
    let monitor = match data.presence.lock().await.as_ref() {
        Some(monitor) if monitor.is_running() => "running",
        _ => "stopped",
    };

    let mut response = format!(
        "**Uptime:** {}\n**Songs:** {}\n**Presence monitor:** {}\n**Voice sessions:** {}\n",
        uptime,
        songs,
        monitor,
        data.sessions.len()
    );

    for (guild_id, file_name) in data.playback.snapshot() {
        let connected = if data.sessions.contains(guild_id) {
            " (connected)"
        } else {
            ""
        };
        response.push_str(&format!("- `{}`: `{}`{}\n", guild_id, file_name, connected));
    }

    ctx.say(response).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(parse_targets(None).unwrap(), ReloadTarget::ALL.to_vec());
        assert_eq!(parse_targets(Some("  ")).unwrap(), ReloadTarget::ALL.to_vec());
        assert_eq!(parse_targets(Some("Presence")).unwrap(), vec![ReloadTarget::Presence]);
        assert_eq!(parse_targets(Some(" catalog ")).unwrap(), vec![ReloadTarget::Catalog]);
    }

    #[test]
    fn test_unknown_target_lists_valid_ones() {
        let err = parse_targets(Some("music")).unwrap_err();
        assert_eq!(
            err,
            "Unknown reload target `music`. Use one of: catalog, presence, commands"
        );
    }

    #[derive(thiserror::Error, Debug)]
    #[error("rescan failed")]
    struct Rescan(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "music is gone");
        assert_eq!(
            error_chain(&Rescan(io)),
            "rescan failed\ncaused by: music is gone"
        );
    }

    #[test]
    fn test_best_effort_keeps_value_and_swallows_failure() {
        assert_eq!(best_effort("react", Ok::<_, String>(3)), Some(3));
        assert_eq!(
            best_effort("delete", Err::<(), _>("Unknown Message".to_string())),
            None
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(3725)), "1h 2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(90061)), "1d 1h 1m");
    }
}
