use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MUSIC_DIR: &str = "./music";
const DEFAULT_PREFIX: &str = "$";
const DEFAULT_PRESENCE_INTERVAL_SECS: u64 = 15;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// The only voice channel the bot will join.
    pub jukebox_channel: serenity::ChannelId,
    pub music_dir: PathBuf,
    /// Optional guild for instant command registration.
    pub guild_id: Option<serenity::GuildId>,
    pub prefix: String,
    pub presence_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let channel =
            lookup("JUKEBOX_CHANNEL_ID").ok_or(ConfigError::Missing("JUKEBOX_CHANNEL_ID"))?;
        let jukebox_channel =
            serenity::ChannelId::new(parse_snowflake("JUKEBOX_CHANNEL_ID", &channel)?);

        let music_dir = lookup("MUSIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MUSIC_DIR));

        let guild_id = match lookup("GUILD_ID") {
            Some(raw) => match parse_snowflake("GUILD_ID", &raw) {
                Ok(id) => Some(serenity::GuildId::new(id)),
                Err(e) => {
                    tracing::warn!("{}, commands will only be registered globally", e);
                    None
                }
            },
            None => None,
        };

        let prefix = lookup("COMMAND_PREFIX")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let presence_interval = match lookup("PRESENCE_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "PRESENCE_INTERVAL_SECS",
                        value: raw,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_PRESENCE_INTERVAL_SECS),
        };

        Ok(Self {
            token,
            jukebox_channel,
            music_dir,
            guild_id,
            prefix,
            presence_interval,
        })
    }
}

/// Discord ids are non-zero u64s; `ChannelId::new(0)` panics.
fn parse_snowflake(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
        }),
    }
}
