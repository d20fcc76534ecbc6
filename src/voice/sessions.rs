use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use songbird::tracks::{PlayMode, TrackHandle};
use tracing::{info, warn};

/// Voice sessions this process has opened, and the track started in each.
///
/// Songbird owns the connections; this only remembers which guilds have one
/// so they can be inspected and their current track stopped.
#[derive(Debug, Default)]
pub struct VoiceSessions {
    tracks: DashMap<serenity::GuildId, Option<TrackHandle>>,
}

impl VoiceSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, guild_id: serenity::GuildId) {
        self.tracks.entry(guild_id).or_insert(None);
    }

    /// Records the track now playing in a guild, returning the one it replaced.
    pub fn set_track(
        &self,
        guild_id: serenity::GuildId,
        track: TrackHandle,
    ) -> Option<TrackHandle> {
        self.tracks.insert(guild_id, Some(track)).flatten()
    }

    pub fn track(&self, guild_id: serenity::GuildId) -> Option<TrackHandle> {
        self.tracks.get(&guild_id).and_then(|entry| entry.value().clone())
    }

    pub fn forget(&self, guild_id: serenity::GuildId) {
        if self.tracks.remove(&guild_id).is_some() {
            info!("Forgot voice session in guild {}", guild_id);
        }
    }

    pub fn contains(&self, guild_id: serenity::GuildId) -> bool {
        self.tracks.contains_key(&guild_id)
    }

    pub fn guilds(&self) -> Vec<serenity::GuildId> {
        let mut guilds: Vec<_> = self.tracks.iter().map(|entry| *entry.key()).collect();
        guilds.sort();
        guilds
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Stops the guild's track if it is actively playing. The connection stays up.
    pub async fn stop_if_playing(&self, guild_id: serenity::GuildId) -> bool {
        // Clone the handle out so no map guard is held across the await.
        let Some(track) = self.track(guild_id) else {
            return false;
        };

        match track.get_info().await {
            Ok(state) if matches!(state.playing, PlayMode::Play) => {
                if let Err(e) = track.stop() {
                    warn!("Failed to stop track in guild {}: {:?}", guild_id, e);
                    return false;
                }
                info!("Stopped current track in guild {}", guild_id);
                true
            }
            _ => false,
        }
    }
}
