use dashmap::DashMap;
use poise::serenity_prelude as serenity;

/// The song last started in each guild, kept for the lifetime of the process.
///
/// A guild with no entry has not played anything yet.
#[derive(Debug, Default)]
pub struct PlaybackState {
    current: DashMap<serenity::GuildId, String>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, guild_id: serenity::GuildId) -> Option<String> {
        self.current.get(&guild_id).map(|entry| entry.value().clone())
    }

    pub fn set(&self, guild_id: serenity::GuildId, file_name: impl Into<String>) {
        self.current.insert(guild_id, file_name.into());
    }

    /// All recorded songs, ordered by guild id.
    pub fn snapshot(&self) -> Vec<(serenity::GuildId, String)> {
        let mut entries: Vec<_> = self
            .current
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(guild_id, _)| *guild_id);
        entries
    }
}
