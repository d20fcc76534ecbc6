//! Song selection for play, next, previous and shuffle.
//!
//! Selection reads a freshly listed catalog and the guild's recorded song and
//! returns the song to start. A [`Selection`] is only written to the
//! [`PlaybackState`] when committed, so a command can pick a song, pass the
//! voice checks and only then record it.

use crate::catalog::{self, Song};
use crate::playback::PlaybackState;
use poise::serenity_prelude as serenity;
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Song `{0}` not found.")]
    SongNotFound(String),
    #[error("There are no songs to play.")]
    EmptyCatalog,
    #[error("There are no other songs to shuffle to.")]
    NothingToShuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
    Shuffle,
}

impl Direction {
    pub fn select<'a, R>(
        self,
        songs: &'a [Song],
        current: Option<&str>,
        rng: &mut R,
    ) -> Result<&'a Song, NavigationError>
    where
        R: Rng + ?Sized,
    {
        match self {
            Direction::Next => next(songs, current),
            Direction::Previous => previous(songs, current),
            Direction::Shuffle => shuffle(songs, current, rng),
        }
    }
}

pub fn find<'a>(songs: &'a [Song], file_name: &str) -> Result<&'a Song, NavigationError> {
    catalog::index_of(songs, file_name)
        .map(|i| &songs[i])
        .ok_or_else(|| NavigationError::SongNotFound(file_name.to_string()))
}

/// The song after `current`, wrapping to the first. Starts from the first
/// song when `current` is unknown.
pub fn next<'a>(songs: &'a [Song], current: Option<&str>) -> Result<&'a Song, NavigationError> {
    if songs.is_empty() {
        return Err(NavigationError::EmptyCatalog);
    }

    let index = match current.and_then(|name| catalog::index_of(songs, name)) {
        Some(i) => (i + 1) % songs.len(),
        None => 0,
    };
    Ok(&songs[index])
}

/// The song before `current`, wrapping to the last.
///
/// An unknown `current` counts as index 0, so it also selects the last song.
pub fn previous<'a>(
    songs: &'a [Song],
    current: Option<&str>,
) -> Result<&'a Song, NavigationError> {
    if songs.is_empty() {
        return Err(NavigationError::EmptyCatalog);
    }

    let index = current
        .and_then(|name| catalog::index_of(songs, name))
        .unwrap_or(0);
    Ok(&songs[(index + songs.len() - 1) % songs.len()])
}

/// A random song other than `current`.
pub fn shuffle<'a, R>(
    songs: &'a [Song],
    current: Option<&str>,
    rng: &mut R,
) -> Result<&'a Song, NavigationError>
where
    R: Rng + ?Sized,
{
    let skip = current.and_then(|name| catalog::index_of(songs, name));
    let candidates: Vec<&Song> = songs
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .map(|(_, song)| song)
        .collect();

    candidates
        .choose(rng)
        .copied()
        .ok_or(NavigationError::NothingToShuffle)
}

/// A song picked for a guild but not yet recorded as its current song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a selection does nothing until committed"]
pub struct Selection<'a> {
    guild_id: serenity::GuildId,
    song: &'a Song,
}

impl<'a> Selection<'a> {
    /// Picks the song named `file_name`.
    pub fn explicit(
        guild_id: serenity::GuildId,
        songs: &'a [Song],
        file_name: &str,
    ) -> Result<Self, NavigationError> {
        let song = find(songs, file_name)?;
        Ok(Self { guild_id, song })
    }

    /// Picks the song `direction` leads to from the guild's recorded song.
    pub fn step<R>(
        playback: &PlaybackState,
        guild_id: serenity::GuildId,
        songs: &'a [Song],
        direction: Direction,
        rng: &mut R,
    ) -> Result<Self, NavigationError>
    where
        R: Rng + ?Sized,
    {
        let current = playback.current(guild_id);
        let song = direction.select(songs, current.as_deref(), rng)?;
        Ok(Self { guild_id, song })
    }

    pub fn song(&self) -> &'a Song {
        self.song
    }

    /// Records the song as the guild's current song and hands it back for playback.
    pub fn commit(self, playback: &PlaybackState) -> &'a Song {
        playback.set(self.guild_id, self.song.file_name.clone());
        self.song
    }
}
