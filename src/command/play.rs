use crate::catalog::{self, Song};
use crate::navigation::Selection;
use crate::voice::ensure_voice;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use rand::Rng;
use rand::seq::SliceRandom;
use songbird::Call;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Discord rejects autocomplete responses with more choices than this.
pub const MAX_CHOICES: usize = 25;
/// Discord rejects autocomplete choices whose name or value is longer than this.
pub const MAX_CHOICE_LEN: usize = 100;

/// Songs whose file name starts with `partial`, ignoring case.
///
/// An empty query shuffles the catalog first so every song gets a chance to
/// show up, not just the alphabetically first ones. Songs whose file name is
/// too long to be sent back as a choice value are left out.
pub fn matching_songs<R>(mut songs: Vec<Song>, partial: &str, rng: &mut R) -> Vec<Song>
where
    R: Rng + ?Sized,
{
    if partial.is_empty() {
        songs.shuffle(rng);
    }

    let needle = partial.to_lowercase();
    songs
        .into_iter()
        .filter(|song| song.file_name.chars().count() <= MAX_CHOICE_LEN)
        .filter(|song| song.file_name.to_lowercase().starts_with(&needle))
        .take(MAX_CHOICES)
        .collect()
}

/// The name shown for `song` in autocomplete, cut to fit Discord's limit.
pub fn choice_name(song: &Song) -> String {
    if song.title.chars().count() <= MAX_CHOICE_LEN {
        return song.title.clone();
    }
    let mut name: String = song.title.chars().take(MAX_CHOICE_LEN - 1).collect();
    name.push('\u{2026}');
    name
}

async fn autocomplete_song(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let songs = catalog::list_songs(&ctx.data().config.music_dir);
    let songs = matching_songs(songs, partial, &mut rand::thread_rng());

    songs
        .into_iter()
        .map(|song| serenity::AutocompleteChoice::new(choice_name(&song), song.file_name))
}

/// Starts `song` on `call`, looping.
///
/// Callers commit their [`Selection`] first, so the guild's current song is
/// already recorded when playback starts.
pub async fn play_song(
    ctx: Context<'_>,
    call: Arc<Mutex<Call>>,
    song: &Song,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let input = songbird::input::File::new(song.path.clone());
    let track = {
        let mut handler = call.lock().await;
        handler.play_input(input.into())
    };

    if let Err(e) = track.enable_loop() {
        warn!(
            "Failed to loop {} in guild {}: {:?}",
            song.file_name, guild_id, e
        );
    }
    data.sessions.set_track(guild_id, track);

    info!("Playing {} in guild {}", song.file_name, guild_id);
    ctx.say(format!("Now playing: `{}` \u{1F3B6}", song.title)).await?;
    Ok(())
}

/// Plays a song from the local filesystem
#[poise::command(prefix_command, slash_command, guild_only, guild_cooldown = 5)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "The song you're looking for"]
    #[autocomplete = "autocomplete_song"]
    #[rest]
    song: String,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let songs = catalog::list_songs(&data.config.music_dir);
    let selection = Selection::explicit(guild_id, &songs, &song)?;

    let Some(call) = ensure_voice(ctx).await? else {
        return Ok(());
    };

    let song = selection.commit(&data.playback);
    play_song(ctx, call, song).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::PathBuf;

    fn catalog(names: &[&str]) -> Vec<Song> {
        names
            .iter()
            .map(|n| Song::from_path(PathBuf::from(n)).unwrap())
            .collect()
    }

    #[test]
    fn test_prefix_match_ignores_case() {
        let songs = catalog(&["Altador Cup.mp3", "altador plains.mp3", "Brightvale.mp3"]);
        let mut rng = StdRng::seed_from_u64(0);

        let matches = matching_songs(songs, "ALTA", &mut rng);
        let names: Vec<_> = matches.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["Altador Cup.mp3", "altador plains.mp3"]);
    }

    #[test]
    fn test_prefix_only_matches_start() {
        let songs = catalog(&["Kreludor.mp3", "Moltara.mp3"]);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matching_songs(songs, "ara", &mut rng).is_empty());
    }

    #[test]
    fn test_results_are_capped() {
        let names: Vec<String> = (0..40).map(|i| format!("song {:02}.mp3", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut rng = StdRng::seed_from_u64(0);

        let matches = matching_songs(catalog(&refs), "song", &mut rng);
        assert_eq!(matches.len(), MAX_CHOICES);
        assert!(matches.iter().all(|s| s.file_name.starts_with("song")));
        assert_eq!(matches[0].file_name, "song 00.mp3");
    }

    #[test]
    fn test_empty_query_returns_random_subset() {
        let names: Vec<String> = (0..40).map(|i| format!("song {:02}.mp3", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let songs = catalog(&refs);
        let mut rng = StdRng::seed_from_u64(9);

        let matches = matching_songs(songs.clone(), "", &mut rng);
        assert_eq!(matches.len(), MAX_CHOICES);
        assert!(matches.iter().all(|s| songs.contains(s)));
        assert_ne!(matches, songs[..MAX_CHOICES].to_vec());
    }

    #[test]
    fn test_overlong_file_names_are_not_offered() {
        let long = format!("{}.mp3", "a".repeat(MAX_CHOICE_LEN));
        let fits = format!("{}.mp3", "a".repeat(MAX_CHOICE_LEN - 4));
        let songs = catalog(&[long.as_str(), fits.as_str(), "ab.mp3"]);
        let mut rng = StdRng::seed_from_u64(0);

        let matches = matching_songs(songs, "a", &mut rng);
        let names: Vec<_> = matches.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec![fits.as_str(), "ab.mp3"]);
        assert_eq!(fits.chars().count(), MAX_CHOICE_LEN);
    }

    #[test]
    fn test_choice_name_is_truncated() {
        let long = format!("{}.mp3", "é".repeat(150));
        let songs = catalog(&["Faerie Caverns.mp3", long.as_str()]);

        assert_eq!(choice_name(&songs[0]), "Faerie Caverns");

        let name = choice_name(&songs[1]);
        assert_eq!(name.chars().count(), MAX_CHOICE_LEN);
        assert!(name.starts_with("ééé"));
        assert!(name.ends_with('\u{2026}'));
    }
}
