//! Song catalog backed by a directory tree.
//!
//! The catalog is never cached: every listing walks the music directory again
//! so songs added or removed at runtime show up on the next command.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Only files with this extension are playable.
pub const SONG_EXTENSION: &str = "mp3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// File name including extension, the song's identity.
    pub file_name: String,
    /// File name without extension, shown to users.
    pub title: String,
    pub path: PathBuf,
}

impl Song {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some(SONG_EXTENSION) {
            return None;
        }

        let file_name = path.file_name()?.to_str()?.to_string();
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string();

        Some(Self {
            file_name,
            title,
            path,
        })
    }
}

/// Lists every song under `root`, sorted by file name.
///
/// An unreadable or missing root is an empty catalog.
pub fn list_songs(root: &Path) -> Vec<Song> {
    scan(root).unwrap_or_default()
}

/// Like [`list_songs`] but reports a root that cannot be read.
///
/// Unreadable entries below the root are skipped either way.
pub fn scan(root: &Path) -> io::Result<Vec<Song>> {
    let mut songs = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        collect(entry, &mut songs);
    }
    songs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(songs)
}

fn collect(entry: fs::DirEntry, songs: &mut Vec<Song>) {
    let path = entry.path();
    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

    if is_dir {
        let Ok(children) = fs::read_dir(&path) else {
            return;
        };
        for child in children.flatten() {
            collect(child, songs);
        }
    } else if path.is_file() {
        if let Some(song) = Song::from_path(path) {
            songs.push(song);
        }
    }
}

pub fn index_of(songs: &[Song], file_name: &str) -> Option<usize> {
    songs.iter().position(|s| s.file_name == file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn names(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.file_name.as_str()).collect()
    }

    #[test]
    fn test_song_from_path() {
        let song = Song::from_path(PathBuf::from("music/battle/Tyrannian Victory.mp3")).unwrap();
        assert_eq!(song.file_name, "Tyrannian Victory.mp3");
        assert_eq!(song.title, "Tyrannian Victory");

        assert!(Song::from_path(PathBuf::from("music/cover.png")).is_none());
        assert!(Song::from_path(PathBuf::from("music/loud.MP3")).is_none());
        assert!(Song::from_path(PathBuf::from("music/mp3")).is_none());
    }

    #[test]
    fn test_lists_recursively_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "c.mp3");
        touch(dir.path(), "a.mp3");
        touch(dir.path(), "notes.txt");
        let nested = dir.path().join("games").join("old");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "b.mp3");

        let songs = list_songs(dir.path());
        assert_eq!(names(&songs), vec!["a.mp3", "b.mp3", "c.mp3"]);
        assert_eq!(songs[1].path, nested.join("b.mp3"));
    }

    #[test]
    fn test_sort_is_lexicographic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "B.mp3", "a 2.mp3", "a10.mp3", "a2.mp3"] {
            touch(dir.path(), name);
        }

        let songs = list_songs(dir.path());
        assert_eq!(names(&songs), vec!["B.mp3", "a 2.mp3", "a10.mp3", "a2.mp3", "b.mp3"]);
    }

    #[test]
    fn test_listing_reflects_additions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp3");
        touch(dir.path(), "c.mp3");

        let first = list_songs(dir.path());
        assert_eq!(first, list_songs(dir.path()));

        touch(dir.path(), "b.mp3");
        let second = list_songs(dir.path());
        assert_eq!(names(&second), vec!["a.mp3", "b.mp3", "c.mp3"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(list_songs(&missing).is_empty());
        assert!(scan(&missing).is_err());
    }

    #[test]
    fn test_index_of() {
        let songs: Vec<Song> = ["a.mp3", "b.mp3"]
            .iter()
            .filter_map(|n| Song::from_path(PathBuf::from(n)))
            .collect();

        assert_eq!(index_of(&songs, "b.mp3"), Some(1));
        assert_eq!(index_of(&songs, "b"), None);
        assert_eq!(index_of(&songs, ""), None);
    }
}
