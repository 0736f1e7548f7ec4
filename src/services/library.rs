//! Library presence check against on-disk media folders
//!
//! Shows are expected one folder per show under each configured root, named
//! `Title`, `Title (Year)` or carrying a `{tmdb-<id>}` / `[tmdbid=<id>]` tag.
//! When a season is known the show folder must also contain that season's
//! folder (`Season 2`, `Season 02` or `S02`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::LibraryIndex;
use crate::models::RecognizedMedia;

pub struct DirectoryLibraryIndex {
    roots: Vec<PathBuf>,
}

impl DirectoryLibraryIndex {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn folder_matches(name: &str, media: &RecognizedMedia) -> bool {
        let name = name.trim().to_lowercase();
        let title = media.title.trim().to_lowercase();
        if title.is_empty() {
            return false;
        }

        if name.contains(&format!("{{tmdb-{}}}", media.tmdb_id))
            || name.contains(&format!("[tmdbid={}]", media.tmdb_id))
        {
            return true;
        }

        if name == title {
            return true;
        }
        match media.year.as_deref() {
            Some(year) => name == format!("{title} ({year})"),
            None => false,
        }
    }

    fn season_folder_names(season: u32) -> [String; 3] {
        [
            format!("season {season}"),
            format!("season {season:02}"),
            format!("s{season:02}"),
        ]
    }

    async fn subfolder_names(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read library folder {}: {}", dir.display(), e);
                return names;
            }
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|t| t.is_dir())
                        .unwrap_or(false);
                    if is_dir {
                        names.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Error listing {}: {}", dir.display(), e);
                    break;
                }
            }
        }
        names
    }
}

#[async_trait]
impl LibraryIndex for DirectoryLibraryIndex {
    async fn exists(&self, media: &RecognizedMedia, season: Option<u32>) -> bool {
        for root in &self.roots {
            for show_folder in Self::subfolder_names(root).await {
                if !Self::folder_matches(&show_folder, media) {
                    continue;
                }

                let Some(season) = season else {
                    debug!("Found {} in library at {}", media.title_year(), root.display());
                    return true;
                };

                let wanted = Self::season_folder_names(season);
                let show_path = root.join(&show_folder);
                let has_season = Self::subfolder_names(&show_path)
                    .await
                    .iter()
                    .any(|name| wanted.contains(&name.trim().to_lowercase()));
                if has_season {
                    debug!(
                        "Found {} season {} in library at {}",
                        media.title_year(),
                        season,
                        show_path.display()
                    );
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;

    fn media(title: &str, year: Option<&str>, tmdb_id: u64) -> RecognizedMedia {
        RecognizedMedia {
            tmdb_id,
            title: title.to_string(),
            year: year.map(str::to_string),
            media_type: MediaType::Tv,
            overview: None,
            poster_url: None,
            backdrop_url: None,
        }
    }

    #[tokio::test]
    async fn test_matches_title_year_folder() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("繁花 (2023)").join("Season 1")).unwrap();
        let index = DirectoryLibraryIndex::new(vec![root.path().to_path_buf()]);

        assert!(index.exists(&media("繁花", Some("2023"), 1), None).await);
        assert!(index.exists(&media("繁花", Some("2023"), 1), Some(1)).await);
        assert!(!index.exists(&media("繁花", Some("2023"), 1), Some(2)).await);
        assert!(!index.exists(&media("繁花", Some("2024"), 1), None).await);
    }

    #[tokio::test]
    async fn test_matches_tmdb_tag_and_season_variants() {
        let root = tempfile::tempdir().unwrap();
        let show = root.path().join("Some Show {tmdb-42}");
        std::fs::create_dir_all(show.join("S02")).unwrap();
        std::fs::create_dir_all(show.join("Season 03")).unwrap();
        let index = DirectoryLibraryIndex::new(vec![root.path().to_path_buf()]);

        let m = media("Different Title", None, 42);
        assert!(index.exists(&m, Some(2)).await);
        assert!(index.exists(&m, Some(3)).await);
        assert!(!index.exists(&m, Some(4)).await);
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let index = DirectoryLibraryIndex::new(vec![PathBuf::from("/definitely/not/here")]);
        assert!(!index.exists(&media("Show", None, 1), None).await);
    }

    #[tokio::test]
    async fn test_files_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("Show"), b"not a folder").unwrap();
        let index = DirectoryLibraryIndex::new(vec![root.path().to_path_buf()]);
        assert!(!index.exists(&media("Show", None, 1), None).await);
    }
}
