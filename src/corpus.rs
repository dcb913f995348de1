//! Facilities for discovering input files and tallying word frequencies.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::error::{Result, WbpeError};

/// Frequency table over the distinct whitespace-delimited words of a corpus.
///
/// Words are kept in first-seen order, which fixes the order dictionaries are
/// scanned in during training and keeps runs over the same corpus
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct WordCounts {
    words: Vec<String>,
    counts: Vec<usize>,
    index: FxHashMap<String, usize>,
}

impl WordCounts {
    /// Builds a frequency table from raw text split on Unicode whitespace.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut counts = Self::default();
        for word in text.split_whitespace() {
            counts.add(word);
        }
        counts
    }

    /// Records one occurrence of `word`.
    pub fn add(&mut self, word: &str) {
        if let Some(&slot) = self.index.get(word) {
            self.counts[slot] += 1;
        } else {
            self.index.insert(word.to_string(), self.words.len());
            self.words.push(word.to_string());
            self.counts.push(1);
        }
    }

    /// Number of distinct words observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true when no words have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Occurrence count for `word`, zero when the word was never seen.
    #[must_use]
    pub fn count(&self, word: &str) -> usize {
        self.index.get(word).map_or(0, |&slot| self.counts[slot])
    }

    /// Total number of word occurrences, counting repeats.
    #[must_use]
    pub fn total_occurrences(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Iterates `(word, count)` entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    /// Distinct words in first-seen order.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Discovers files rooted at the provided input paths according to the ingest configuration.
///
/// Directories are traversed recursively by default; set [`IngestConfig::recursive`] to `false`
/// to limit discovery to the first level.  Symlink traversal is controlled through
/// [`IngestConfig::follow_symlinks`].
pub fn collect_paths<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(WbpeError::InvalidConfig(format!(
                "input path {path:?} does not exist"
            )));
        }
        let metadata = path
            .symlink_metadata()
            .map_err(|err| WbpeError::io(err, Some(path.to_path_buf())))?;
        if metadata.is_dir() {
            if cfg.recursive {
                let walker = WalkDir::new(path).follow_links(cfg.follow_symlinks);
                for entry in walker {
                    let entry = entry.map_err(|err| WbpeError::Internal(err.to_string()))?;
                    if entry.file_type().is_file() {
                        files.push(entry.path().to_path_buf());
                    }
                }
            } else {
                for entry in fs::read_dir(path)
                    .map_err(|err| WbpeError::io(err, Some(path.to_path_buf())))?
                {
                    let entry =
                        entry.map_err(|err| WbpeError::io(err, Some(path.to_path_buf())))?;
                    let entry_path = entry.path();
                    if entry_path.is_file() {
                        files.push(entry_path);
                    }
                }
            }
        } else if metadata.is_file() {
            files.push(path.to_path_buf());
        }
    }
    if files.is_empty() {
        return Err(WbpeError::InvalidConfig(
            "no files discovered in provided inputs".into(),
        ));
    }
    Ok(files)
}

/// Loads UTF-8 text corpora and concatenates them into a single document.
///
/// Files are loaded in discovery order and joined with newlines so word
/// boundaries at file edges are preserved.  Files that are not valid UTF-8
/// fail the load.
pub fn load_text_corpus<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<String> {
    let file_paths = collect_paths(inputs, cfg)?;
    let mut text = String::new();
    for file_path in file_paths {
        let contents = fs::read_to_string(&file_path)
            .map_err(|err| WbpeError::io(err, Some(file_path.clone())))?;
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&contents);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn word_counts_track_repeats() {
        let counts = WordCounts::from_text("low low lower  low\nnewest");
        assert_eq!(counts.len(), 3);
        assert_eq!(counts.count("low"), 3);
        assert_eq!(counts.count("lower"), 1);
        assert_eq!(counts.count("absent"), 0);
        assert_eq!(counts.total_occurrences(), 5);
    }

    #[test]
    fn word_counts_preserve_first_seen_order() {
        let counts = WordCounts::from_text("b a b c a");
        let words: Vec<_> = counts.iter().collect();
        assert_eq!(words, vec![("b", 2), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn word_counts_empty_text_yields_no_entries() {
        let counts = WordCounts::from_text("   \n\t  ");
        assert!(counts.is_empty());
        assert_eq!(counts.total_occurrences(), 0);
    }

    #[test]
    fn collect_paths_discovers_files_recursively() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("create nested directory");
        let file_a = dir.path().join("a.txt");
        let file_b = nested.join("b.txt");
        fs::write(&file_a, "alpha beta").expect("write a");
        fs::write(&file_b, "gamma").expect("write b");

        let cfg = IngestConfig {
            recursive: true,
            ..IngestConfig::default()
        };
        let mut paths = collect_paths(&[dir.path()], &cfg).expect("collect paths");
        paths.sort();
        assert_eq!(paths, vec![file_a, file_b]);
    }

    #[test]
    fn collect_paths_rejects_empty_directories() {
        let dir = tempdir().expect("tempdir");
        let err = collect_paths(&[dir.path()], &IngestConfig::default())
            .expect_err("empty directory should not yield paths");
        assert!(matches!(err, WbpeError::InvalidConfig(_)));
    }

    #[test]
    fn load_text_corpus_joins_files_with_newlines() {
        let dir = tempdir().expect("tempdir");
        let file_a = dir.path().join("a.txt");
        let file_b = dir.path().join("b.txt");
        fs::write(&file_a, "alpha beta").expect("write a");
        fs::write(&file_b, "gamma").expect("write b");

        let text =
            load_text_corpus(&[&file_a, &file_b], &IngestConfig::default()).expect("load corpus");
        assert_eq!(text, "alpha beta\ngamma");

        let counts = WordCounts::from_text(&text);
        assert_eq!(counts.count("beta"), 1);
        assert_eq!(counts.count("gamma"), 1);
    }

    #[test]
    fn load_text_corpus_rejects_invalid_utf8() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("data.bin");
        fs::write(&file, [0xFFu8, 0xFE, 0x00]).expect("write binary");

        let err = load_text_corpus(&[&file], &IngestConfig::default())
            .expect_err("binary file should fail UTF-8 load");
        assert!(matches!(err, WbpeError::Io { .. }));
    }
}
