//! Configuration builders controlling training and corpus ingestion.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WbpeError};
use crate::special_tokens::{DEFAULT_END_OF_WORD, DEFAULT_UNKNOWN};

/// Policy applied to characters missing from the vocabulary at encode time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Keep the literal character as its own symbol; it may surface as a
    /// token outside the trained vocabulary.
    #[default]
    Passthrough,
    /// Replace the character with the reserved unknown token before merging.
    Substitute,
}

/// Configuration for word-level BPE training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerConfig {
    /// Target vocabulary size including the special tokens and every
    /// character seeded from the corpus.
    pub target_vocab_size: usize,
    /// Minimum number of pair occurrences required before a merge is considered.
    pub min_frequency: usize,
    /// Handling of characters absent from the vocabulary at encode time.
    pub unknown_policy: UnknownPolicy,
    /// Multiplies each word's pair contributions by its corpus frequency
    /// instead of counting every distinct word once.
    pub weight_by_frequency: bool,
    /// End-of-word marker appended to every word during segmentation.
    pub end_of_word_marker: String,
    /// Token substituted for unknown characters under [`UnknownPolicy::Substitute`].
    pub unknown_token: String,
    /// Enables per-iteration logging through the `log` facade.
    pub show_progress: bool,
    /// Dumps segmentation and merge state through the `log` facade at debug
    /// level. Has no effect on tokenization results.
    pub debug: bool,
}

impl TrainerConfig {
    /// Returns a builder initialised with [`TrainerConfig::default`].
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::default()
    }

    /// Validates the invariants required for training.
    pub fn validate(&self) -> Result<()> {
        if self.target_vocab_size == 0 {
            return Err(WbpeError::InvalidConfig(
                "target_vocab_size must be greater than zero".into(),
            ));
        }
        let max_vocab = usize::try_from(u32::MAX).unwrap_or(usize::MAX);
        if self.target_vocab_size > max_vocab {
            return Err(WbpeError::InvalidConfig(format!(
                "target_vocab_size ({}) exceeds {max_vocab}, the maximum representable TokenId",
                self.target_vocab_size
            )));
        }
        if self.min_frequency == 0 {
            return Err(WbpeError::InvalidConfig(
                "min_frequency must be greater than zero".into(),
            ));
        }
        if self.end_of_word_marker.is_empty() {
            return Err(WbpeError::InvalidConfig(
                "end_of_word_marker must not be empty".into(),
            ));
        }
        if self.unknown_token.is_empty() {
            return Err(WbpeError::InvalidConfig(
                "unknown_token must not be empty".into(),
            ));
        }
        if self.end_of_word_marker == self.unknown_token {
            return Err(WbpeError::InvalidConfig(
                "end_of_word_marker and unknown_token must be distinct".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            target_vocab_size: 1_024,
            min_frequency: 1,
            unknown_policy: UnknownPolicy::default(),
            weight_by_frequency: false,
            end_of_word_marker: DEFAULT_END_OF_WORD.into(),
            unknown_token: DEFAULT_UNKNOWN.into(),
            show_progress: true,
            debug: false,
        }
    }
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TrainerBuilder {
    cfg: TrainerConfig,
}

impl TrainerBuilder {
    /// Creates a builder with [`TrainerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the desired vocabulary size (specials and seeded characters included).
    #[must_use]
    pub fn target_vocab_size(mut self, value: usize) -> Self {
        self.cfg.target_vocab_size = value;
        self
    }

    /// Sets the minimum merge frequency.
    #[must_use]
    pub fn min_frequency(mut self, value: usize) -> Self {
        self.cfg.min_frequency = value;
        self
    }

    /// Sets the policy for characters missing from the vocabulary.
    #[must_use]
    pub fn unknown_policy(mut self, policy: UnknownPolicy) -> Self {
        self.cfg.unknown_policy = policy;
        self
    }

    /// Weights pair statistics by word frequency instead of counting each
    /// distinct word once.
    #[must_use]
    pub fn weight_by_frequency(mut self, enabled: bool) -> Self {
        self.cfg.weight_by_frequency = enabled;
        self
    }

    /// Overrides the end-of-word marker symbol.
    #[must_use]
    pub fn end_of_word_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.cfg.end_of_word_marker = marker.into();
        self
    }

    /// Overrides the unknown token symbol.
    #[must_use]
    pub fn unknown_token<S: Into<String>>(mut self, token: S) -> Self {
        self.cfg.unknown_token = token.into();
        self
    }

    /// Enables or disables per-iteration logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Enables or disables debug-level state dumps.
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.cfg.debug = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`TrainerConfig`].
    pub fn build(self) -> Result<TrainerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration controlling how text corpora are read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Enables recursive directory traversal.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

impl IngestConfig {
    /// Returns a builder initialised with [`IngestConfig::default`].
    #[must_use]
    pub fn builder() -> IngestBuilder {
        IngestBuilder::default()
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug, Default, Clone)]
pub struct IngestBuilder {
    cfg: IngestConfig,
}

impl IngestBuilder {
    /// Creates a new builder with [`IngestConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Finalises the builder, returning the [`IngestConfig`].
    pub fn build(self) -> IngestConfig {
        self.cfg
    }
}
