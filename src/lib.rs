//! Word-level byte pair encoding (BPE) subword tokenizer library.
//!
//! The crate trains BPE merge rules over whitespace-delimited words and
//! applies them with a lightweight runtime tokenizer.  Words are exploded
//! into characters terminated by an end-of-word marker, the most frequent
//! adjacent symbol pair is merged until the target vocabulary size is
//! reached, and the learned rules are replayed in order at encode time.
//! Trained models serialise to a versioned JSON file.
//!
//! ```
//! use wbpe::{BpeTokenizer, TrainerConfig};
//!
//! # fn main() -> wbpe::Result<()> {
//! let cfg = TrainerConfig::builder()
//!     .target_vocab_size(64)
//!     .show_progress(false)
//!     .build()?;
//! let tokenizer = BpeTokenizer::train("the cat sat on the mat", cfg)?;
//! let tokens = tokenizer.encode("the cat");
//! assert_eq!(tokenizer.decode(&tokens), "the cat");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod model;
mod segment;
pub mod serialization;
pub mod special_tokens;
pub mod trainer;
pub mod vocab;

pub use config::{IngestBuilder, IngestConfig, TrainerBuilder, TrainerConfig, UnknownPolicy};
pub use corpus::WordCounts;
pub use error::{Result, WbpeError};
pub use metrics::{IterationMetrics, StopReason, TrainingMetrics};
pub use model::{BpeModel, BpeTokenizer, MergeRule, Pair, TokenId};
pub use trainer::{Trainer, TrainerArtifacts};
pub use vocab::{SpecialIds, Symbol, Vocabulary};
