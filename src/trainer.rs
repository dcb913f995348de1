//! Core training loop learning merge rules from word frequencies.

use std::cmp::Ordering;
use std::collections::{hash_map::Entry, BinaryHeap};
use std::convert::TryFrom;
use std::time::Instant;
use std::{fmt, path::Path};

use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::config::{IngestConfig, TrainerBuilder, TrainerConfig};
use crate::corpus::{load_text_corpus, WordCounts};
use crate::error::{Result, WbpeError};
use crate::metrics::{sample_rss_kb, IterationMetrics, StopReason, TrainingMetrics};
use crate::model::{BpeModel, Pair, TokenId};
use crate::segment::Word;
use crate::vocab::Vocabulary;

/// High-level façade configuring and executing BPE training runs.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainerConfig,
}

/// Artifacts returned after a training session completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct TrainerArtifacts {
    /// Trained BPE model.
    pub model: BpeModel,
    /// Detailed metrics captured during training.
    pub metrics: TrainingMetrics,
    /// Word frequency table the model was trained on.
    pub word_counts: WordCounts,
    /// Final segmentation of each distinct word, aligned with
    /// [`WordCounts::words`] order.
    pub segmentations: Vec<Vec<TokenId>>,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: TrainerConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`TrainerBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    /// Trains a model by loading text files from disk according to [`IngestConfig`].
    pub fn train_from_paths<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        ingest: &IngestConfig,
    ) -> Result<TrainerArtifacts> {
        let text = load_text_corpus(inputs, ingest)?;
        self.train(&text)
    }

    /// Trains a model from an in-memory text corpus.
    ///
    /// The corpus is split on Unicode whitespace; an empty corpus yields a
    /// model containing only the special tokens.
    pub fn train(&self, corpus: &str) -> Result<TrainerArtifacts> {
        self.train_from_counts(&WordCounts::from_text(corpus))
    }

    /// Trains a model from a pre-computed word frequency table.
    pub fn train_from_counts(&self, counts: &WordCounts) -> Result<TrainerArtifacts> {
        self.cfg.validate()?;

        let mut vocab =
            Vocabulary::with_specials(&self.cfg.end_of_word_marker, &self.cfg.unknown_token);
        let mut words = seed_words(counts, &mut vocab, self.cfg.weight_by_frequency);
        if self.cfg.debug {
            debug!(
                "seeded {} symbols from {} distinct words",
                vocab.len(),
                words.len()
            );
        }

        let mut merges: Vec<Pair> = Vec::new();
        let mut pair_counts = compute_pair_counts(&words);
        let mut heap = BinaryHeap::with_capacity(pair_counts.len().max(1));
        for (&pair, &count) in &pair_counts {
            if count >= self.cfg.min_frequency {
                heap.push(PairScore::new(pair, count));
            }
        }

        let remaining = self.cfg.target_vocab_size.saturating_sub(vocab.len());
        let mut metrics = TrainingMetrics::new(remaining.min(16_384));
        let mut iteration = 0usize;
        let training_start = Instant::now();

        while vocab.len() < self.cfg.target_vocab_size {
            let iteration_start = Instant::now();
            let best_candidate = loop {
                match heap.pop() {
                    Some(score) => {
                        let current = pair_counts.get(&score.pair).copied().unwrap_or(0);
                        if current == 0 || current != score.frequency {
                            continue;
                        }
                        if current < self.cfg.min_frequency {
                            continue;
                        }
                        break Some((score.pair, current));
                    }
                    None => break None,
                }
            };

            let Some((best_pair, frequency)) = best_candidate else {
                metrics.stop_reason = StopReason::NoEligiblePairs;
                break;
            };

            // Duplicate merged strings resolve to the existing id, so the
            // vocabulary grows by at most one entry per iteration.
            let merged = merged_symbol(&vocab, best_pair)?;
            let new_token = vocab.intern(&merged);

            let total_merges =
                apply_merge(&mut words, best_pair, new_token, &mut pair_counts, &mut heap);
            if total_merges == 0 {
                metrics.stop_reason = StopReason::NoEligiblePairs;
                break;
            }

            merges.push(best_pair);
            iteration += 1;

            if self.cfg.debug {
                debug!(
                    "iteration {iteration} merged ({}, {}) into {merged:?} at frequency {frequency}",
                    best_pair.0, best_pair.1
                );
            }
            if self.cfg.show_progress {
                info!(
                    "iter {:>6} freq {:>8} merges {:>8} distinct_pairs {:>8} vocab {:>8}",
                    iteration,
                    frequency,
                    total_merges,
                    pair_counts.len(),
                    vocab.len()
                );
            }

            metrics.iterations.push(IterationMetrics {
                iteration,
                best_frequency: frequency,
                merges_applied: total_merges,
                distinct_pairs: pair_counts.len(),
                vocab_size: vocab.len(),
                elapsed_iteration: iteration_start.elapsed(),
                elapsed_total: training_start.elapsed(),
                rss_kb: sample_rss_kb(),
            });
        }

        let total_duration = training_start.elapsed();
        metrics.total_duration = total_duration;

        if self.cfg.show_progress {
            info!(
                "completed {} merges in {total_duration:.2?}; vocab size {}",
                merges.len(),
                vocab.len()
            );
        }

        let segmentations = words
            .iter()
            .map(|word| word.symbols().to_vec())
            .collect();
        let model = BpeModel::new(vocab, merges, self.cfg.clone());
        Ok(TrainerArtifacts {
            model,
            metrics,
            word_counts: counts.clone(),
            segmentations,
        })
    }
}

/// Seeds the vocabulary with every corpus character and builds the initial
/// per-word segmentations.
fn seed_words(counts: &WordCounts, vocab: &mut Vocabulary, weight_by_frequency: bool) -> Vec<Word> {
    let end_of_word = vocab.special_ids().end_of_word;
    let mut words = Vec::with_capacity(counts.len());
    let mut buf = [0u8; 4];
    for (word, count) in counts.iter() {
        let mut symbols = Vec::with_capacity(word.chars().count() + 1);
        for ch in word.chars() {
            symbols.push(vocab.intern(ch.encode_utf8(&mut buf)));
        }
        symbols.push(end_of_word);
        let weight = if weight_by_frequency { count } else { 1 };
        words.push(Word::new(symbols, weight));
    }
    words
}

fn merged_symbol(vocab: &Vocabulary, pair: Pair) -> Result<String> {
    let left = vocab.symbol(pair.0).ok_or_else(|| {
        WbpeError::Internal(format!("merge references unknown token id {}", pair.0))
    })?;
    let right = vocab.symbol(pair.1).ok_or_else(|| {
        WbpeError::Internal(format!("merge references unknown token id {}", pair.1))
    })?;
    let mut merged = String::with_capacity(left.len() + right.len());
    merged.push_str(left);
    merged.push_str(right);
    Ok(merged)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct PairScore {
    frequency: usize,
    pair: Pair,
}

impl PairScore {
    fn new(pair: Pair, frequency: usize) -> Self {
        Self { frequency, pair }
    }
}

impl Ord for PairScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.frequency
            .cmp(&other.frequency)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for PairScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compute_pair_counts(words: &[Word]) -> FxHashMap<Pair, usize> {
    words
        .par_iter()
        .map(|word| {
            let mut local = FxHashMap::default();
            if !word.has_pairs() {
                return local;
            }
            let weight = word.weight();
            word.for_each_pair(|pair| {
                *local.entry(pair).or_insert(0) += weight;
            });
            local
        })
        .reduce(FxHashMap::default, |mut acc, local| {
            for (pair, count) in local {
                *acc.entry(pair).or_insert(0) += count;
            }
            acc
        })
}

#[derive(Default)]
struct MergeAdjustments {
    deltas: FxHashMap<Pair, i64>,
    merges: usize,
}

fn apply_delta(
    pair_counts: &mut FxHashMap<Pair, usize>,
    heap: &mut BinaryHeap<PairScore>,
    pair: Pair,
    delta: i64,
) {
    match delta.cmp(&0) {
        Ordering::Greater => {
            let amount = usize::try_from(delta.unsigned_abs())
                .expect("positive delta magnitude must fit in usize");
            let count = pair_counts.entry(pair).or_insert(0);
            *count += amount;
            heap.push(PairScore::new(pair, *count));
        }
        Ordering::Less => {
            let amount = usize::try_from(delta.unsigned_abs())
                .expect("negative delta magnitude must fit in usize");
            if let Entry::Occupied(mut occupied) = pair_counts.entry(pair) {
                let current = *occupied.get();
                let new_value = current.saturating_sub(amount);
                if new_value == 0 {
                    occupied.remove();
                } else {
                    *occupied.get_mut() = new_value;
                    heap.push(PairScore::new(pair, new_value));
                }
            }
        }
        Ordering::Equal => {}
    }
}

fn apply_merge(
    words: &mut [Word],
    pair: Pair,
    new_token: TokenId,
    pair_counts: &mut FxHashMap<Pair, usize>,
    heap: &mut BinaryHeap<PairScore>,
) -> usize {
    let aggregate = words
        .par_iter_mut()
        .map(|word| word.merge(pair.0, pair.1, new_token))
        .fold(MergeAdjustments::default, |mut acc, outcome| {
            acc.merges += outcome.merges;
            for (pair_key, delta) in outcome.deltas {
                *acc.deltas.entry(pair_key).or_insert(0) += delta;
            }
            acc
        })
        .reduce(MergeAdjustments::default, |mut acc, mut local| {
            acc.merges += local.merges;
            for (pair_key, delta) in local.deltas.drain() {
                *acc.deltas.entry(pair_key).or_insert(0) += delta;
            }
            acc
        });

    for (pair_key, delta) in aggregate.deltas {
        if delta != 0 {
            apply_delta(pair_counts, heap, pair_key, delta);
        }
    }

    aggregate.merges
}

impl fmt::Display for TrainerArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BPE model with vocab size {}", self.model.vocab_size())?;
        writeln!(f, "Merge rules learned: {}", self.model.merges().len())?;
        writeln!(f, "Stop reason: {:?}", self.metrics.stop_reason)?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}
