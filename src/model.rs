//! Model types and the runtime tokenizer replaying learned merge rules.

use std::path::Path;

use crate::config::{TrainerConfig, UnknownPolicy};
use crate::error::{Result, WbpeError};
use crate::segment::merge_symbol_pair;
use crate::serialization;
use crate::special_tokens;
use crate::trainer::Trainer;
use crate::vocab::{Symbol, Vocabulary};

/// Token identifier used throughout the crate.
pub type TokenId = u32;
/// Merge pair encoded as `(left, right)` token identifiers.
pub type Pair = (TokenId, TokenId);

/// Merge rule compiled to its symbol strings for rule replay at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRule {
    /// Left-hand symbol of the pair.
    pub left: Symbol,
    /// Right-hand symbol of the pair.
    pub right: Symbol,
    /// Concatenated symbol written in place of the pair.
    pub merged: Symbol,
}

/// Trained BPE model containing the learned vocabulary and merge table.
#[must_use]
#[derive(Debug, Clone)]
pub struct BpeModel {
    vocab: Vocabulary,
    merges: Vec<Pair>,
    config: TrainerConfig,
}

/// Tokenizer applying a trained model's merge rules to new text.
///
/// Rules are replayed over each word in the order they were learned, so a
/// tokenizer reproduces exactly the segmentations training converged to.
#[must_use]
#[derive(Debug, Clone)]
pub struct BpeTokenizer {
    vocab: Vocabulary,
    rules: Vec<MergeRule>,
    marker: Symbol,
    unknown: Symbol,
    policy: UnknownPolicy,
}

impl BpeModel {
    /// Constructs a new model from the supplied vocabulary, merges, and configuration.
    pub fn new(vocab: Vocabulary, merges: Vec<Pair>, config: TrainerConfig) -> Self {
        Self {
            vocab,
            merges,
            config,
        }
    }

    /// Returns the learned vocabulary.
    #[must_use]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Returns the merge table encoded as `(left, right)` token identifiers.
    #[must_use]
    pub fn merges(&self) -> &[Pair] {
        &self.merges
    }

    /// Returns the [`TrainerConfig`] used to produce the model.
    #[must_use]
    pub fn trainer_config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Returns the total vocabulary size including special tokens.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Builds a [`BpeTokenizer`] replaying this model's merge rules.
    pub fn tokenizer(&self) -> Result<BpeTokenizer> {
        BpeTokenizer::from_model(self)
    }

    /// Serialises the model to disk as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        serialization::save_model(self, path)
    }

    /// Loads a model previously written with [`BpeModel::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        serialization::load_model(path)
    }

    /// Serialises the model to a JSON string.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        serialization::model_json(self, pretty)
    }

    /// Deserialises a model from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        serialization::model_from_json(json)
    }
}

impl BpeTokenizer {
    /// Compiles a trained [`BpeModel`] into a tokenizer.
    pub fn from_model(model: &BpeModel) -> Result<Self> {
        let vocab = model.vocab().clone();
        let mut rules = Vec::with_capacity(model.merges().len());
        for &(left_id, right_id) in model.merges() {
            let left = resolve_symbol(&vocab, left_id)?;
            let right = resolve_symbol(&vocab, right_id)?;
            let mut merged = Symbol::with_capacity(left.len() + right.len());
            merged.push_str(&left);
            merged.push_str(&right);
            rules.push(MergeRule {
                left,
                right,
                merged,
            });
        }
        let marker = Symbol::from(vocab.end_of_word());
        let unknown = Symbol::from(vocab.unknown());
        let policy = model.trainer_config().unknown_policy;
        Ok(Self {
            vocab,
            rules,
            marker,
            unknown,
            policy,
        })
    }

    /// Trains a model on `corpus` and returns its tokenizer.
    pub fn train(corpus: &str, cfg: TrainerConfig) -> Result<Self> {
        let artifacts = Trainer::new(cfg).train(corpus)?;
        artifacts.model.tokenizer()
    }

    /// Encodes text into subword tokens.
    ///
    /// The text is split on Unicode whitespace and each word is segmented
    /// independently, so runs of whitespace do not influence the output.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<Symbol> {
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            tokens.extend(self.segment(word));
        }
        tokens
    }

    /// Segments a single word into subword tokens.
    ///
    /// The word is exploded into characters, terminated with the end-of-word
    /// marker, and every merge rule is replayed over it in learned order.
    #[must_use]
    pub fn segment(&self, word: &str) -> Vec<Symbol> {
        let mut symbols = Vec::with_capacity(word.chars().count() + 1);
        let mut buf = [0u8; 4];
        for ch in word.chars() {
            symbols.push(Symbol::new(ch.encode_utf8(&mut buf)));
        }
        symbols.push(self.marker.clone());

        if self.policy == UnknownPolicy::Substitute {
            for symbol in &mut symbols {
                if !self.vocab.contains(symbol.as_str()) {
                    *symbol = self.unknown.clone();
                }
            }
        }

        for rule in &self.rules {
            if symbols.len() < 2 {
                break;
            }
            merge_symbol_pair(&mut symbols, &rule.left, &rule.right, &rule.merged);
        }
        symbols
    }

    /// Reassembles text from subword tokens.
    ///
    /// Tokens accumulate into a word until one carries the end-of-word
    /// marker; markers are stripped and words are joined with single spaces.
    /// A trailing run of tokens that never reaches a marker is dropped.
    pub fn decode<S: AsRef<str>>(&self, tokens: &[S]) -> String {
        let marker = self.marker.as_str();
        let mut words: Vec<String> = Vec::new();
        let mut current = String::new();
        for token in tokens {
            let token = token.as_ref();
            current.push_str(token);
            if special_tokens::closes_word(token, marker) {
                words.push(special_tokens::strip_marker(&current, marker));
                current.clear();
            }
        }
        words.join(" ")
    }

    /// Returns the compiled merge rules in learned order.
    #[must_use]
    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    /// Returns the vocabulary the tokenizer was compiled from.
    #[must_use]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Returns the policy applied to characters missing from the vocabulary.
    #[must_use]
    pub fn unknown_policy(&self) -> UnknownPolicy {
        self.policy
    }

    /// Returns the end-of-word marker symbol.
    #[must_use]
    pub fn end_of_word_marker(&self) -> &str {
        &self.marker
    }

    /// Returns the unknown token symbol.
    #[must_use]
    pub fn unknown_token(&self) -> &str {
        &self.unknown
    }
}

fn resolve_symbol(vocab: &Vocabulary, id: TokenId) -> Result<Symbol> {
    vocab.symbol(id).map(Symbol::from).ok_or_else(|| {
        WbpeError::Internal(format!("merge references out-of-range token id {id}"))
    })
}
