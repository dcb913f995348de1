//! Insertion-ordered vocabulary interning symbols to dense identifiers.

use ahash::AHashMap;
use compact_str::CompactString;

use crate::error::{Result, WbpeError};
use crate::model::TokenId;

/// String unit of segmentation: a single character, a character sequence
/// produced by merges, or a reserved special token. Compared by value.
pub type Symbol = CompactString;

/// Identifiers of the reserved special tokens inside a [`Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialIds {
    /// End-of-word marker appended to every word before merging.
    pub end_of_word: TokenId,
    /// Replacement for characters missing from the vocabulary.
    pub unknown: TokenId,
}

/// Set of all known symbols with stable, dense identifiers.
///
/// Symbols are stored in insertion order and never move: a [`TokenId`] is the
/// index its symbol was interned at, so ids double as the bidirectional
/// symbol/index mapping and stay valid for the model's whole lifetime. The
/// reserved specials always occupy the first slots.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    symbols: Vec<Symbol>,
    ids: AHashMap<Symbol, TokenId>,
    special: SpecialIds,
}

impl Vocabulary {
    /// Creates a vocabulary seeded with the two reserved specials.
    ///
    /// The marker is interned first, the unknown token second. Callers are
    /// expected to have validated that the two strings are distinct.
    #[must_use]
    pub fn with_specials(end_of_word: &str, unknown: &str) -> Self {
        let mut vocab = Self {
            symbols: Vec::new(),
            ids: AHashMap::new(),
            special: SpecialIds {
                end_of_word: 0,
                unknown: 0,
            },
        };
        vocab.special.end_of_word = vocab.intern(end_of_word);
        vocab.special.unknown = vocab.intern(unknown);
        vocab
    }

    /// Rebuilds a vocabulary from symbols in id order, locating the specials.
    ///
    /// Used when deserialising a stored model; rejects duplicate symbols and
    /// symbol lists missing either special.
    pub(crate) fn from_symbols(
        symbols: Vec<Symbol>,
        end_of_word: &str,
        unknown: &str,
    ) -> Result<Self> {
        if symbols.len() > TokenId::MAX as usize {
            return Err(WbpeError::Serialization(format!(
                "vocabulary of {} symbols exceeds the TokenId range",
                symbols.len()
            )));
        }
        let mut ids = AHashMap::with_capacity(symbols.len());
        for (idx, symbol) in symbols.iter().enumerate() {
            if ids.insert(symbol.clone(), idx as TokenId).is_some() {
                return Err(WbpeError::Serialization(format!(
                    "duplicate vocabulary symbol {symbol:?}"
                )));
            }
        }
        let end_of_word = *ids.get(end_of_word).ok_or_else(|| {
            WbpeError::Serialization("vocabulary is missing the end-of-word marker".into())
        })?;
        let unknown = *ids.get(unknown).ok_or_else(|| {
            WbpeError::Serialization("vocabulary is missing the unknown token".into())
        })?;
        Ok(Self {
            symbols,
            ids,
            special: SpecialIds {
                end_of_word,
                unknown,
            },
        })
    }

    /// Interns a symbol, returning the existing id when it is already present.
    ///
    /// More than `u32::MAX` distinct symbols cannot occur: seeding is bounded
    /// by the Unicode scalar count and growth by the validated target size.
    pub fn intern(&mut self, symbol: &str) -> TokenId {
        if let Some(&id) = self.ids.get(symbol) {
            return id;
        }
        let id = self.symbols.len() as TokenId;
        let symbol = Symbol::new(symbol);
        self.symbols.push(symbol.clone());
        self.ids.insert(symbol, id);
        id
    }

    /// Looks up the id of a symbol.
    #[must_use]
    pub fn id(&self, symbol: &str) -> Option<TokenId> {
        self.ids.get(symbol).copied()
    }

    /// Returns the symbol behind an id when the id is in range.
    #[must_use]
    pub fn symbol(&self, id: TokenId) -> Option<&str> {
        self.symbols.get(id as usize).map(Symbol::as_str)
    }

    /// Returns true when the symbol has been interned.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.ids.contains_key(symbol)
    }

    /// Number of distinct symbols, specials included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true when no symbols have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbols in insertion (id) order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Ids of the reserved special tokens.
    #[must_use]
    pub fn special_ids(&self) -> SpecialIds {
        self.special
    }

    /// The end-of-word marker string.
    #[must_use]
    pub fn end_of_word(&self) -> &str {
        &self.symbols[self.special.end_of_word as usize]
    }

    /// The unknown token string.
    #[must_use]
    pub fn unknown(&self) -> &str {
        &self.symbols[self.special.unknown as usize]
    }
}
