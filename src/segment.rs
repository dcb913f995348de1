//! Word segmentation shared by the trainer and the runtime tokenizer.
//!
//! A word is a sequence of symbols: initially its characters plus the
//! end-of-word marker, progressively coarsened by merges. Training and
//! encoding both rely on the same left-to-right scan that replaces adjacent
//! pair occurrences and continues after each replacement, so overlapping
//! occurrences are never re-merged within one pass (`a a a` with pair
//! `(a, a)` becomes `aa a`, and `a a a a` becomes `aa aa`).

use crate::model::{Pair, TokenId};
use crate::vocab::Symbol;

/// Outcome of merging a specific pair within a [`Word`].
#[derive(Debug, Default)]
pub(crate) struct MergeOutcome {
    /// Number of pair occurrences replaced, scaled by the word weight.
    pub merges: usize,
    /// Pair count deltas emitted by the merge, scaled by the word weight.
    /// Negative values represent removed adjacencies, positive values newly
    /// formed ones.
    pub deltas: Vec<(Pair, i64)>,
}

/// Segmentation of one distinct word as interned symbol ids.
///
/// The weight is the word's contribution per pair occurrence: one by
/// default, or the corpus frequency when frequency weighting is enabled.
#[derive(Clone, Debug)]
pub(crate) struct Word {
    symbols: Vec<TokenId>,
    weight: usize,
}

impl Word {
    pub(crate) fn new(symbols: Vec<TokenId>, weight: usize) -> Self {
        Self { symbols, weight }
    }

    /// Returns true when the word contains at least two symbols.
    pub(crate) fn has_pairs(&self) -> bool {
        self.symbols.len() >= 2
    }

    pub(crate) fn weight(&self) -> usize {
        self.weight
    }

    pub(crate) fn symbols(&self) -> &[TokenId] {
        &self.symbols
    }

    /// Invokes the closure for each adjacent symbol pair occurrence.
    pub(crate) fn for_each_pair<F>(&self, mut f: F)
    where
        F: FnMut(Pair),
    {
        for window in self.symbols.windows(2) {
            f((window[0], window[1]));
        }
    }

    /// Applies the selected merge pair throughout the word and returns the
    /// resulting adjacency deltas.
    pub(crate) fn merge(&mut self, left: TokenId, right: TokenId, replacement: TokenId) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        if self.symbols.len() < 2 {
            return outcome;
        }
        let weight = self.weight as i64;

        let mut i = 0usize;
        while i + 1 < self.symbols.len() {
            if self.symbols[i] == left && self.symbols[i + 1] == right {
                let prev = if i > 0 { Some(self.symbols[i - 1]) } else { None };
                let next = if i + 2 < self.symbols.len() {
                    Some(self.symbols[i + 2])
                } else {
                    None
                };

                // Adjacencies consumed by the replacement.
                if let Some(prev) = prev {
                    outcome.deltas.push(((prev, left), -weight));
                }
                outcome.deltas.push(((left, right), -weight));
                if let Some(next) = next {
                    outcome.deltas.push(((right, next), -weight));
                }

                // Merge the pair in place.
                self.symbols[i] = replacement;
                self.symbols.remove(i + 1);
                outcome.merges += self.weight;

                // Adjacencies formed with the merged symbol.
                if let Some(prev) = prev {
                    outcome.deltas.push(((prev, replacement), weight));
                }
                if let Some(next) = next {
                    outcome.deltas.push(((replacement, next), weight));
                }
            }
            i += 1;
        }

        outcome
    }
}

/// Merges every adjacent `(left, right)` occurrence in a string-symbol
/// sequence, writing `merged` in its place, and returns the number of
/// replacements. Same scan as [`Word::merge`], used when replaying learned
/// rules over a word at encode time.
pub(crate) fn merge_symbol_pair(
    symbols: &mut Vec<Symbol>,
    left: &str,
    right: &str,
    merged: &Symbol,
) -> usize {
    if symbols.len() < 2 {
        return 0;
    }
    let mut replaced = 0usize;
    let mut i = 0usize;
    while i + 1 < symbols.len() {
        if symbols[i].as_str() == left && symbols[i + 1].as_str() == right {
            symbols[i] = merged.clone();
            symbols.remove(i + 1);
            replaced += 1;
        }
        i += 1;
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_sum(outcome: &MergeOutcome, pair: Pair) -> i64 {
        outcome
            .deltas
            .iter()
            .filter(|(key, _)| *key == pair)
            .map(|(_, delta)| delta)
            .sum()
    }

    #[test]
    fn merge_replaces_all_occurrences() {
        let mut word = Word::new(vec![1, 2, 1, 2, 3], 1);
        assert!(word.has_pairs());
        let outcome = word.merge(1, 2, 9);
        assert_eq!(outcome.merges, 2);
        assert_eq!(word.symbols(), &[9, 9, 3]);
        assert_eq!(delta_sum(&outcome, (1, 2)), -2);
    }

    #[test]
    fn overlapping_occurrences_merge_forward() {
        let mut word = Word::new(vec![5, 5, 5], 1);
        let outcome = word.merge(5, 5, 9);
        assert_eq!(outcome.merges, 1);
        assert_eq!(word.symbols(), &[9, 5]);

        let mut word = Word::new(vec![5, 5, 5, 5], 1);
        let outcome = word.merge(5, 5, 9);
        assert_eq!(outcome.merges, 2);
        assert_eq!(word.symbols(), &[9, 9]);
        assert_eq!(delta_sum(&outcome, (5, 5)), -3);
        assert_eq!(delta_sum(&outcome, (9, 9)), 1);
    }

    #[test]
    fn deltas_account_for_neighbors() {
        let mut word = Word::new(vec![7, 1, 2, 8], 1);
        let outcome = word.merge(1, 2, 9);
        assert_eq!(delta_sum(&outcome, (7, 1)), -1);
        assert_eq!(delta_sum(&outcome, (2, 8)), -1);
        assert_eq!(delta_sum(&outcome, (7, 9)), 1);
        assert_eq!(delta_sum(&outcome, (9, 8)), 1);
    }

    #[test]
    fn weight_scales_merges_and_deltas() {
        let mut word = Word::new(vec![1, 2], 3);
        let outcome = word.merge(1, 2, 9);
        assert_eq!(outcome.merges, 3);
        assert_eq!(outcome.deltas, vec![((1, 2), -3)]);
    }

    #[test]
    fn merge_without_match_is_a_no_op() {
        let mut word = Word::new(vec![1, 2, 3], 1);
        let outcome = word.merge(2, 1, 9);
        assert_eq!(outcome.merges, 0);
        assert!(outcome.deltas.is_empty());
        assert_eq!(word.symbols(), &[1, 2, 3]);
    }

    #[test]
    fn string_scan_matches_id_scan() {
        let mut symbols = vec![Symbol::new("a"), Symbol::new("b"), Symbol::new("c")];
        let replaced = merge_symbol_pair(&mut symbols, "a", "b", &Symbol::new("ab"));
        assert_eq!(replaced, 1);
        assert_eq!(symbols, vec![Symbol::new("ab"), Symbol::new("c")]);

        let mut symbols = vec![Symbol::new("a"); 4];
        let replaced = merge_symbol_pair(&mut symbols, "a", "a", &Symbol::new("aa"));
        assert_eq!(replaced, 2);
        assert_eq!(symbols, vec![Symbol::new("aa"), Symbol::new("aa")]);
    }
}
