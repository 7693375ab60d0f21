//! Suffix-order construction and n-gram binary search.
//!
//! The suffix order of an attribute stream is the permutation of its
//! positions that sorts the n-gram starting at each position, under a
//! bounded comparator that treats sentence boundaries as end-of-suffix.
//! Building it costs O(n log n) comparisons of O([`NGRAM_LIMIT`]) symbols
//! each; afterwards any n-gram's occurrence block is found with two
//! binary searches.

use crate::index::store::U32Store;
use crate::index::types::{NGRAM_LIMIT, Position, SENTINEL, Symbol};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Streams above this many positions are sorted in parallel
const PAR_SORT_THRESHOLD: usize = 100_000;

/// A readable sequence of symbols: an attribute stream during sorting, a
/// query n-gram during search.
pub trait SymSeq {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Symbol;

    /// A side is exhausted once it runs off the end of its sequence or
    /// hits a sentence boundary; suffixes never compare across sentences.
    #[inline]
    fn exhausted(&self, index: usize) -> bool {
        index >= self.len() || self.get(index) == SENTINEL
    }
}

impl SymSeq for U32Store {
    fn len(&self) -> usize {
        U32Store::len(self)
    }

    fn get(&self, index: usize) -> Symbol {
        U32Store::get(self, index)
    }
}

impl SymSeq for [Symbol] {
    fn len(&self) -> usize {
        <[Symbol]>::len(self)
    }

    fn get(&self, index: usize) -> Symbol {
        self[index]
    }
}

/// Compare the n-gram starting at `pos_a` in `a` with the one starting at
/// `pos_b` in `b`.
///
/// Walks both sides forward while their symbols are equal, at most `limit`
/// steps, stopping early when either side is exhausted. `a_exhausted` and
/// `b_exhausted` are returned when only that side ends first; both ending
/// on the same step compares equal. Searching passes `Ordering::Equal` for
/// the query side so that running out of query symbols counts as an exact
/// prefix match.
///
/// The ordering is lexicographic over symbol IDs, which follow first-seen
/// order, so it is a canonical internal order rather than an alphabetical
/// one.
pub fn compare_ngrams<A, B>(
    a: &A,
    mut pos_a: usize,
    b: &B,
    mut pos_b: usize,
    a_exhausted: Ordering,
    b_exhausted: Ordering,
    limit: usize,
) -> Ordering
where
    A: SymSeq + ?Sized,
    B: SymSeq + ?Sized,
{
    let mut steps = 0;
    loop {
        match (a.exhausted(pos_a), b.exhausted(pos_b)) {
            (true, true) => return Ordering::Equal,
            (true, false) => return a_exhausted,
            (false, true) => return b_exhausted,
            (false, false) => {}
        }

        let (x, y) = (a.get(pos_a), b.get(pos_b));
        if x != y || steps == limit {
            return x.cmp(&y);
        }

        pos_a += 1;
        pos_b += 1;
        steps += 1;
    }
}

/// Sort all positions of `corpus` into suffix order.
pub fn build_suffix_order(corpus: &U32Store) -> Vec<Position> {
    let mut order: Vec<Position> = (0..corpus.len() as Position).collect();

    let by_suffix = |&a: &Position, &b: &Position| {
        compare_ngrams(
            corpus,
            a as usize,
            corpus,
            b as usize,
            Ordering::Less,
            Ordering::Greater,
            NGRAM_LIMIT,
        )
    };

    if order.len() > PAR_SORT_THRESHOLD {
        order.par_sort_unstable_by(by_suffix);
    } else {
        order.sort_unstable_by(by_suffix);
    }

    order
}

fn suffix_cmp(corpus: &U32Store, pos: Position, ngram: &[Symbol]) -> Ordering {
    // Reaching the end of the query is an exact prefix match
    compare_ngrams(
        corpus,
        pos as usize,
        ngram,
        0,
        Ordering::Less,
        Ordering::Equal,
        NGRAM_LIMIT,
    )
}

/// Least rank in `[lo, hi)` whose suffix compares `>= ngram`, or `hi` if
/// none does.
pub(crate) fn lower_bound(
    corpus: &U32Store,
    order: &U32Store,
    ngram: &[Symbol],
    mut lo: usize,
    mut hi: usize,
) -> usize {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if suffix_cmp(corpus, order.get(mid), ngram) == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}

/// Least rank in `[lo, hi)` whose suffix compares `> ngram`, or `hi` if
/// none does.
pub(crate) fn upper_bound(
    corpus: &U32Store,
    order: &U32Store,
    ngram: &[Symbol],
    mut lo: usize,
    mut hi: usize,
) -> usize {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if suffix_cmp(corpus, order.get(mid), ngram) == Ordering::Greater {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(values: &[u32]) -> U32Store {
        U32Store::from_vec(values.to_vec())
    }

    // "the cat sat # the dog ran #" as IDs
    fn two_sentences() -> U32Store {
        store(&[1, 2, 3, 0, 1, 4, 5, 0])
    }

    fn sort_cmp(corpus: &U32Store, a: usize, b: usize) -> Ordering {
        compare_ngrams(
            corpus,
            a,
            corpus,
            b,
            Ordering::Less,
            Ordering::Greater,
            NGRAM_LIMIT,
        )
    }

    #[test]
    fn test_equal_prefix_shorter_side_sorts_first() {
        // [1 2 0 ...] vs [1 2 3 0]
        let corpus = store(&[1, 2, 0, 1, 2, 3, 0]);
        assert_eq!(sort_cmp(&corpus, 0, 3), Ordering::Less);
        assert_eq!(sort_cmp(&corpus, 3, 0), Ordering::Greater);
    }

    #[test]
    fn test_differing_symbol_decides() {
        let corpus = two_sentences();
        // [2 3 0...] vs [4 5 0...]
        assert_eq!(sort_cmp(&corpus, 1, 5), Ordering::Less);
        // identical single-symbol prefix, then 2 vs 4
        assert_eq!(sort_cmp(&corpus, 0, 4), Ordering::Less);
    }

    #[test]
    fn test_sentinel_ends_both_sides() {
        let corpus = two_sentences();
        // Positions 3 and 7 both sit on a boundary: empty vs empty
        assert_eq!(sort_cmp(&corpus, 3, 7), Ordering::Equal);
    }

    #[test]
    fn test_comparison_stops_at_limit() {
        // Two long identical runs differing only after NGRAM_LIMIT tokens
        let mut left: Vec<u32> = (1..=(NGRAM_LIMIT as u32 + 2)).collect();
        let mut right = left.clone();
        left.push(100);
        right.push(200);
        left.push(0);
        right.push(0);

        let mut stream = left.clone();
        let right_start = stream.len();
        stream.extend_from_slice(&right);
        let corpus = store(&stream);

        // The runs differ only at index NGRAM_LIMIT + 2, beyond the
        // comparator's horizon of limit + 1 symbols.
        assert_eq!(sort_cmp(&corpus, 0, right_start), Ordering::Equal);
        assert_eq!(sort_cmp(&corpus, 1, right_start + 1), Ordering::Equal);
        // Two positions in, the differing symbols fall on the horizon.
        assert_eq!(sort_cmp(&corpus, 2, right_start + 2), Ordering::Less);
    }

    #[test]
    fn test_build_order_is_sorted_permutation() {
        let corpus = two_sentences();
        let order = build_suffix_order(&corpus);

        assert_eq!(order.len(), corpus.len());
        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..corpus.len() as Position).collect::<Vec<_>>());

        for pair in order.windows(2) {
            assert_ne!(
                sort_cmp(&corpus, pair[0] as usize, pair[1] as usize),
                Ordering::Greater,
                "suffixes {} and {} out of order",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_bounds_delimit_occurrences() {
        let corpus = two_sentences();
        let order = U32Store::from_vec(build_suffix_order(&corpus));
        let n = order.len();

        // "the" occurs twice
        let lo = lower_bound(&corpus, &order, &[1], 0, n);
        let hi = upper_bound(&corpus, &order, &[1], lo, n);
        assert_eq!(hi - lo, 2);

        // "the cat" occurs once
        let lo = lower_bound(&corpus, &order, &[1, 2], 0, n);
        let hi = upper_bound(&corpus, &order, &[1, 2], lo, n);
        assert_eq!(hi - lo, 1);
        assert_eq!(order.get(lo), 0);

        // unseen symbol
        let lo = lower_bound(&corpus, &order, &[9], 0, n);
        let hi = upper_bound(&corpus, &order, &[9], lo, n);
        assert_eq!(lo, hi);
    }

    #[test]
    fn test_ngram_does_not_cross_sentence_boundary() {
        // "sat the" never occurs: 3 is followed by a boundary
        let corpus = two_sentences();
        let order = U32Store::from_vec(build_suffix_order(&corpus));
        let n = order.len();

        let lo = lower_bound(&corpus, &order, &[3, 1], 0, n);
        let hi = upper_bound(&corpus, &order, &[3, 1], lo, n);
        assert_eq!(lo, hi);
    }
}
