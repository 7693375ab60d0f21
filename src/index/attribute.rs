//! Per-attribute index: symbol table, corpus stream, suffix order.

use crate::index::store::U32Store;
use crate::index::suffix::{build_suffix_order, lower_bound, upper_bound};
use crate::index::symbols::SymbolTable;
use crate::index::types::{ATTR_SEPARATOR, Position, SENTINEL, Symbol};
use crate::utils::suffixed_path;
use anyhow::{Result, bail, ensure};
use std::io::Write;
use std::path::{Path, PathBuf};

/// The complete index for one attribute of a corpus.
///
/// Owns the symbol table, the corpus stream (symbol IDs with a `0`
/// appended after every sentence) and the suffix order. Mutable only
/// during ingestion; after [`AttrIndex::build_suffix_array`] the whole
/// structure is read-only and any number of threads may query it.
#[derive(Debug)]
pub struct AttrIndex {
    pub(crate) corpus: U32Store,
    pub(crate) suffix: U32Store,
    pub(crate) symbols: SymbolTable,
}

impl AttrIndex {
    pub fn new() -> Self {
        Self {
            corpus: U32Store::new(),
            suffix: U32Store::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn corpus(&self) -> &U32Store {
        &self.corpus
    }

    pub fn suffix_order(&self) -> &U32Store {
        &self.suffix
    }

    /// Intern a token's value and append its ID to the stream.
    ///
    /// The empty string is reserved for sentence boundaries; callers pass
    /// a placeholder (conventionally `_`) for unannotated fields.
    pub fn append_word(&mut self, word: &str) {
        let id = self.symbols.intern(word);
        self.corpus.push(id);
    }

    /// Append the sentence-boundary sentinel.
    pub fn append_sentence_boundary(&mut self) {
        self.corpus.push(SENTINEL);
    }

    /// Sort all stream positions into suffix order.
    ///
    /// Run once, after ingestion is complete. Has no side effects beyond
    /// replacing the in-memory suffix order, so an interrupted build can
    /// simply be discarded.
    pub fn build_suffix_array(&mut self) {
        self.suffix = U32Store::from_vec(build_suffix_order(&self.corpus));
    }

    /// Translate a sequence of attribute values into symbol IDs.
    ///
    /// Returns `None` when any value was never interned, in which case the
    /// n-gram cannot occur in the corpus.
    pub fn encode_ngram<'a, I>(&self, words: I) -> Option<Vec<Symbol>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        words.into_iter().map(|w| self.symbols.id(w)).collect()
    }

    /// Locate the block of suffix ranks whose suffixes start with `ngram`.
    ///
    /// Returns the inclusive rank range `(first, last)`, or `None` when
    /// the n-gram does not occur. The size of the range is exactly the
    /// occurrence count. Empty n-grams and n-grams containing the
    /// sentence-boundary sentinel are rejected before any search runs, as
    /// is querying before the suffix order was built or loaded.
    pub fn find_ngram_range(&self, ngram: &[Symbol]) -> Result<Option<(Position, Position)>> {
        self.find_ngram_range_in(ngram, 0, self.suffix.len())
    }

    /// Like [`AttrIndex::find_ngram_range`], restricted to the half-open
    /// rank window `[lo, hi)` of the suffix order. Callers extending a
    /// previous match narrow into its range instead of searching the
    /// whole order again.
    pub fn find_ngram_range_in(
        &self,
        ngram: &[Symbol],
        lo: usize,
        hi: usize,
    ) -> Result<Option<(Position, Position)>> {
        if ngram.is_empty() {
            bail!("empty ngram query");
        }
        if ngram.contains(&SENTINEL) {
            bail!("ngram query contains the sentence-boundary sentinel");
        }
        if self.suffix.len() != self.corpus.len() {
            bail!(
                "suffix order not built: {} suffix entries for {} stream positions",
                self.suffix.len(),
                self.corpus.len()
            );
        }

        let hi = hi.min(self.suffix.len());
        if lo >= hi {
            return Ok(None);
        }

        let first = lower_bound(&self.corpus, &self.suffix, ngram, lo, hi);
        let last = upper_bound(&self.corpus, &self.suffix, ngram, first, hi);
        if first == last {
            return Ok(None);
        }
        Ok(Some((first as Position, (last - 1) as Position)))
    }

    /// Number of occurrences of `ngram` in the corpus.
    pub fn count(&self, ngram: &[Symbol]) -> Result<u64> {
        Ok(match self.find_ngram_range(ngram)? {
            Some((first, last)) => u64::from(last - first) + 1,
            None => 0,
        })
    }

    /// Corpus positions for an inclusive rank range returned by
    /// [`AttrIndex::find_ngram_range`].
    pub fn occurrences(
        &self,
        first: Position,
        last: Position,
    ) -> impl Iterator<Item = Position> + '_ {
        (first as usize..=last as usize).map(move |rank| self.suffix.get(rank))
    }

    fn file_paths(basepath: &Path, attr: &str) -> [PathBuf; 3] {
        [
            suffixed_path(basepath, &format!("{attr}.corpus")),
            suffixed_path(basepath, &format!("{attr}.suffix")),
            suffixed_path(basepath, &format!("{attr}.symbols")),
        ]
    }

    /// Persist the three index files for this attribute.
    pub fn save(&self, basepath: &Path, attr: &str) -> Result<()> {
        let [corpus_path, suffix_path, symbols_path] = Self::file_paths(basepath, attr);
        self.corpus.save(&corpus_path)?;
        self.suffix.save(&suffix_path)?;
        self.symbols.save(&symbols_path)?;
        Ok(())
    }

    /// Load an attribute index from its three on-disk files.
    ///
    /// Returns `Ok(None)` when any of the files is absent; the caller
    /// decides whether that means fusing components or a fatal error.
    pub fn open(basepath: &Path, attr: &str) -> Result<Option<Self>> {
        let paths = Self::file_paths(basepath, attr);
        if paths.iter().any(|p| !p.exists()) {
            return Ok(None);
        }

        let [corpus_path, suffix_path, symbols_path] = paths;
        let corpus = U32Store::open(&corpus_path)?;
        let suffix = U32Store::open(&suffix_path)?;
        let symbols = SymbolTable::load(&symbols_path)?;

        if corpus.len() != suffix.len() {
            bail!(
                "corrupt index for attribute {attr:?}: {} holds {} positions but {} holds {}",
                corpus_path.display(),
                corpus.len(),
                suffix_path.display(),
                suffix.len()
            );
        }

        Ok(Some(Self {
            corpus,
            suffix,
            symbols,
        }))
    }

    /// Print the suffix order with each suffix's leading symbols, for
    /// inspection. Boundaries print as `#`, positions past the end as `*`.
    pub fn dump_suffixes(
        &self,
        out: &mut dyn Write,
        window: usize,
        limit: Option<usize>,
    ) -> Result<()> {
        let end = limit.unwrap_or(self.suffix.len()).min(self.suffix.len());
        for rank in 0..end {
            let pos = self.suffix.get(rank) as usize;
            write!(out, "{pos:7}:")?;
            for i in pos..pos + window {
                if i < self.corpus.len() {
                    let sym = self.symbols.symbol(self.corpus.get(i))?;
                    write!(out, " {}", if sym.is_empty() { "#" } else { sym })?;
                } else {
                    write!(out, " *")?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl Default for AttrIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a composite attribute index by zipping two streams of the same
/// corpus symbol-pair-wise.
///
/// Both inputs must have identical length and sentence-boundary placement.
/// Each pair of values is joined with [`ATTR_SEPARATOR`] and interned into
/// a fresh symbol table; boundary positions stay boundaries. The returned
/// index has no suffix order yet; run
/// [`AttrIndex::build_suffix_array`] on it before querying.
pub fn fuse(a: &AttrIndex, b: &AttrIndex) -> Result<AttrIndex> {
    ensure!(
        a.corpus.len() == b.corpus.len(),
        "cannot fuse streams of different lengths ({} vs {})",
        a.corpus.len(),
        b.corpus.len()
    );

    let mut fused = AttrIndex::new();
    let mut value = String::new();
    for i in 0..a.corpus.len() {
        let (x, y) = (a.corpus.get(i), b.corpus.get(i));
        if x == SENTINEL && y == SENTINEL {
            fused.append_sentence_boundary();
            continue;
        }
        ensure!(
            x != SENTINEL && y != SENTINEL,
            "sentence boundaries disagree at stream position {i}"
        );

        value.clear();
        value.push_str(a.symbols.symbol(x)?);
        value.push(ATTR_SEPARATOR);
        value.push_str(b.symbols.symbol(y)?);
        fused.append_word(&value);
    }

    Ok(fused)
}
