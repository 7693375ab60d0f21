//! Corpus index building and querying.

pub mod attribute;
pub mod build;
pub mod stats;
pub mod store;
pub mod suffix;
pub mod symbols;
pub mod types;

pub use attribute::{AttrIndex, fuse};
pub use store::U32Store;
pub use suffix::{SymSeq, build_suffix_order, compare_ngrams};
pub use symbols::SymbolTable;
pub use types::*;

use crate::corpus::{Sentence, Token};
use anyhow::{Context, Result, bail};
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The top-level index: one [`AttrIndex`] per materialized attribute plus
/// corpus-wide metadata, addressed on disk by a shared path prefix.
///
/// Lifecycle: created empty with [`Index::create`] and fed through a
/// single ingestion pass ([`Index::append_sentence`] repeatedly, then
/// [`Index::build_suffix_arrays`] once, then [`Index::save`]), or opened
/// over existing files with [`Index::open`] and treated as a read-only
/// replica. Attributes load lazily; composite attributes such as
/// `lemma+pos` are fused from their components on first use and persisted
/// so later opens skip the fuse.
pub struct Index {
    basepath: PathBuf,
    arrays: FxHashMap<String, AttrIndex>,
    meta: IndexMeta,
    spans: OnceLock<Vec<(Position, Position)>>,
}

impl Index {
    /// Create an empty index that will materialize the given attributes.
    pub fn create(basepath: impl Into<PathBuf>, attrs: Vec<Attr>) -> Self {
        let mut arrays = FxHashMap::default();
        for attr in &attrs {
            arrays.insert(attr.name().to_string(), AttrIndex::new());
        }
        Self {
            basepath: basepath.into(),
            arrays,
            meta: IndexMeta::new(attrs),
            spans: OnceLock::new(),
        }
    }

    /// Open an existing index by its path prefix.
    ///
    /// Only the metadata is read here; attribute indices load on demand
    /// through [`Index::load`].
    pub fn open(basepath: impl Into<PathBuf>) -> Result<Self> {
        let basepath = basepath.into();
        let meta = IndexMeta::load(&basepath)?;
        Ok(Self {
            basepath,
            arrays: FxHashMap::default(),
            meta,
            spans: OnceLock::new(),
        })
    }

    pub fn basepath(&self) -> &Path {
        &self.basepath
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Count of real tokens in the corpus, excluding sentence separators.
    pub fn corpus_size(&self) -> u64 {
        self.meta.corpus_size
    }

    /// Append one sentence to every configured attribute's stream.
    ///
    /// Sentences must arrive in corpus order; stream positions are the
    /// only identifier a suffix has.
    pub fn append_sentence(&mut self, sentence: &Sentence) {
        for &attr in &self.meta.attributes {
            let array = self
                .arrays
                .get_mut(attr.name())
                .expect("attribute streams must be created before ingestion");
            for token in &sentence.words {
                array.append_word(attr.value(token));
            }
            array.append_sentence_boundary();
        }
        self.meta.corpus_size += sentence.words.len() as u64;
        self.meta.sentence_count += 1;
    }

    /// Build the suffix order of every resident attribute.
    ///
    /// Construction is independent per attribute, so attributes sort on
    /// separate workers.
    pub fn build_suffix_arrays(&mut self) {
        use rayon::prelude::*;
        let mut arrays: Vec<&mut AttrIndex> = self.arrays.values_mut().collect();
        arrays.par_iter_mut().for_each(|a| a.build_suffix_array());
    }

    /// Persist the metadata and every resident attribute index.
    pub fn save(&self) -> Result<()> {
        self.meta.save(&self.basepath)?;
        for (name, array) in &self.arrays {
            array.save(&self.basepath, name)?;
        }
        Ok(())
    }

    /// Return the index for `name`, loading or deriving it if necessary.
    ///
    /// Resident attributes are returned as-is. Otherwise the three on-disk
    /// files are tried; if they are absent and the name is composite, the
    /// two component attributes are loaded (recursively) and fused, and
    /// the fused result is persisted so the next open finds it on disk. A
    /// missing simple attribute is fatal.
    pub fn load(&mut self, name: &str) -> Result<&AttrIndex> {
        if !self.arrays.contains_key(name) {
            let array = self.load_or_fuse(name)?;
            self.arrays.insert(name.to_string(), array);
        }
        Ok(&self.arrays[name])
    }

    fn load_or_fuse(&mut self, name: &str) -> Result<AttrIndex> {
        if let Some(array) = AttrIndex::open(&self.basepath, name)? {
            return Ok(array);
        }

        let Some((left, right)) = name.rsplit_once(COMPOSITE_JOINER) else {
            bail!(
                "missing index files for attribute {name:?} under prefix {}",
                self.basepath.display()
            );
        };

        self.load(left)
            .with_context(|| format!("while fusing components of {name:?}"))?;
        self.load(right)
            .with_context(|| format!("while fusing components of {name:?}"))?;

        let mut fused = fuse(&self.arrays[left], &self.arrays[right])
            .with_context(|| format!("failed to fuse {left:?} and {right:?}"))?;
        fused.build_suffix_array();
        fused.save(&self.basepath, name)?;
        Ok(fused)
    }

    /// Return a resident attribute index, failing if it was never loaded.
    pub fn attribute(&self, name: &str) -> Result<&AttrIndex> {
        self.arrays
            .get(name)
            .with_context(|| format!("attribute {name:?} is not loaded"))
    }

    /// Sentence spans `(start, end)` over the corpus stream, end exclusive
    /// (the position of the boundary sentinel). Every attribute stream of
    /// one corpus has identical boundary placement, so the table is
    /// computed once from whichever attribute asks first.
    fn sentence_spans(&self, array: &AttrIndex) -> &[(Position, Position)] {
        self.spans.get_or_init(|| {
            let corpus = array.corpus();
            let mut spans = Vec::new();
            let mut start = 0;
            for i in 0..corpus.len() {
                if corpus.get(i) == SENTINEL {
                    spans.push((start, i as Position));
                    start = i as Position + 1;
                }
            }
            spans
        })
    }

    fn span_containing(spans: &[(Position, Position)], pos: Position) -> Option<usize> {
        spans
            .binary_search_by(|&(start, end)| {
                if pos < start {
                    std::cmp::Ordering::Greater
                } else if pos >= end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
    }

    /// Ordinal of the sentence containing a corpus position.
    pub fn sentence_containing(&self, attr: &str, pos: Position) -> Result<Option<u32>> {
        let array = self.attribute(attr)?;
        let spans = self.sentence_spans(array);
        Ok(Self::span_containing(spans, pos).map(|i| i as u32))
    }

    /// The set of sentence ordinals whose sentences contain `ngram`.
    pub fn ngram_sentence_ids(&self, attr: &str, ngram: &[Symbol]) -> Result<RoaringBitmap> {
        let array = self.attribute(attr)?;
        let mut ids = RoaringBitmap::new();
        if let Some((first, last)) = array.find_ngram_range(ngram)? {
            let spans = self.sentence_spans(array);
            for pos in array.occurrences(first, last) {
                if let Some(sid) = Self::span_containing(spans, pos) {
                    ids.insert(sid as u32);
                }
            }
        }
        Ok(ids)
    }

    /// Find `words` as an n-gram of attribute `attr`, returning the total
    /// occurrence count and up to `limit` located matches (all of them
    /// when `limit` is 0), ordered by corpus position.
    pub fn lookup(&self, attr: &str, words: &[&str], limit: usize) -> Result<LookupOutcome> {
        let array = self.attribute(attr)?;

        let Some(ngram) = array.encode_ngram(words.iter().copied()) else {
            return Ok(LookupOutcome::default());
        };
        let Some((first, last)) = array.find_ngram_range(&ngram)? else {
            return Ok(LookupOutcome::default());
        };

        let count = u64::from(last - first) + 1;
        let spans = self.sentence_spans(array);

        let mut positions: Vec<Position> = array.occurrences(first, last).collect();
        positions.sort_unstable();
        if limit > 0 {
            positions.truncate(limit);
        }

        let mut matches = Vec::with_capacity(positions.len());
        for pos in positions {
            let Some(sid) = Self::span_containing(spans, pos) else {
                continue;
            };
            let (start, end) = spans[sid];
            let mut sentence = Vec::with_capacity((end - start) as usize);
            for i in start..end {
                sentence.push(array.symbols().symbol(array.corpus().get(i as usize))?.to_string());
            }
            matches.push(LookupMatch {
                sentence_id: sid as u32,
                words: sentence,
                match_offset: (pos - start) as usize,
                match_len: ngram.len(),
            });
        }

        Ok(LookupOutcome { count, matches })
    }

    /// Iterate over the corpus, reconstructing each sentence from the
    /// resident attribute streams. The first configured attribute guides
    /// the walk; all configured attributes must be loaded.
    pub fn iterate_sentences(&self) -> Result<Sentences<'_>> {
        let attrs = &self.meta.attributes;
        if attrs.is_empty() {
            bail!("index has no configured attributes to iterate");
        }
        let arrays = attrs
            .iter()
            .map(|&attr| Ok((attr, self.attribute(attr.name())?)))
            .collect::<Result<Vec<_>>>()?;
        let len = arrays[0].1.corpus().len();
        Ok(Sentences {
            arrays,
            pos: 0,
            len,
        })
    }
}

/// One located occurrence of a queried n-gram.
#[derive(Debug, Clone)]
pub struct LookupMatch {
    pub sentence_id: u32,
    /// The containing sentence, rendered in the queried attribute's values
    pub words: Vec<String>,
    /// Token offset of the match within the sentence
    pub match_offset: usize,
    pub match_len: usize,
}

/// Result of [`Index::lookup`]: total count plus located matches.
#[derive(Debug, Clone, Default)]
pub struct LookupOutcome {
    pub count: u64,
    pub matches: Vec<LookupMatch>,
}

/// Iterator over reconstructed sentences, returned by
/// [`Index::iterate_sentences`].
pub struct Sentences<'a> {
    arrays: Vec<(Attr, &'a AttrIndex)>,
    pos: usize,
    len: usize,
}

impl Iterator for Sentences<'_> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.len {
            return None;
        }

        let guide = self.arrays[0].1;
        let mut words = Vec::new();
        while self.pos < self.len {
            if guide.corpus().get(self.pos) == SENTINEL {
                self.pos += 1;
                return Some(Ok(Sentence::new(words)));
            }

            let mut token = Token::default();
            for (attr, array) in &self.arrays {
                match array.symbols().symbol(array.corpus().get(self.pos)) {
                    Ok(value) => attr.set_value(&mut token, value),
                    Err(err) => {
                        self.pos = self.len;
                        return Some(Err(err));
                    }
                }
            }
            words.push(token);
            self.pos += 1;
        }

        // A well-formed stream ends on a boundary; emit any trailing
        // tokens rather than dropping them.
        Some(Ok(Sentence::new(words)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sentence(words: &[(&str, &str, &str, &str)]) -> Sentence {
        Sentence::new(
            words
                .iter()
                .map(|&(surface, lemma, pos, syn)| Token {
                    surface: surface.to_string(),
                    lemma: lemma.to_string(),
                    pos: pos.to_string(),
                    syn: syn.to_string(),
                })
                .collect(),
        )
    }

    fn build_two_sentence_index(basepath: &Path) -> Index {
        let mut index = Index::create(basepath, vec![Attr::Lemma, Attr::Pos]);
        index.append_sentence(&sentence(&[
            ("the", "the", "DET", "det"),
            ("cats", "cat", "NOUN", "subj"),
            ("sat", "sit", "VERB", "root"),
        ]));
        index.append_sentence(&sentence(&[
            ("the", "the", "DET", "det"),
            ("dogs", "dog", "NOUN", "subj"),
            ("ran", "run", "VERB", "root"),
        ]));
        index.build_suffix_arrays();
        index
    }

    #[test]
    fn test_append_tracks_metadata() {
        let dir = tempdir().unwrap();
        let index = build_two_sentence_index(&dir.path().join("corpus"));
        assert_eq!(index.corpus_size(), 6);
        assert_eq!(index.meta().sentence_count, 2);
    }

    #[test]
    fn test_save_open_load_query() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("corpus");
        build_two_sentence_index(&base).save().unwrap();

        let mut reopened = Index::open(&base).unwrap();
        let lemma = reopened.load("lemma").unwrap();
        let ngram = lemma.encode_ngram(["the"]).unwrap();
        assert_eq!(lemma.count(&ngram).unwrap(), 2);
    }

    #[test]
    fn test_missing_simple_attribute_is_fatal() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("corpus");
        build_two_sentence_index(&base).save().unwrap();

        let mut reopened = Index::open(&base).unwrap();
        let err = reopened.load("surface").unwrap_err();
        assert!(err.to_string().contains("surface"));
    }

    #[test]
    fn test_composite_fuses_and_persists() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("corpus");
        build_two_sentence_index(&base).save().unwrap();

        let mut reopened = Index::open(&base).unwrap();
        let fused = reopened.load("lemma+pos").unwrap();
        let pair = format!("cat{ATTR_SEPARATOR}NOUN");
        let ngram = fused.encode_ngram([pair.as_str()]).unwrap();
        assert_eq!(fused.count(&ngram).unwrap(), 1);

        // The fused files were written; a fresh open loads them directly
        drop(reopened);
        let mut again = Index::open(&base).unwrap();
        let fused = again.load("lemma+pos").unwrap();
        assert_eq!(fused.count(&ngram).unwrap(), 1);
        assert!(matches!(fused.corpus(), U32Store::Mapped(_)));
    }

    #[test]
    fn test_query_on_unloaded_attribute_rejected() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("corpus");
        build_two_sentence_index(&base).save().unwrap();

        let reopened = Index::open(&base).unwrap();
        assert!(reopened.attribute("lemma").is_err());
    }

    #[test]
    fn test_sentence_ids_for_ngram() {
        let dir = tempdir().unwrap();
        let index = build_two_sentence_index(&dir.path().join("corpus"));

        let ids = index.ngram_sentence_ids("lemma", &[1]).unwrap();
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![0, 1]);

        let lemma = index.attribute("lemma").unwrap();
        let dog = lemma.encode_ngram(["dog"]).unwrap();
        let ids = index.ngram_sentence_ids("lemma", &dog).unwrap();
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_lookup_locates_matches() {
        let dir = tempdir().unwrap();
        let index = build_two_sentence_index(&dir.path().join("corpus"));

        let outcome = index.lookup("lemma", &["the"], 0).unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].sentence_id, 0);
        assert_eq!(outcome.matches[0].match_offset, 0);
        assert_eq!(outcome.matches[0].words, vec!["the", "cat", "sit"]);

        let outcome = index.lookup("lemma", &["unseen"], 0).unwrap();
        assert_eq!(outcome.count, 0);
        assert!(outcome.matches.is_empty());

        let outcome = index.lookup("lemma", &["the"], 1).unwrap();
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn test_iterate_sentences_reconstructs_tokens() {
        let dir = tempdir().unwrap();
        let index = build_two_sentence_index(&dir.path().join("corpus"));

        let sentences: Vec<Sentence> = index
            .iterate_sentences()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].words[1].lemma, "cat");
        assert_eq!(sentences[0].words[1].pos, "NOUN");
        // Attributes that were not indexed stay empty
        assert_eq!(sentences[0].words[1].surface, "");
        assert_eq!(sentences[1].words[2].lemma, "run");
    }
}
