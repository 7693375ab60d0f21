//! # NQX - Corpus N-gram Index Engine
//!
//! NQX turns a tokenized, attribute-tagged corpus into a compact
//! disk-persisted structure that answers "how many times does n-gram X
//! occur?" and "which corpus positions start with X?" in sub-linear time,
//! for corpora too large to scan per query.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Symbol tables, attribute streams, suffix orders, and the
//!   top-level [`index::Index`] aggregator
//! - [`corpus`] - Sentence/token boundary types and a minimal reader
//! - [`output`] - Result formatting for the CLI
//! - [`utils`] - Fixed-width encoding and progress helpers
//!
//! ## Quick Start
//!
//! ```ignore
//! use nqx::index::Index;
//!
//! // Open an existing index by its path prefix
//! let mut index = Index::open("corpora/europarl").unwrap();
//!
//! // Load an attribute (composites fuse lazily) and query it
//! let lemma = index.load("lemma").unwrap();
//! if let Some(ngram) = lemma.encode_ngram(["kick", "the", "bucket"]) {
//!     println!("{} occurrences", lemma.count(&ngram).unwrap());
//! }
//! ```
//!
//! ## Design
//!
//! Per attribute (surface form, lemma, part-of-speech, syntactic
//! relation) the corpus is encoded as a stream of interned symbol IDs
//! with a sentinel after every sentence, and a suffix order sorts all
//! stream positions under a bounded n-gram comparator. Range queries are
//! two binary searches; occurrence counts are range sizes. Composite
//! attributes (`lemma+pos`) are derived by zipping two streams without
//! re-reading the corpus. Everything is read-only after the build, so
//! queries need no locking.

pub mod corpus;
pub mod index;
pub mod output;
pub mod utils;
