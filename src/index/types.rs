//! Core types for corpus indexing.

use crate::corpus::Token;
use crate::utils::suffixed_path;
use anyhow::{Context, Result, bail};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Dense identifier of an attribute value string
pub type Symbol = u32;

/// Position in an attribute corpus stream
pub type Position = u32;

/// Reserved symbol marking a sentence boundary.
///
/// Symbol 0 always denotes the empty string; real token values are
/// interned starting at 1.
pub const SENTINEL: Symbol = 0;

/// Maximum number of tokens the suffix comparator walks.
///
/// Suffixes that agree on this many leading tokens compare by the next
/// symbol only; queries for longer n-grams are not reliably supported.
/// The constant is fixed for compatibility with existing on-disk indices.
pub const NGRAM_LIMIT: usize = 16;

/// Joins the two component values of a fused attribute symbol.
///
/// ASCII group separator, guaranteed absent from attribute values.
pub const ATTR_SEPARATOR: char = '\u{1D}';

/// Joins attribute names into a composite name, e.g. `lemma+pos`.
pub const COMPOSITE_JOINER: char = '+';

/// The annotation layers an index can materialize.
///
/// The set of supported layers is closed; which of them a given index
/// actually carries is chosen at build time (see [`Attr::parse_list`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Surface,
    Lemma,
    Pos,
    Syn,
}

impl Attr {
    pub const ALL: [Attr; 4] = [Attr::Surface, Attr::Lemma, Attr::Pos, Attr::Syn];

    pub fn name(self) -> &'static str {
        match self {
            Attr::Surface => "surface",
            Attr::Lemma => "lemma",
            Attr::Pos => "pos",
            Attr::Syn => "syn",
        }
    }

    pub fn from_name(name: &str) -> Option<Attr> {
        match name {
            "surface" => Some(Attr::Surface),
            "lemma" => Some(Attr::Lemma),
            "pos" => Some(Attr::Pos),
            "syn" => Some(Attr::Syn),
            _ => None,
        }
    }

    /// Read this attribute's value out of a token.
    pub fn value(self, token: &Token) -> &str {
        match self {
            Attr::Surface => &token.surface,
            Attr::Lemma => &token.lemma,
            Attr::Pos => &token.pos,
            Attr::Syn => &token.syn,
        }
    }

    /// Write this attribute's value into a token being reconstructed.
    pub fn set_value(self, token: &mut Token, value: &str) {
        let slot = match self {
            Attr::Surface => &mut token.surface,
            Attr::Lemma => &mut token.lemma,
            Attr::Pos => &mut token.pos,
            Attr::Syn => &mut token.syn,
        };
        *slot = value.to_string();
    }

    /// Parse a colon-separated attribute list such as `lemma:pos`.
    pub fn parse_list(list: &str) -> Result<Vec<Attr>> {
        let mut attrs = Vec::new();
        for name in list.split(':').filter(|n| !n.is_empty()) {
            let attr = Attr::from_name(name)
                .with_context(|| format!("unknown attribute {name:?} (expected one of surface, lemma, pos, syn)"))?;
            if !attrs.contains(&attr) {
                attrs.push(attr);
            }
        }
        if attrs.is_empty() {
            bail!("empty attribute list");
        }
        Ok(attrs)
    }
}

impl Serialize for Attr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A value in the `.info` metadata file, typed `int` or `string`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Str(String),
}

/// Corpus-wide metadata shared by all attributes of one index.
///
/// Persisted as the `<prefix>.info` file: one entry per line in the form
/// `<key> <type> <value>`. Keys this implementation does not know are kept
/// and written back unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct IndexMeta {
    /// Count of real tokens, excluding sentence separators
    pub corpus_size: u64,
    pub sentence_count: u64,
    /// Simple attributes materialized at build time, in guide order
    pub attributes: Vec<Attr>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, MetaValue>,
}

impl IndexMeta {
    pub fn new(attributes: Vec<Attr>) -> Self {
        Self {
            corpus_size: 0,
            sentence_count: 0,
            attributes,
            extra: BTreeMap::new(),
        }
    }

    fn attr_list(&self) -> String {
        let names: Vec<&str> = self.attributes.iter().map(|a| a.name()).collect();
        names.join(":")
    }

    /// Load metadata from a `<prefix>.info` file.
    pub fn load(basepath: &Path) -> Result<Self> {
        let path = suffixed_path(basepath, "info");
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read index metadata {}", path.display()))?;

        let mut corpus_size = None;
        let mut sentence_count = 0;
        let mut attributes = Vec::new();
        let mut extra = BTreeMap::new();

        for line in text.lines().filter(|l| !l.is_empty()) {
            let mut parts = line.splitn(3, ' ');
            let (Some(key), Some(ty), Some(value)) = (parts.next(), parts.next(), parts.next())
            else {
                bail!("malformed metadata line {line:?} in {}", path.display());
            };
            let parsed = match ty {
                "int" => MetaValue::Int(
                    value
                        .parse()
                        .with_context(|| format!("non-integer value for {key} in {}", path.display()))?,
                ),
                "string" => MetaValue::Str(value.to_string()),
                _ => bail!("unknown metadata type {ty:?} in {}", path.display()),
            };
            match (key, parsed) {
                ("corpus_size", MetaValue::Int(n)) => corpus_size = Some(n as u64),
                ("sentence_count", MetaValue::Int(n)) => sentence_count = n as u64,
                ("attributes", MetaValue::Str(list)) => attributes = Attr::parse_list(&list)?,
                (key, value) => {
                    extra.insert(key.to_string(), value);
                }
            }
        }

        let corpus_size = corpus_size
            .with_context(|| format!("{} is missing the corpus_size entry", path.display()))?;

        Ok(Self {
            corpus_size,
            sentence_count,
            attributes,
            extra,
        })
    }

    /// Save metadata to the `<prefix>.info` file.
    pub fn save(&self, basepath: &Path) -> Result<()> {
        let path = suffixed_path(basepath, "info");
        let mut out = String::new();
        out.push_str(&format!("corpus_size int {}\n", self.corpus_size));
        out.push_str(&format!("sentence_count int {}\n", self.sentence_count));
        if !self.attributes.is_empty() {
            out.push_str(&format!("attributes string {}\n", self.attr_list()));
        }
        for (key, value) in &self.extra {
            match value {
                MetaValue::Int(n) => out.push_str(&format!("{key} int {n}\n")),
                MetaValue::Str(s) => out.push_str(&format!("{key} string {s}\n")),
            }
        }

        let mut file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(out.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
