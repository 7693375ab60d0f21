//! Symbol table: bidirectional mapping between attribute values and IDs.

use crate::index::types::{SENTINEL, Symbol};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Maps attribute value strings to dense IDs and back.
///
/// IDs are assigned in first-seen order. ID 0 is permanently reserved for
/// the empty string, which doubles as the sentence-boundary sentinel. The
/// table is append-only during ingestion and immutable afterwards.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    syms: Vec<String>,
    ids: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut ids = FxHashMap::default();
        ids.insert(String::new(), SENTINEL);
        Self {
            syms: vec![String::new()],
            ids,
        }
    }

    /// Return the ID for `sym`, interning it if it is new.
    pub fn intern(&mut self, sym: &str) -> Symbol {
        if let Some(&id) = self.ids.get(sym) {
            return id;
        }
        let id = self.syms.len() as Symbol;
        self.syms.push(sym.to_string());
        self.ids.insert(sym.to_string(), id);
        id
    }

    /// Look up the string for an ID.
    ///
    /// Fails for IDs that were never interned; a corpus stream referencing
    /// such an ID indicates a corrupt symbols file, surfaced here at lookup
    /// time rather than eagerly at load.
    pub fn symbol(&self, id: Symbol) -> Result<&str> {
        self.syms
            .get(id as usize)
            .map(String::as_str)
            .with_context(|| {
                format!(
                    "symbol id {id} out of range (table holds {} entries)",
                    self.syms.len()
                )
            })
    }

    /// Look up the ID for a string, without interning.
    pub fn id(&self, sym: &str) -> Option<Symbol> {
        self.ids.get(sym).copied()
    }

    pub fn len(&self) -> usize {
        self.syms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syms.is_empty()
    }

    /// Write the table as UTF-8 text, one symbol per line in ID order.
    ///
    /// Line 0 is always empty. This ordered list is the authoritative
    /// on-disk representation; both directions of the mapping are
    /// re-derived from it on load.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::with_capacity(65536, file);
        for sym in &self.syms {
            writer.write_all(sym.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load a table from its on-disk line-per-symbol form.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read symbol table {}", path.display()))?;

        let mut syms = Vec::new();
        let mut ids = FxHashMap::default();
        for line in text.lines() {
            ids.insert(line.to_string(), syms.len() as Symbol);
            syms.push(line.to_string());
        }

        if syms.first().map(String::as_str) != Some("") {
            bail!(
                "corrupt symbol table {}: line 0 must be the reserved empty symbol",
                path.display()
            );
        }

        Ok(Self { syms, ids })
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
