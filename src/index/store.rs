//! Backing storage for the fixed-width integer arrays of an index.

use crate::utils::encoding::{u32_at, write_u32_seq};
use anyhow::{Context, Result, bail};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A flat array of u32 values, owned during ingestion and memory-mapped
/// read-only once loaded from disk.
///
/// The on-disk form is headerless little-endian: element count is derived
/// from file size. Writers never mutate a mapped store; an index is built
/// in owned memory, persisted once, and thereafter shared read-only.
pub enum U32Store {
    Owned(Vec<u32>),
    Mapped(Mmap),
}

impl U32Store {
    pub fn new() -> Self {
        U32Store::Owned(Vec::new())
    }

    pub fn from_vec(values: Vec<u32>) -> Self {
        U32Store::Owned(values)
    }

    pub fn len(&self) -> usize {
        match self {
            U32Store::Owned(values) => values.len(),
            U32Store::Mapped(map) => map.len() / 4,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        match self {
            U32Store::Owned(values) => values[index],
            U32Store::Mapped(map) => u32_at(map, index),
        }
    }

    /// Append a value. Only valid while the store is owned; appending to a
    /// mapped store is a programming error.
    pub fn push(&mut self, value: u32) {
        match self {
            U32Store::Owned(values) => values.push(value),
            U32Store::Mapped(_) => panic!("append to a read-only mapped store"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Write the array to `path` as headerless little-endian u32s.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::with_capacity(65536, file);
        write_u32_seq(&mut writer, self.iter())
            .and_then(|()| writer.flush())
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Map an existing array file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();

        if size % 4 != 0 {
            bail!(
                "corrupt index file {}: size {} is not a multiple of 4",
                path.display(),
                size
            );
        }
        if size == 0 {
            // Zero-length mappings are rejected by the OS
            return Ok(U32Store::Owned(Vec::new()));
        }

        let map = unsafe { Mmap::map(&file) }
            .with_context(|| format!("failed to map {}", path.display()))?;
        Ok(U32Store::Mapped(map))
    }
}

impl Default for U32Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for U32Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            U32Store::Owned(_) => "Owned",
            U32Store::Mapped(_) => "Mapped",
        };
        write!(f, "U32Store::{}(len={})", kind, self.len())
    }
}
