//! Index statistics reporting.

use crate::index::attribute::AttrIndex;
use crate::index::types::IndexMeta;
use crate::utils::{format_size, suffixed_path};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Per-attribute figures, covering fused attributes present on disk.
#[derive(Debug, Serialize)]
pub struct AttrStats {
    pub attribute: String,
    pub symbols: u64,
    pub positions: u64,
    pub disk_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct IndexStats {
    pub basepath: String,
    pub corpus_size: u64,
    pub sentence_count: u64,
    pub attributes: Vec<AttrStats>,
}

/// Attribute names that have a `.corpus` file next to the prefix.
///
/// Scanning the directory rather than the metadata picks up composite
/// attributes fused after the initial build.
fn attrs_on_disk(basepath: &Path) -> Result<Vec<String>> {
    let dir = match basepath.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = basepath
        .file_name()
        .context("index prefix has no file name")?
        .to_string_lossy()
        .into_owned();
    let prefix = format!("{stem}.");

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to list index directory {}", dir.display()))?
    {
        let file_name = entry?.file_name().to_string_lossy().into_owned();
        if let Some(rest) = file_name.strip_prefix(&prefix) {
            if let Some(attr) = rest.strip_suffix(".corpus") {
                if !attr.is_empty() {
                    names.push(attr.to_string());
                }
            }
        }
    }
    names.sort();
    Ok(names)
}

pub fn collect_stats(basepath: &Path) -> Result<IndexStats> {
    let meta = IndexMeta::load(basepath)?;

    let mut attributes = Vec::new();
    for name in attrs_on_disk(basepath)? {
        let Some(array) = AttrIndex::open(basepath, &name)? else {
            continue;
        };
        let mut disk_bytes = 0;
        for ext in ["corpus", "suffix", "symbols"] {
            let path = suffixed_path(basepath, &format!("{name}.{ext}"));
            disk_bytes += std::fs::metadata(&path)
                .with_context(|| format!("failed to stat {}", path.display()))?
                .len();
        }
        attributes.push(AttrStats {
            attribute: name,
            symbols: array.symbols().len() as u64,
            positions: array.corpus().len() as u64,
            disk_bytes,
        });
    }

    Ok(IndexStats {
        basepath: basepath.display().to_string(),
        corpus_size: meta.corpus_size,
        sentence_count: meta.sentence_count,
        attributes,
    })
}

/// Display index statistics
pub fn show_stats(basepath: &Path, json: bool) -> Result<()> {
    let stats = collect_stats(basepath)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Prefix:           {}", stats.basepath);
    println!("Corpus size:      {} tokens", stats.corpus_size);
    println!("Sentences:        {}", stats.sentence_count);
    println!();
    println!("Attributes:");
    for attr in &stats.attributes {
        println!(
            "  {:14} {:>10} symbols {:>12} positions {:>10}",
            attr.attribute,
            attr.symbols,
            attr.positions,
            format_size(attr.disk_bytes)
        );
    }

    let total: u64 = stats.attributes.iter().map(|a| a.disk_bytes).sum();
    println!();
    println!("Index size:       {}", format_size(total));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Sentence, Token};
    use crate::index::{Attr, Index};
    use tempfile::tempdir;

    #[test]
    fn test_collect_stats_sees_all_attributes() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("corpus");

        let mut index = Index::create(&base, vec![Attr::Lemma, Attr::Pos]);
        index.append_sentence(&Sentence::new(vec![Token {
            surface: "cats".into(),
            lemma: "cat".into(),
            pos: "NOUN".into(),
            syn: "root".into(),
        }]));
        index.build_suffix_arrays();
        index.save().unwrap();

        let stats = collect_stats(&base).unwrap();
        assert_eq!(stats.corpus_size, 1);
        assert_eq!(stats.sentence_count, 1);

        let names: Vec<&str> = stats.attributes.iter().map(|a| a.attribute.as_str()).collect();
        assert_eq!(names, vec!["lemma", "pos"]);
        // one token plus the sentence boundary
        assert_eq!(stats.attributes[0].positions, 2);
        // sentinel plus one symbol
        assert_eq!(stats.attributes[0].symbols, 2);
        assert!(stats.attributes[0].disk_bytes > 0);

        // Fused attributes appear once materialized
        let mut reopened = Index::open(&base).unwrap();
        reopened.load("lemma+pos").unwrap();
        let stats = collect_stats(&base).unwrap();
        let names: Vec<&str> = stats.attributes.iter().map(|a| a.attribute.as_str()).collect();
        assert_eq!(names, vec!["lemma", "lemma+pos", "pos"]);
    }
}
