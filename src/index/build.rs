//! Ingestion driver: corpus file in, persisted index out.

use crate::corpus::TsvReader;
use crate::index::{Attr, Index};
use crate::utils::progress::{ProgressBar, ProgressStyle};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

fn spinner(msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Build an index over `corpus_path` and persist it under `basepath`.
///
/// One pass over the corpus feeds every configured attribute stream, then
/// each attribute's suffix order is sorted and the whole index is written
/// out. Composite attributes are not materialized here; they fuse lazily
/// on first query.
pub fn build_index(corpus_path: &Path, basepath: &Path, attrs: Vec<Attr>) -> Result<()> {
    let reader = TsvReader::open(corpus_path)?;
    let mut index = Index::create(basepath, attrs);

    let read_bar = spinner("Reading corpus...");
    for sentence in reader {
        let sentence =
            sentence.with_context(|| format!("while reading {}", corpus_path.display()))?;
        index.append_sentence(&sentence);
        if index.meta().sentence_count % 1000 == 0 {
            read_bar.set_message(format!("Read {} sentences", index.meta().sentence_count));
        }
    }
    read_bar.finish_with_message(format!(
        "Read {} sentences ({} tokens)",
        index.meta().sentence_count,
        index.corpus_size()
    ));

    let sort_bar = spinner("Sorting suffix arrays...");
    index.build_suffix_arrays();
    sort_bar.finish_with_message("Suffix arrays built");

    index
        .save()
        .with_context(|| format!("failed to persist index under {}", basepath.display()))?;
    println!("Index stored at: {}.*", basepath.display());

    Ok(())
}
