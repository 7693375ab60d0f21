//! Corpus boundary types and a minimal sentence reader.
//!
//! The indexing core consumes sentences, not files: anything that yields
//! [`Sentence`] values in corpus order can feed [`crate::index::Index`].
//! Full-blown corpus format handling (XML, Moses, format auto-detection)
//! lives outside this crate; the one adapter provided here reads the
//! tab-separated format the `nqx index` command accepts.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One token of a tagged corpus, with all four annotation layers.
///
/// Fields that a corpus does not annotate carry the placeholder `_`, never
/// the empty string: the empty string is the reserved sentence-boundary
/// symbol inside the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub lemma: String,
    pub pos: String,
    pub syn: String,
}

/// An ordered sequence of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub words: Vec<Token>,
}

impl Sentence {
    pub fn new(words: Vec<Token>) -> Self {
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Anything that produces sentences in corpus order.
pub trait SentenceSource: Iterator<Item = Result<Sentence>> {}

impl<T: Iterator<Item = Result<Sentence>>> SentenceSource for T {}

/// Reader for tab-separated tagged corpora.
///
/// One token per line with up to four tab-separated fields in the order
/// `surface lemma pos syn`; missing trailing fields become `_`. A blank
/// line ends a sentence, lines starting with `#` are skipped.
pub struct TsvReader<R: BufRead> {
    lines: std::io::Lines<R>,
    done: bool,
}

impl TsvReader<BufReader<File>> {
    /// Open a corpus file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open corpus file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            done: false,
        }
    }
}

fn parse_token(line: &str) -> Token {
    let mut fields = line.split('\t');
    let mut next_field = || {
        fields
            .next()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("_")
            .to_string()
    };
    Token {
        surface: next_field(),
        lemma: next_field(),
        pos: next_field(),
        syn: next_field(),
    }
}

impl<R: BufRead> Iterator for TsvReader<R> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut words = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    let trimmed = line.trim_end();
                    if trimmed.starts_with('#') {
                        continue;
                    }
                    if trimmed.is_empty() {
                        if words.is_empty() {
                            // Stray blank line between sentences
                            continue;
                        }
                        return Some(Ok(Sentence::new(words)));
                    }
                    words.push(parse_token(trimmed));
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err).context("failed to read corpus line"));
                }
                None => {
                    self.done = true;
                    if words.is_empty() {
                        return None;
                    }
                    return Some(Ok(Sentence::new(words)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str) -> Vec<Sentence> {
        TsvReader::new(Cursor::new(input.to_string()))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_two_sentences() {
        let sentences = read_all(
            "the\tthe\tDET\tdet\ncat\tcat\tNOUN\tsubj\n\nsat\tsit\tVERB\troot\n",
        );
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].len(), 2);
        assert_eq!(sentences[0].words[0].surface, "the");
        assert_eq!(sentences[0].words[1].lemma, "cat");
        assert_eq!(sentences[1].words[0].lemma, "sit");
    }

    #[test]
    fn test_missing_fields_become_placeholder() {
        let sentences = read_all("dogs\tdog\n");
        assert_eq!(sentences.len(), 1);
        let token = &sentences[0].words[0];
        assert_eq!(token.surface, "dogs");
        assert_eq!(token.lemma, "dog");
        assert_eq!(token.pos, "_");
        assert_eq!(token.syn, "_");
    }

    #[test]
    fn test_comments_and_stray_blanks() {
        let sentences = read_all("# corpus header\n\n\na\ta\tDET\t_\n\n\nb\tb\tNOUN\t_\n");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].words[0].surface, "a");
        assert_eq!(sentences[1].words[0].surface, "b");
    }

    #[test]
    fn test_final_sentence_without_trailing_blank() {
        let sentences = read_all("run\trun\tVERB\troot");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].words[0].pos, "VERB");
    }
}
