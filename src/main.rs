use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use nqx::index::{Attr, Index, build, stats};
use nqx::output;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nqx")]
#[command(about = "Disk-persisted n-gram index engine for tagged text corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a tab-separated corpus file
    Index {
        /// Base prefix for the generated index files
        #[arg(short = 'i', long = "index")]
        index: PathBuf,

        /// Colon-separated attributes to materialize (e.g. lemma:pos)
        #[arg(short, long, default_value = "surface:lemma:pos:syn")]
        attributes: String,

        /// Corpus file: one token per line (surface lemma pos syn,
        /// tab-separated), blank line between sentences
        corpus: PathBuf,
    },
    /// Count and show occurrences of an n-gram
    Lookup {
        /// Base prefix of the index
        #[arg(short = 'i', long = "index")]
        index: PathBuf,

        /// Attribute to query; composites such as lemma+pos fuse on
        /// first use
        #[arg(short, long, default_value = "lemma")]
        attribute: String,

        /// Maximum matches to show (0 shows all)
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print the count only
        #[arg(short, long)]
        count: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// The n-gram, one attribute value per argument
        words: Vec<String>,
    },
    /// Show index statistics
    Stats {
        /// Base prefix of the index
        #[arg(short = 'i', long = "index")]
        index: PathBuf,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump the suffix order of an attribute (for inspection)
    Dump {
        /// Base prefix of the index
        #[arg(short = 'i', long = "index")]
        index: PathBuf,

        /// Attribute to dump
        #[arg(short, long, default_value = "lemma")]
        attribute: String,

        /// Leading symbols to print per suffix
        #[arg(long, default_value_t = 10)]
        window: usize,

        /// Number of suffixes to print (all when omitted)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Reconstruct and print the corpus sentences
    Sentences {
        /// Base prefix of the index
        #[arg(short = 'i', long = "index")]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            index,
            attributes,
            corpus,
        } => {
            let attrs = Attr::parse_list(&attributes)?;
            build::build_index(&corpus, &index, attrs)?;
        }
        Commands::Lookup {
            index,
            attribute,
            limit,
            count,
            no_color,
            words,
        } => {
            if words.is_empty() {
                bail!("lookup needs at least one word");
            }
            let mut idx = Index::open(&index)?;
            idx.load(&attribute)?;

            let words: Vec<&str> = words.iter().map(String::as_str).collect();
            let outcome = idx.lookup(&attribute, &words, if count { 1 } else { limit })?;
            if count {
                println!("{}", outcome.count);
            } else {
                output::print_matches(&outcome, !no_color)?;
            }
        }
        Commands::Stats { index, json } => {
            stats::show_stats(&index, json)?;
        }
        Commands::Dump {
            index,
            attribute,
            window,
            limit,
        } => {
            let mut idx = Index::open(&index)?;
            let array = idx.load(&attribute)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            array.dump_suffixes(&mut out, window, limit)?;
        }
        Commands::Sentences { index } => {
            let mut idx = Index::open(&index)?;
            let attrs = idx.meta().attributes.clone();
            for attr in &attrs {
                idx.load(attr.name())?;
            }
            let guide = attrs.first().copied();
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for sentence in idx.iterate_sentences()? {
                let sentence = sentence?;
                let line: Vec<&str> = sentence
                    .words
                    .iter()
                    .map(|token| match guide {
                        Some(attr) => attr.value(token),
                        None => token.surface.as_str(),
                    })
                    .collect();
                writeln!(out, "{}", line.join(" "))?;
            }
        }
    }

    Ok(())
}
