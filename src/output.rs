//! Output formatting for query results

use crate::index::{ATTR_SEPARATOR, LookupOutcome};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Render a symbol for display: fused values carry the reserved separator
/// between their components, shown as `/`.
fn display_symbol(sym: &str) -> String {
    sym.replace(ATTR_SEPARATOR, "/")
}

/// Print lookup results: total count, then one line per located match
/// with the matched n-gram highlighted.
pub fn print_matches(outcome: &LookupOutcome, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    if outcome.count == 1 {
        writeln!(stdout, "1 occurrence")?;
    } else {
        writeln!(stdout, "{} occurrences", outcome.count)?;
    }

    for m in &outcome.matches {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "{}", m.sentence_id)?;
        stdout.reset()?;
        write!(stdout, ":")?;

        for (i, word) in m.words.iter().enumerate() {
            if i > 0 {
                write!(stdout, " ")?;
            }
            let in_match = i >= m.match_offset && i < m.match_offset + m.match_len;
            if in_match {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            }
            write!(stdout, "{}", display_symbol(word))?;
            if in_match {
                stdout.reset()?;
            }
        }
        writeln!(stdout)?;
    }

    if outcome.count > outcome.matches.len() as u64 {
        writeln!(
            stdout,
            "... {} more (raise --limit to see them)",
            outcome.count - outcome.matches.len() as u64
        )?;
    }

    Ok(())
}
