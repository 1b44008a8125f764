// src/replace.rs

//! Run-level find/replace over every story of a document.

use std::io::{self, BufRead, Write};

use crate::docx::WordDocument;

/// Replaces `find` in every run of the body, table cells, headers and
/// footers. Returns the number of occurrences replaced. Matches spanning two
/// runs are not found.
pub fn replace_in_document(doc: &mut WordDocument, find: &str, replace: &str) -> usize {
    if find.is_empty() {
        return 0;
    }
    let mut count = 0;
    doc.for_each_paragraph_mut(&mut |paragraph| {
        for run in paragraph.runs_mut() {
            count += run.replace(find, replace);
        }
    });
    tracing::debug!("Replaced {} occurrences of '{}'", count, find);
    count
}

/// Applies each pair in order to the same document.
pub fn replace_all(doc: &mut WordDocument, pairs: &[(String, String)]) -> usize {
    pairs
        .iter()
        .map(|(find, replace)| replace_in_document(doc, find, replace))
        .sum()
}

/// Reads find/replace pairs interactively until an empty find line or EOF.
pub fn collect_replacements<R: BufRead, W: Write>(
    mut input: R,
    mut prompt: W,
) -> io::Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    loop {
        write!(prompt, "Text to find (empty to finish): ")?;
        prompt.flush()?;
        let Some(find) = read_line(&mut input)? else {
            break;
        };
        if find.is_empty() {
            break;
        }
        write!(prompt, "Replace with: ")?;
        prompt.flush()?;
        let replace = read_line(&mut input)?.unwrap_or_default();
        pairs.push((find, replace));
    }
    Ok(pairs)
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
