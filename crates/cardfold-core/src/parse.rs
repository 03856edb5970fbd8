//! Parsing of newline-delimited `word: meaning` submissions.

use serde::{Deserialize, Serialize};

/// One parsed line of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
}

/// Parse a block of `word: meaning` lines.
///
/// Each line is split at its first colon and both halves are trimmed.
/// Lines without a colon, or with nothing before it, are skipped.
pub fn parse_word_list(text: &str) -> Vec<WordEntry> {
    text.split('\n').filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<WordEntry> {
    let (word, meaning) = line.split_once(':')?;
    let word = word.trim();
    if word.is_empty() {
        return None;
    }
    Some(WordEntry {
        word: word.to_string(),
        meaning: meaning.trim().to_string(),
    })
}
