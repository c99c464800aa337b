//! Word frequency report over review titles and bodies

use crate::feed::ReviewFeed;
use std::collections::HashMap;
use std::io::{self, Write};

/// Common English words excluded from the report
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she",
    "should", "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

/// A word and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Returns true if `word` should not be counted
///
/// Contractions are dropped whole, as are numbers.
pub fn is_stop_word(word: &str) -> bool {
    word.contains('\'')
        || word.contains('\u{2019}')
        || word.chars().all(|c| c.is_ascii_digit())
        || STOP_WORDS.contains(&word)
}

/// Splits text into lowercase words, keeping apostrophes inside words
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|token| token.trim_matches(|c: char| c == '\'' || c == '\u{2019}'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Counts words across every review title and body
///
/// Results are sorted by descending count, ties alphabetically.
pub fn count_words(pages: &[ReviewFeed]) -> Vec<WordCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for entry in pages.iter().flat_map(|page| page.entries()) {
        if entry.quick_row().is_none() {
            continue;
        }

        let text = format!("{} {}", entry.title, entry.review_text());
        for word in tokenize(&text) {
            if !is_stop_word(&word) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut sorted: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    sorted
}

/// Writes one `Word: <word>, Count: <n>` line per counted word
pub fn write_word_report<W: Write>(counts: &[WordCount], out: &mut W) -> io::Result<()> {
    for entry in counts {
        writeln!(out, "Word: {}, Count: {}", entry.word, entry.count)?;
    }
    Ok(())
}
