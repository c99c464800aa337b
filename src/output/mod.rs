//! Output module for rendering fetched reviews
//!
//! This module handles:
//! - Tab-separated export with an optional rating filter
//! - Word frequency reports over review text

mod tsv;
mod words;

pub use tsv::{keep_entry, write_tsv};
pub use words::{count_words, is_stop_word, write_word_report, WordCount, STOP_WORDS};

use crate::config::{OutputConfig, OutputFormat};
use crate::feed::ReviewFeed;
use std::io::{self, Write};

/// Renders pages in the configured format
///
/// # Arguments
///
/// * `pages` - Fetched feed pages
/// * `config` - Output format and rating filter
/// * `out` - Destination writer
pub fn render<W: Write>(pages: &[ReviewFeed], config: &OutputConfig, out: &mut W) -> io::Result<()> {
    match config.format {
        OutputFormat::Tsv => {
            let rows = write_tsv(pages, config.filter_review, out)?;
            tracing::info!("Wrote {} review rows", rows);
        }
        OutputFormat::Words => {
            let counts = count_words(pages);
            tracing::info!("Counted {} distinct words", counts.len());
            write_word_report(&counts, out)?;
        }
    }
    out.flush()
}
