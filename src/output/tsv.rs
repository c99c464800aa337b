//! Tab-separated export of review entries
//!
//! Tabs are used instead of commas because review text routinely contains
//! commas. Tabs and newlines inside fields are flattened by
//! [`Entry::quick_row`].

use crate::feed::{Entry, ReviewFeed};
use std::io::{self, Write};

/// Returns true if `entry` survives the rating filter
///
/// `0` keeps everything, `1..=4` drops reviews rated strictly above the
/// threshold. Entries without a parsable rating are always kept.
pub fn keep_entry(entry: &Entry, filter_review: u8) -> bool {
    match (filter_review, entry.rating()) {
        (1..=4, Some(rating)) => rating <= filter_review,
        _ => true,
    }
}

/// Writes a header row followed by one row per review
///
/// The header is written as soon as the first entry is seen, even if that
/// entry is filtered out; nothing is written when there are no entries.
///
/// # Returns
///
/// * `Ok(usize)` - Number of review rows written (header excluded)
/// * `Err(io::Error)` - Writing to `out` failed
pub fn write_tsv<W: Write>(pages: &[ReviewFeed], filter_review: u8, out: &mut W) -> io::Result<usize> {
    let mut header_written = false;
    let mut rows = 0;

    for entry in pages.iter().flat_map(|page| page.entries()) {
        if !header_written {
            writeln!(out, "{}", Entry::quick_headers().join("\t"))?;
            header_written = true;
        }

        if !keep_entry(entry, filter_review) {
            continue;
        }

        if let Some(row) = entry.quick_row() {
            writeln!(out, "{}", row.join("\t"))?;
            rows += 1;
        }
    }

    Ok(rows)
}
