//! Review feed payload
//!
//! Typed view of one page of the App Store customer review feed, plus the
//! row helpers the exporters build on.

mod types;

pub use types::{Attributes, Author, Content, Entry, Feed, Label, Link, ReviewFeed};

/// Column names matching [`Entry::quick_row`]
pub const QUICK_HEADERS: [&str; 8] = [
    "review_id",
    "title",
    "author",
    "author_url",
    "version",
    "rating",
    "review",
    "vote_count",
];

impl Entry {
    /// Column names for [`Entry::quick_row`]
    pub fn quick_headers() -> &'static [&'static str] {
        &QUICK_HEADERS
    }

    /// Review text on a single line, trimmed
    pub fn review_text(&self) -> String {
        self.content
            .label
            .trim()
            .replace('\n', " ")
            .replace('\t', " ")
    }

    /// Numeric star rating, if the feed carried a parsable one
    pub fn rating(&self) -> Option<u8> {
        self.im_rating.as_str().trim().parse().ok()
    }

    /// Flattened row of the review's main fields
    ///
    /// Returns `None` for entries without review text, which is how the feed
    /// represents the app metadata entry and filtered-out reviews.
    pub fn quick_row(&self) -> Option<Vec<String>> {
        let review = self.review_text();
        if review.is_empty() {
            return None;
        }

        Some(vec![
            self.id.as_str().trim().to_string(),
            self.title.as_str().trim().to_string(),
            self.author.name.as_str().trim().to_string(),
            self.author.uri.as_str().trim().to_string(),
            self.im_version.as_str().trim().to_string(),
            self.im_rating.as_str().trim().to_string(),
            review,
            self.im_vote_count.as_str().trim().to_string(),
        ])
    }
}

impl ReviewFeed {
    /// Review entries of this page
    pub fn entries(&self) -> &[Entry] {
        &self.feed.entry
    }
}
