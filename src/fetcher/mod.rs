//! Fetcher module for paginated review feed retrieval
//!
//! This module contains the concurrent fetch engine, including:
//! - The shared page cursor
//! - The bounded slot pool with jitter
//! - Per-page fetch workers and their outcome classification
//! - The dispatcher/collector that runs a whole fetch
//! - HTTP client construction and user agent rotation

mod client;
mod cursor;
mod dispatcher;
mod slots;
mod user_agent;
mod worker;

pub use client::build_http_client;
pub use cursor::PageCursor;
pub use dispatcher::{fetch_app_reviews, FetchReport, ReviewFetcher};
pub use slots::{ConcurrencySlots, SlotGuard};
pub use user_agent::{UserAgentPool, DEFAULT_USER_AGENTS};
pub use worker::feed_page_url;
