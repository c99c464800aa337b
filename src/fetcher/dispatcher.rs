//! Dispatcher and collector for a paginated fetch
//!
//! The feed does not say how many pages it has, so workers are spawned one
//! after another until some worker signals exhaustion. Two activities run
//! side by side:
//! - the dispatcher task spawns workers while the cancellation token is not
//!   raised, bounded by the number of outstanding workers
//! - the collector drains decoded pages until cancellation is observed
//!
//! Pages arrive in completion order, not page order.

use crate::config::{validate, Config, FetcherConfig};
use crate::feed::ReviewFeed;
use crate::fetcher::client::build_http_client;
use crate::fetcher::cursor::PageCursor;
use crate::fetcher::slots::ConcurrencySlots;
use crate::fetcher::user_agent::UserAgentPool;
use crate::fetcher::worker::{FetchContext, FetchWorker, WorkerEvent};
use crate::{FetchError, ReviewError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Everything a fetch produced, including what it lost
#[derive(Debug)]
pub struct FetchReport<P> {
    /// Decoded pages in arrival order
    pub pages: Vec<P>,

    /// Page number of each entry in `pages`
    pub page_numbers: Vec<u64>,

    /// Requests that failed in transport; their pages are missing
    pub dropped: Vec<FetchError>,

    /// First outcome that raised cancellation
    pub exhaustion: Option<FetchError>,

    /// Workers launched by the dispatcher
    pub workers_spawned: u64,

    /// Page numbers handed out by the cursor
    pub pages_requested: u64,
}

impl<P> FetchReport<P> {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            page_numbers: Vec::new(),
            dropped: Vec::new(),
            exhaustion: None,
            workers_spawned: 0,
            pages_requested: 0,
        }
    }

    fn record(&mut self, event: WorkerEvent<P>) {
        match event {
            WorkerEvent::Page { page, payload } => {
                self.pages.push(payload);
                self.page_numbers.push(page);
            }
            WorkerEvent::Failed(error) if error.is_exhaustion() => {
                if self.exhaustion.is_none() {
                    self.exhaustion = Some(error);
                }
            }
            WorkerEvent::Failed(error) => {
                self.dropped.push(error);
                if self.dropped.len() % 100 == 0 {
                    tracing::warn!(
                        "{} pages dropped by transport errors so far, last: {}",
                        self.dropped.len(),
                        self.dropped[self.dropped.len() - 1]
                    );
                }
            }
        }
    }
}

/// Fetches every page of a review feed
///
/// A fetcher can be reused; each call to [`ReviewFetcher::fetch_all`] gets
/// its own cursor, slot pool and cancellation token.
#[derive(Debug, Clone)]
pub struct ReviewFetcher {
    client: Client,
    config: FetcherConfig,
    user_agents: Arc<UserAgentPool>,
}

impl ReviewFetcher {
    /// Validates the configuration and builds a client from its transport settings
    pub fn new(config: &Config) -> Result<Self, ReviewError> {
        validate(config)?;
        let client = build_http_client(&config.transport)?;
        Ok(Self::with_client(
            client,
            config.fetcher.clone(),
            UserAgentPool::from_config(&config.user_agent),
        ))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, config: FetcherConfig, user_agents: UserAgentPool) -> Self {
        Self {
            client,
            config,
            user_agents: Arc::new(user_agents),
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetches pages until the feed is exhausted and returns them in arrival order
    ///
    /// Page-level failures are never returned; pages lost to transport
    /// errors are simply missing. Use [`ReviewFetcher::fetch_all_with_report`]
    /// to see them.
    pub async fn fetch_all<P>(&self, identifier: &str) -> Vec<P>
    where
        P: DeserializeOwned + Send + 'static,
    {
        self.fetch_all_with_report(identifier).await.pages
    }

    /// Fetches pages until the feed is exhausted and reports every outcome
    ///
    /// # Flow
    ///
    /// 1. Spawn the dispatcher task, which launches workers until cancelled
    /// 2. Drain worker events, preferring queued pages over the cancellation
    ///    signal
    /// 3. Once cancelled, either return right away or, in settle mode, wait
    ///    for every spawned worker and drain what they produced
    pub async fn fetch_all_with_report<P>(&self, identifier: &str) -> FetchReport<P>
    where
        P: DeserializeOwned + Send + 'static,
    {
        tracing::info!("Fetching review feed for {}", identifier);

        let cancel = CancellationToken::new();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let context = Arc::new(FetchContext {
            client: self.client.clone(),
            feed_url: self.config.feed_url.clone(),
            identifier: identifier.to_string(),
            cursor: PageCursor::new(),
            slots: ConcurrencySlots::new(self.config.concurrency as usize, self.config.max_jitter()),
            user_agents: self.user_agents.clone(),
            cancel: cancel.clone(),
            events: events_tx,
            settle: self.config.settle_in_flight,
        });
        let _scope = InvocationScope {
            context: context.clone(),
        };

        let pending_capacity = self.config.pending_capacity();
        let pending = Arc::new(Semaphore::new(pending_capacity));
        let dispatcher = tokio::spawn(spawn_workers(context.clone(), pending.clone()));

        let mut report = FetchReport::new();

        loop {
            tokio::select! {
                biased;
                Some(event) = events_rx.recv() => report.record(event),
                _ = cancel.cancelled() => break,
            }
        }

        report.workers_spawned = dispatcher.await.unwrap_or_else(|e| {
            tracing::warn!("Dispatcher task failed: {}", e);
            0
        });

        if self.config.settle_in_flight {
            tracing::debug!("Feed exhausted, waiting for in-flight workers");
            let settled = pending.acquire_many(pending_capacity as u32);
            tokio::pin!(settled);

            loop {
                tokio::select! {
                    biased;
                    Some(event) = events_rx.recv() => report.record(event),
                    _ = &mut settled => break,
                }
            }

            while let Ok(event) = events_rx.try_recv() {
                report.record(event);
            }
        }

        report.pages_requested = context.cursor.issued();

        match &report.exhaustion {
            Some(cause) => tracing::debug!("Stopped by: {}", cause),
            None => tracing::debug!("Stopped without a recorded cause"),
        }
        tracing::info!(
            "Fetched {} pages for {} ({} requested, {} dropped, {} workers)",
            report.pages.len(),
            identifier,
            report.pages_requested,
            report.dropped.len(),
            report.workers_spawned
        );

        report
    }
}

/// Ends a fetch invocation when dropped
///
/// Raises cancellation and closes the slot pool, whether the invocation
/// returned normally or its future was dropped by the caller. Workers still
/// waiting for a slot then finish as abandoned without taking a page number.
struct InvocationScope<P> {
    context: Arc<FetchContext<P>>,
}

impl<P> Drop for InvocationScope<P> {
    fn drop(&mut self) {
        self.context.cancel.cancel();
        self.context.slots.close();
    }
}

/// Spawn loop: launches workers until cancellation, returns how many it launched
///
/// Each worker holds one pending permit for its whole life, so at most
/// `pending` workers exist at a time. Execution is throttled separately by
/// the slot pool.
async fn spawn_workers<P>(context: Arc<FetchContext<P>>, pending: Arc<Semaphore>) -> u64
where
    P: DeserializeOwned + Send + 'static,
{
    let mut spawned = 0u64;

    loop {
        let permit = tokio::select! {
            biased;
            _ = context.cancel.cancelled() => break,
            permit = pending.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        spawned += 1;
        let id = spawned;
        let worker = FetchWorker::new(id, context.clone());
        tokio::spawn(async move {
            let state = worker.run().await;
            drop(permit);
            tracing::trace!("Worker {} finished as {}", id, state);
        });
    }

    tracing::debug!("Dispatcher stopped after spawning {} workers", spawned);
    spawned
}

/// Fetches every page of an app's review feed with the given configuration
///
/// # Arguments
///
/// * `config` - Fetcher, transport and user agent settings
/// * `app_id` - Numeric App Store identifier
///
/// # Returns
///
/// * `Ok(Vec<ReviewFeed>)` - Decoded pages in arrival order
/// * `Err(ReviewError)` - The configuration is invalid or the HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use app_reviews::{fetch_app_reviews, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pages = fetch_app_reviews(&Config::default(), "639881495").await?;
/// println!("{} pages", pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_app_reviews(config: &Config, app_id: &str) -> Result<Vec<ReviewFeed>, ReviewError> {
    let fetcher = ReviewFetcher::new(config)?;
    Ok(fetcher.fetch_all(app_id).await)
}
