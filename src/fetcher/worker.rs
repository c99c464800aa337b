//! Single page fetch worker
//!
//! A worker fetches exactly one page:
//! - takes a concurrency slot (jitter included)
//! - takes the next page number and builds the request
//! - sends it and classifies the response
//! - emits the decoded page, drops it, or signals feed exhaustion
//!
//! | Outcome | Cancellation | Terminal state |
//! |---------|--------------|----------------|
//! | Request cannot be built | raised | ExhaustionSignaled |
//! | Transport error | not raised | Dropped |
//! | Status other than 200 | raised | ExhaustionSignaled |
//! | Body does not decode | raised | ExhaustionSignaled |
//! | Page decoded | not raised | Emitted |

use crate::fetcher::cursor::PageCursor;
use crate::fetcher::slots::ConcurrencySlots;
use crate::fetcher::user_agent::UserAgentPool;
use crate::state::WorkerState;
use crate::FetchError;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Message from a worker to the collector
#[derive(Debug)]
pub(crate) enum WorkerEvent<P> {
    /// A decoded page
    Page { page: u64, payload: P },
    /// A request that produced no page
    Failed(FetchError),
}

/// State shared by every worker of one fetch invocation
pub(crate) struct FetchContext<P> {
    pub client: Client,
    pub feed_url: String,
    pub identifier: String,
    pub cursor: PageCursor,
    pub slots: ConcurrencySlots,
    pub user_agents: Arc<UserAgentPool>,
    pub cancel: CancellationToken,
    pub events: UnboundedSender<WorkerEvent<P>>,
    /// Whether the collector keeps draining after cancellation
    pub settle: bool,
}

/// Fetches one page of the feed
pub(crate) struct FetchWorker<P> {
    id: u64,
    state: WorkerState,
    context: Arc<FetchContext<P>>,
}

impl<P> FetchWorker<P>
where
    P: DeserializeOwned + Send + 'static,
{
    pub fn new(id: u64, context: Arc<FetchContext<P>>) -> Self {
        Self {
            id,
            state: WorkerState::Spawned,
            context,
        }
    }

    /// Runs the worker to completion and returns its terminal state
    pub async fn run(mut self) -> WorkerState {
        self.transition(WorkerState::AcquiringSlot);

        let Some(slot) = self.context.slots.acquire().await else {
            return self.transition(WorkerState::Abandoned);
        };

        if self.context.cancel.is_cancelled() {
            return self.transition(WorkerState::Abandoned);
        }

        let page = self.context.cursor.next();
        let request = match self.build_request(page) {
            Ok(request) => request,
            Err(error) => return self.signal_exhaustion(error),
        };
        self.transition(WorkerState::RequestBuilt);

        tracing::trace!("Worker {} requesting page {}", self.id, page);
        self.transition(WorkerState::Sent);
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                let error = FetchError::Transport { page, source };
                tracing::debug!("{}", error);
                let _ = self.context.events.send(WorkerEvent::Failed(error));
                return self.transition(WorkerState::Dropped);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return self.signal_exhaustion(FetchError::ExhaustionStatus {
                page,
                status: status.as_u16(),
            });
        }
        self.transition(WorkerState::Classified);

        let payload = match decode::<P>(response).await {
            Ok(payload) => payload,
            Err(message) => return self.signal_exhaustion(FetchError::Decode { page, message }),
        };

        drop(slot);
        self.emit(page, payload);
        self.transition(WorkerState::Emitted)
    }

    /// Builds the GET request for `page` with a rotated user agent
    fn build_request(&self, page: u64) -> Result<RequestBuilder, FetchError> {
        let url = feed_page_url(&self.context.feed_url, &self.context.identifier, page)?;

        let agent = self.context.user_agents.next_agent();
        let agent = HeaderValue::from_str(agent).map_err(|e| FetchError::RequestConstruction {
            page,
            message: format!("invalid user agent '{}': {}", agent, e),
        })?;

        Ok(self.context.client.get(url).header(USER_AGENT, agent))
    }

    /// Hands a page to the collector unless nobody will read it anymore
    fn emit(&self, page: u64, payload: P) {
        if self.context.cancel.is_cancelled() && !self.context.settle {
            tracing::debug!("Discarding page {} decoded after cancellation", page);
            return;
        }

        if self
            .context
            .events
            .send(WorkerEvent::Page { page, payload })
            .is_err()
        {
            tracing::debug!("Collector gone, discarding page {}", page);
        }
    }

    /// Reports the cause to the collector, then raises cancellation
    ///
    /// The event is queued before the token fires so the collector always
    /// sees it before it observes cancellation.
    fn signal_exhaustion(&mut self, error: FetchError) -> WorkerState {
        tracing::debug!("Worker {}: {}", self.id, error);
        let _ = self.context.events.send(WorkerEvent::Failed(error));
        self.context.cancel.cancel();
        self.transition(WorkerState::ExhaustionSignaled)
    }

    fn transition(&mut self, next: WorkerState) -> WorkerState {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid worker transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Worker {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        next
    }
}

/// Reads the whole body and decodes it as JSON
///
/// A body that cannot be read counts as undecodable.
async fn decode<P: DeserializeOwned>(response: Response) -> Result<P, String> {
    let body = response.bytes().await.map_err(|e| e.to_string())?;
    serde_json::from_slice(&body).map_err(|e| e.to_string())
}

/// Builds the URL of one feed page from the template
///
/// # Arguments
///
/// * `template` - Feed URL with `{id}` and `{page}` placeholders
/// * `identifier` - App identifier substituted for `{id}`
/// * `page` - Page number substituted for `{page}`
///
/// # Returns
///
/// * `Ok(Url)` - The page URL
/// * `Err(FetchError::RequestConstruction)` - The identifier is empty or would
///   change the URL structure, or the result does not parse
pub fn feed_page_url(template: &str, identifier: &str, page: u64) -> Result<Url, FetchError> {
    let invalid = |message: String| FetchError::RequestConstruction { page, message };

    if identifier.is_empty() {
        return Err(invalid("identifier is empty".to_string()));
    }

    if identifier
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace() || c.is_control())
    {
        return Err(invalid(format!(
            "identifier '{}' contains URL delimiters or whitespace",
            identifier.escape_debug()
        )));
    }

    let raw = template
        .replace("{id}", identifier)
        .replace("{page}", &page.to_string());

    Url::parse(&raw).map_err(|e| invalid(format!("'{}': {}", raw, e)))
}
