//! Integration tests for the paginated fetcher
//!
//! These tests use wiremock to serve a fake review feed whose pages can
//! succeed, fail, stall, or return garbage, and run whole fetches against it.

use app_reviews::config::{Config, FetcherConfig};
use app_reviews::fetcher::{ReviewFetcher, UserAgentPool};
use app_reviews::output::write_tsv;
use app_reviews::{fetch_app_reviews, FetchError, FetchReport};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const AGENT: &str = "ReviewTest/1.0";
const FEED_PATH: &str = r"^/rss/customerreviews/id=[^/]+/page=\d+/sortby=mostrecent/json$";

/// Minimal page payload
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
struct TestPage {
    entries: Vec<String>,
}

#[derive(Debug, Clone)]
enum Reply {
    Json(serde_json::Value),
    Status(u16),
    Raw(&'static str),
}

/// Serves pages by number and records when each request arrived
struct PagedFeed {
    replies: HashMap<u64, (Reply, Duration)>,
    fallback: Reply,
    arrivals: Arc<Mutex<Vec<(u64, Instant)>>>,
}

impl PagedFeed {
    fn new(fallback: Reply) -> Self {
        Self {
            replies: HashMap::new(),
            fallback,
            arrivals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pages `1..=count` each carry one entry, everything after returns `fallback`
    fn with_pages(count: u64, fallback: Reply) -> Self {
        (1..=count).fold(Self::new(fallback), |feed, n| {
            feed.page(n, entries_page(&format!("p{}", n)))
        })
    }

    fn page(self, n: u64, reply: Reply) -> Self {
        self.delayed(n, reply, Duration::ZERO)
    }

    fn delayed(mut self, n: u64, reply: Reply, delay: Duration) -> Self {
        self.replies.insert(n, (reply, delay));
        self
    }

    fn arrivals(&self) -> Arc<Mutex<Vec<(u64, Instant)>>> {
        self.arrivals.clone()
    }
}

impl Respond for PagedFeed {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page = page_number(request);
        self.arrivals.lock().unwrap().push((page, Instant::now()));

        let (reply, delay) = self
            .replies
            .get(&page)
            .cloned()
            .unwrap_or((self.fallback.clone(), Duration::ZERO));

        let template = match reply {
            Reply::Json(body) => ResponseTemplate::new(200).set_body_json(body),
            Reply::Status(status) => ResponseTemplate::new(status),
            Reply::Raw(body) => ResponseTemplate::new(200).set_body_string(body),
        };
        template.set_delay(delay)
    }
}

fn page_number(request: &Request) -> u64 {
    request
        .url
        .path()
        .split('/')
        .find_map(|segment| segment.strip_prefix("page="))
        .and_then(|n| n.parse().ok())
        .expect("request path carries a page number")
}

fn entries_page(word: &str) -> Reply {
    Reply::Json(json!({ "entries": [word] }))
}

async fn mount(server: &MockServer, feed: PagedFeed) {
    Mock::given(method("GET"))
        .and(path_regex(FEED_PATH))
        .and(header("user-agent", AGENT))
        .respond_with(feed)
        .mount(server)
        .await;
}

fn feed_url(server: &MockServer) -> String {
    format!(
        "{}/rss/customerreviews/id={{id}}/page={{page}}/sortby=mostrecent/json",
        server.uri()
    )
}

/// Creates a fetcher without jitter and with a short request timeout
fn create_fetcher(server: &MockServer, concurrency: u32, settle: bool, timeout: Duration) -> ReviewFetcher {
    let config = FetcherConfig {
        feed_url: feed_url(server),
        concurrency,
        max_jitter_ms: 0,
        max_pending_workers: None,
        settle_in_flight: settle,
    };
    let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
    ReviewFetcher::with_client(client, config, UserAgentPool::new(vec![AGENT.to_string()]))
}

async fn run(fetcher: &ReviewFetcher, identifier: &str) -> FetchReport<TestPage> {
    tokio::time::timeout(Duration::from_secs(20), fetcher.fetch_all_with_report(identifier))
        .await
        .expect("fetch did not terminate")
}

fn sorted_numbers(report: &FetchReport<TestPage>) -> Vec<u64> {
    let mut numbers = report.page_numbers.clone();
    numbers.sort_unstable();
    numbers
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_three_pages_then_bad_request() {
    let server = MockServer::start().await;
    let feed = PagedFeed::new(Reply::Status(400))
        .page(1, entries_page("a"))
        .page(2, entries_page("b"))
        .page(3, entries_page("c"));
    mount(&server, feed).await;

    let fetcher = create_fetcher(&server, 10, true, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;

    let content: BTreeSet<TestPage> = report.pages.iter().cloned().collect();
    let expected: BTreeSet<TestPage> = ["a", "b", "c"]
        .iter()
        .map(|w| TestPage {
            entries: vec![w.to_string()],
        })
        .collect();

    assert_eq!(report.pages.len(), 3);
    assert_eq!(content, expected);
    assert_eq!(sorted_numbers(&report), vec![1, 2, 3]);
    assert!(matches!(
        report.exhaustion,
        Some(FetchError::ExhaustionStatus { status: 400, .. })
    ));
    assert!(report.dropped.is_empty());
    assert!(report.pages_requested >= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_returns_exactly_n_pages() {
    for n in [0u64, 1, 7, 25] {
        let server = MockServer::start().await;
        mount(&server, PagedFeed::with_pages(n, Reply::Status(404))).await;

        let fetcher = create_fetcher(&server, 4, true, Duration::from_secs(5));
        let report = run(&fetcher, "42").await;

        assert_eq!(report.pages.len() as u64, n, "feed with {} pages", n);
        assert_eq!(sorted_numbers(&report), (1..=n).collect::<Vec<_>>());
        assert!(report.workers_spawned >= report.pages_requested);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_immediate_mode_returns_distinct_subset() {
    let server = MockServer::start().await;
    mount(&server, PagedFeed::with_pages(12, Reply::Status(400))).await;

    let fetcher = create_fetcher(&server, 5, false, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;

    let numbers = sorted_numbers(&report);
    let unique: BTreeSet<u64> = numbers.iter().copied().collect();

    assert_eq!(unique.len(), numbers.len());
    assert!(numbers.iter().all(|n| (1..=12).contains(n)));
    for (page, number) in report.pages.iter().zip(&report.page_numbers) {
        assert_eq!(page.entries, vec![format!("p{}", number)]);
    }
    assert!(report.exhaustion.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_immediate_mode_returns_before_slow_pages() {
    let server = MockServer::start().await;
    let slow = Duration::from_millis(400);
    let feed = (1..=3).fold(PagedFeed::new(Reply::Status(400)), |feed, n| {
        feed.delayed(n, entries_page("late"), slow)
    });
    mount(&server, feed).await;

    let fetcher = create_fetcher(&server, 4, false, Duration::from_secs(5));
    let start = Instant::now();
    let report = run(&fetcher, "42").await;

    assert!(start.elapsed() < slow, "fetch waited for the slow pages");
    assert!(report.pages.is_empty());
    assert!(matches!(
        report.exhaustion,
        Some(FetchError::ExhaustionStatus { status: 400, .. })
    ));

    // The slow workers finish on their own and nothing new goes out
    tokio::time::sleep(slow + Duration::from_millis(200)).await;
    let settled = server.received_requests().await.unwrap().len();
    assert!(settled <= 4, "{} requests after exhaustion", settled);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), settled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropped_fetch_stops_requesting() {
    let server = MockServer::start().await;
    let feed = (1..=1000).fold(PagedFeed::new(Reply::Status(400)), |feed, n| {
        feed.delayed(n, entries_page("x"), Duration::from_millis(50))
    });
    mount(&server, feed).await;

    let fetcher = create_fetcher(&server, 2, false, Duration::from_secs(5));
    let outcome = tokio::time::timeout(
        Duration::from_millis(200),
        fetcher.fetch_all_with_report::<TestPage>("42"),
    )
    .await;
    assert!(outcome.is_err(), "feed should still be running when dropped");

    // Let the requests already on the wire complete
    tokio::time::sleep(Duration::from_millis(200)).await;
    let at_drop = server.received_requests().await.unwrap().len();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let later = server.received_requests().await.unwrap().len();

    assert_eq!(at_drop, later, "workers kept fetching after the fetch was dropped");
}

#[tokio::test]
async fn test_malformed_first_page() {
    let server = MockServer::start().await;
    let feed = PagedFeed::new(Reply::Status(400)).page(1, Reply::Raw("{not json"));
    mount(&server, feed).await;

    let fetcher = create_fetcher(&server, 10, false, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;

    assert!(report.pages.is_empty());
    assert!(report.exhaustion.is_some());
}

#[tokio::test]
async fn test_every_page_malformed() {
    let server = MockServer::start().await;
    mount(&server, PagedFeed::new(Reply::Raw("<html>maintenance</html>"))).await;

    let fetcher = create_fetcher(&server, 3, true, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;

    assert!(report.pages.is_empty());
    assert!(matches!(report.exhaustion, Some(FetchError::Decode { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transport_error_drops_only_that_page() {
    let server = MockServer::start().await;
    let feed = PagedFeed::with_pages(6, Reply::Status(400)).delayed(
        3,
        entries_page("p3"),
        Duration::from_secs(3),
    );
    mount(&server, feed).await;

    let fetcher = create_fetcher(&server, 4, true, Duration::from_millis(500));
    let report = run(&fetcher, "42").await;

    assert_eq!(sorted_numbers(&report), vec![1, 2, 4, 5, 6]);
    assert_eq!(report.dropped.len(), 1);
    assert!(matches!(
        report.dropped[0],
        FetchError::Transport { page: 3, .. }
    ));
    assert!(matches!(
        report.exhaustion,
        Some(FetchError::ExhaustionStatus { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exhaustion_is_idempotent() {
    let server = MockServer::start().await;
    mount(&server, PagedFeed::new(Reply::Status(503))).await;

    let fetcher = create_fetcher(&server, 10, true, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;

    assert!(report.pages.is_empty());
    assert!(matches!(
        report.exhaustion,
        Some(FetchError::ExhaustionStatus { status: 503, .. })
    ));
    assert!(report.pages_requested >= 1);

    // The fetcher is reusable after a cancelled run
    let again = run(&fetcher, "42").await;
    assert!(again.pages.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_third_page_waits_for_a_free_slot() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(300);
    let feed = PagedFeed::new(Reply::Status(400))
        .delayed(1, entries_page("a"), delay)
        .delayed(2, entries_page("b"), delay)
        .page(3, entries_page("c"));
    let arrivals = feed.arrivals();
    mount(&server, feed).await;

    let fetcher = create_fetcher(&server, 2, true, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;
    assert_eq!(sorted_numbers(&report), vec![1, 2, 3]);

    let arrivals = arrivals.lock().unwrap().clone();
    let arrived = |page: u64| {
        arrivals
            .iter()
            .find(|(n, _)| *n == page)
            .map(|(_, at)| *at)
            .expect("page was requested")
    };

    let first_slow = arrived(1).min(arrived(2));
    assert!(
        arrived(3).duration_since(first_slow) >= Duration::from_millis(250),
        "page 3 started before a slot was released"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_server_never_sees_more_than_capacity() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(200);
    let feed = (1..=9).fold(PagedFeed::new(Reply::Status(400)), |feed, n| {
        feed.delayed(n, entries_page("x"), delay)
    });
    let arrivals = feed.arrivals();
    mount(&server, feed).await;

    let capacity = 3;
    let fetcher = create_fetcher(&server, capacity, true, Duration::from_secs(5));
    let report = run(&fetcher, "42").await;
    assert_eq!(report.pages.len(), 9);

    // A delayed request is still open for the whole delay after it arrives
    let window = Duration::from_millis(180);
    let arrivals = arrivals.lock().unwrap().clone();
    for (_, at) in &arrivals {
        let open = arrivals
            .iter()
            .filter(|(page, other)| *page <= 9 && *other <= *at && at.duration_since(*other) < window)
            .count();
        assert!(open <= capacity as usize, "{} requests open at once", open);
    }
}

#[tokio::test]
async fn test_bad_identifier_stops_without_requests() {
    let server = MockServer::start().await;
    mount(&server, PagedFeed::with_pages(3, Reply::Status(400))).await;

    let fetcher = create_fetcher(&server, 4, true, Duration::from_secs(5));
    let report = run(&fetcher, "bad/id").await;

    assert!(report.pages.is_empty());
    assert!(matches!(
        report.exhaustion,
        Some(FetchError::RequestConstruction { .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;
    mount(&server, PagedFeed::with_pages(2, Reply::Status(400))).await;

    let config = FetcherConfig {
        feed_url: feed_url(&server),
        max_jitter_ms: 0,
        settle_in_flight: true,
        ..Default::default()
    };
    let wrong_agent = ReviewFetcher::with_client(
        reqwest::Client::new(),
        config,
        UserAgentPool::new(vec!["Other/2.0".to_string()]),
    );

    // Unmatched requests get wiremock's 404, which ends the feed
    let report = run(&wrong_agent, "42").await;
    assert!(report.pages.is_empty());
    assert!(matches!(
        report.exhaustion,
        Some(FetchError::ExhaustionStatus { status: 404, .. })
    ));

    let right_agent = create_fetcher(&server, 4, true, Duration::from_secs(5));
    assert_eq!(run(&right_agent, "42").await.pages.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jitter_still_collects_all_pages() {
    let server = MockServer::start().await;
    mount(&server, PagedFeed::with_pages(5, Reply::Status(400))).await;

    let config = FetcherConfig {
        feed_url: feed_url(&server),
        concurrency: 3,
        max_jitter_ms: 100,
        max_pending_workers: Some(4),
        settle_in_flight: true,
    };
    let fetcher = ReviewFetcher::with_client(
        reqwest::Client::new(),
        config,
        UserAgentPool::new(vec![AGENT.to_string()]),
    );

    let report = run(&fetcher, "42").await;
    assert_eq!(sorted_numbers(&report), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_fetch_app_reviews_end_to_end() {
    let server = MockServer::start().await;

    let page = |id: &str, rating: &str, text: &str| {
        json!({
            "feed": {
                "title": {"label": "Customer Reviews"},
                "entry": {
                    "id": {"label": id},
                    "title": {"label": "Review"},
                    "author": {"name": {"label": "someone"}, "uri": {"label": "https://example.com/u"}},
                    "im:rating": {"label": rating},
                    "im:version": {"label": "1.0"},
                    "im:voteCount": {"label": "0"},
                    "content": {"label": text, "attributes": {"type": "text"}}
                }
            }
        })
    };

    let feed = PagedFeed::new(Reply::Status(400))
        .page(1, Reply::Json(page("100", "5", "Love it")))
        .page(2, Reply::Json(page("200", "1", "Crashes\non launch")));

    // No header matcher here: the built-in user agent list is in use
    Mock::given(method("GET"))
        .and(path_regex(FEED_PATH))
        .respond_with(feed)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.fetcher.feed_url = feed_url(&server);
    config.fetcher.max_jitter_ms = 0;
    config.fetcher.settle_in_flight = true;

    let pages = tokio::time::timeout(Duration::from_secs(20), fetch_app_reviews(&config, "639881495"))
        .await
        .expect("fetch did not terminate")
        .expect("client builds");

    assert_eq!(pages.len(), 2);

    let mut out = Vec::new();
    let rows = write_tsv(&pages, 0, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(rows, 2);
    assert!(text.starts_with("review_id\t"));
    assert!(text.contains("Crashes on launch"));

    let mut out = Vec::new();
    assert_eq!(write_tsv(&pages, 4, &mut out).unwrap(), 1);
}
