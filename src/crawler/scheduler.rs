//! Request scheduler
//!
//! The scheduler is the front door of the crate:
//! - Validates requests and merges their headers over the defaults
//! - Serves cache hits immediately, outside the queue
//! - Queues cache misses in submission order
//! - Runs a single lane worker that dispatches one fetch at a time, never
//!   closer together than the configured delay
//! - Caches cacheable responses and hands results back to their callers

use crate::cache::{CacheGateway, CacheStore};
use crate::config::Config;
use crate::crawler::adapter::{adapt, FetchResponse, RawPage};
use crate::crawler::fetcher::RedirectFetcher;
use crate::crawler::lane::{Lane, Next, Task};
use crate::crawler::parser::{DocumentParser, HtmlParser};
use crate::crawler::request::{header_map, FetchRequest, RequestOptions};
use crate::crawler::transport::{ReqwestTransport, Transport};
use crate::CourierError;
use reqwest::header::HeaderMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// State shared between the scheduler handle and its lane worker
struct Shared {
    default_headers: HeaderMap,
    gateway: CacheGateway,
    fetcher: RedirectFetcher,
    parser: Arc<dyn DocumentParser>,
    lane: Mutex<Lane>,
    /// Signalled whenever a task is queued or intake closes
    wakeup: Notify,
}

impl Shared {
    fn lane(&self) -> MutexGuard<'_, Lane> {
        self.lane.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lane().close();
        self.wakeup.notify_one();
    }

    /// Fetches a dispatched task and caches the page when eligible
    ///
    /// A failed cache write fails the task: the fetched body is dropped.
    async fn fetch_and_store(&self, options: &RequestOptions) -> Result<RawPage, CourierError> {
        let page = self.fetcher.fetch(&options.url, &options.headers).await?;
        let content_type = page.content_type().to_string();

        if self.gateway.is_cacheable(&content_type) {
            let text = String::from_utf8_lossy(&page.body);
            self.gateway.store(&options.url, &content_type, &text).await?;
        }

        Ok(RawPage {
            content_type,
            body: page.body,
            from_cache: false,
        })
    }
}

/// Drains the lane until it is closed and empty
async fn run_lane(shared: Arc<Shared>) {
    loop {
        // The guard is dropped before any await below
        let next = shared.lane().next(Instant::now());

        match next {
            Next::Dispatch { id, task } => {
                let Task { options, reply } = task;
                let started = Instant::now();
                tracing::debug!("Processing request[#{}]: {}", id, options.url);

                let outcome = shared.fetch_and_store(&options).await;

                match &outcome {
                    Ok(_) => tracing::debug!(
                        "Request[#{}] completed: spent={:?}",
                        id,
                        started.elapsed()
                    ),
                    Err(e) => tracing::warn!("Request[#{}] failed for {}: {}", id, options.url, e),
                }

                if reply.send(outcome).is_err() {
                    tracing::trace!("Caller of request[#{}] went away", id);
                }
            }
            Next::Wait(wait) => {
                tracing::trace!("Pacing: waiting {:?} before next dispatch", wait);
                tokio::time::sleep(wait).await;
            }
            Next::Idle => shared.wakeup.notified().await,
            Next::Closed => {
                tracing::debug!("Lane closed, worker exiting");
                break;
            }
        }
    }
}

/// Single-lane, rate-limited fetch scheduler
///
/// Must be created inside a tokio runtime: construction spawns the lane
/// worker. Share it between callers with an `Arc`.
///
/// # Example
///
/// ```no_run
/// use sumi_courier::{Config, FetchRequest, Scheduler};
///
/// # async fn run() -> sumi_courier::Result<()> {
/// let scheduler = Scheduler::new(Config::default())?;
/// let response = scheduler
///     .submit(FetchRequest::new("https://example.com/").with_document())
///     .await?;
/// println!("{:?}", response.title());
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Creates a scheduler with the reqwest transport and no cache store
    pub fn new(config: Config) -> Result<Self, CourierError> {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(config)
    }

    /// Fetches a page, from the cache when possible
    ///
    /// # Request Flow
    ///
    /// 1. Validate the URL and headers (fails before any await point)
    /// 2. Look the URL up in the cache; a hit is returned at once
    /// 3. Otherwise queue the request and wait for the lane to process it
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - The page, parsed when requested
    /// * `Err(CourierError)` - Parameter, transport, cache, or parse failure
    pub async fn submit(&self, request: impl Into<FetchRequest>) -> Result<FetchResponse, CourierError> {
        let options = RequestOptions::resolve(request.into(), &self.shared.default_headers)?;

        tracing::trace!(
            "Request: url={}, headers={:?}, document={}",
            options.url,
            options.headers,
            options.want_document
        );

        if let Some(entry) = self.shared.gateway.lookup(&options.url).await? {
            tracing::debug!(
                "Cache hit: [content_type={}, length={}] {}",
                entry.content_type,
                entry.body.len(),
                options.url
            );
            let page = RawPage {
                content_type: entry.content_type,
                body: entry.body.into(),
                from_cache: true,
            };
            return adapt(&*self.shared.parser, &options.url, options.want_document, page);
        }

        let url = options.url.clone();
        let want_document = options.want_document;
        let (reply, receiver) = oneshot::channel();

        {
            let mut lane = self.shared.lane();
            if lane.push(Task { options, reply }).is_err() {
                return Err(CourierError::Closed);
            }
            tracing::debug!("Queued {} ({} waiting)", url, lane.len());
        }
        self.shared.wakeup.notify_one();

        let page = match receiver.await {
            Ok(outcome) => outcome?,
            Err(_) => return Err(CourierError::Closed),
        };

        adapt(&*self.shared.parser, &url, want_document, page)
    }

    /// Number of queued, not yet dispatched requests
    pub fn queue_len(&self) -> usize {
        self.shared.lane().len()
    }

    /// Number of requests dispatched to the network so far
    pub fn dispatched(&self) -> u64 {
        self.shared.lane().dispatched()
    }

    /// Returns true if a cache store is configured
    pub fn cache_enabled(&self) -> bool {
        self.shared.gateway.is_enabled()
    }

    /// Stops accepting requests and waits for queued ones to finish
    pub async fn shutdown(mut self) {
        self.shared.close();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!("Lane worker terminated abnormally: {}", e);
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // The detached worker still drains whatever is queued
        self.shared.close();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("gateway", &self.shared.gateway)
            .field("queue_len", &self.queue_len())
            .field("dispatched", &self.dispatched())
            .finish()
    }
}

/// Builder for [`Scheduler`], wiring in optional collaborators
pub struct SchedulerBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CacheStore>>,
    parser: Option<Arc<dyn DocumentParser>>,
}

impl SchedulerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            parser: None,
        }
    }

    /// Uses a custom transport instead of [`ReqwestTransport`]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Enables caching through `store`
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses a custom document parser instead of the lenient [`HtmlParser`]
    pub fn parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Builds the scheduler and spawns its lane worker
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn build(self) -> Result<Scheduler, CourierError> {
        let config = self.config;

        let headers = config.effective_headers();
        let default_headers =
            header_map(headers.iter().map(|(name, value)| (name.as_str(), value.as_str())))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(HtmlParser::new()));

        tracing::debug!(
            "Scheduler: timeout={:?}, delay={:?}, max_redirect={}, cache={}",
            config.timeout(),
            config.delay(),
            config.request.max_redirect,
            self.store.is_some()
        );

        let shared = Arc::new(Shared {
            default_headers,
            gateway: CacheGateway::from_config(&config, self.store),
            fetcher: RedirectFetcher::new(transport, config.timeout(), config.request.max_redirect),
            parser,
            lane: Mutex::new(Lane::new(config.delay())),
            wakeup: Notify::new(),
        });

        let worker = tokio::spawn(run_lane(shared.clone()));

        Ok(Scheduler {
            shared,
            worker: Some(worker),
        })
    }
}
