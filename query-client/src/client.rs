//! Query session: one outbound call per query, reconciled into a shared
//! result slot.
//!
//! Concurrency model: starting a new query bumps a generation counter and
//! installs a fresh [`QueryResult`]. A reconciliation carries the generation
//! it was started with and re-checks it under the state lock before every
//! mutation, so late chunks of a superseded query are silently discarded
//! instead of clobbering the newer query's state.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header;
use tracing::{debug, warn};

use crate::error::{QueryClientError, Result};
use crate::reconcile::{EventStreamBuffer, ReconcileBuffer, ReconcileUpdate, Utf8Accumulator};
use crate::types::{QueryRequest, QueryResponse, QueryResult, StreamChunk};

/// Transport configuration for the query client.
#[derive(Debug, Clone, Default)]
pub struct QueryClientConfig {
    /// Base URL of the query service. Must be non-empty: reqwest rejects a
    /// relative request URL at send time, so [`QueryClient::new`] refuses an
    /// empty base up front.
    pub base_url: String,
    /// Optional per-request timeout. `None` relies on transport defaults.
    pub timeout: Option<Duration>,
}

impl QueryClientConfig {
    /// Reads the base URL from `VAULTIQ_API_URL` and an optional timeout
    /// from `VAULTIQ_QUERY_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("VAULTIQ_API_URL").unwrap_or_default();
        let timeout = std::env::var("VAULTIQ_QUERY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        Self { base_url, timeout }
    }
}

/// Thin HTTP client for `POST {base}/api/query`.
#[derive(Debug)]
pub struct QueryClient {
    client: reqwest::Client,
    url_query: String,
}

impl QueryClient {
    /// Builds the client and resolves the query endpoint once.
    ///
    /// # Errors
    /// [`QueryClientError::Config`] if the base URL is empty,
    /// [`QueryClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(cfg: &QueryClientConfig) -> Result<Self> {
        let base = cfg.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(QueryClientError::Config(
                "base URL is empty; set VAULTIQ_API_URL to the query service address".into(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let url_query = format!("{base}/api/query");

        Ok(Self { client, url_query })
    }

    async fn send(&self, request: &QueryRequest) -> Result<reqwest::Response> {
        debug!(target: "query_client", "POST {}", self.url_query);
        let resp = self
            .client
            .post(&self.url_query)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;
        Ok(resp)
    }
}

/// A reconciler instance: owns the result slot and runs at most one
/// *observed* query at a time (older in-flight calls keep draining but can
/// no longer touch the slot).
#[derive(Clone)]
pub struct QuerySession {
    client: Arc<QueryClient>,
    state: Arc<Mutex<QueryResult>>,
    /// Gates data writes (answer, sources, error); bumped by `ask` and
    /// `reset`.
    generation: Arc<AtomicU64>,
    /// Gates the loading-flag clear; bumped only by `ask`, so a `reset`
    /// discards a superseded query's data without leaving its loading flag
    /// stuck on.
    ask_generation: Arc<AtomicU64>,
}

impl QuerySession {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client: Arc::new(client),
            state: Arc::new(Mutex::new(QueryResult::default())),
            generation: Arc::new(AtomicU64::new(0)),
            ask_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Session configured from the environment.
    ///
    /// # Errors
    /// [`QueryClientError::Config`] if `VAULTIQ_API_URL` is unset or empty,
    /// [`QueryClientError::Transport`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(QueryClient::new(&QueryClientConfig::from_env())?))
    }

    /// Current view of the result slot.
    pub fn snapshot(&self) -> QueryResult {
        self.lock_state().clone()
    }

    /// Clears `answer`, `sources` and `error`; leaves `is_loading` untouched
    /// and performs no network activity. Supersedes any in-flight query's
    /// data writes; that query still clears its own loading flag when it
    /// settles.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock_state();
        state.answer.clear();
        state.sources.clear();
        state.error = None;
    }

    /// Runs one query end to end and returns the settled result.
    ///
    /// All failures are recorded into [`QueryResult::error`]; none escape as
    /// `Err`. A query that is blank after trimming performs no network call
    /// and leaves the slot unchanged.
    pub async fn ask(&self, request: QueryRequest) -> QueryResult {
        if request.query.trim().is_empty() {
            return self.snapshot();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let ask_generation = self.ask_generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock_state();
            *state = QueryResult {
                is_loading: true,
                ..QueryResult::default()
            };
        }

        if let Err(err) = self.reconcile(generation, &request).await {
            warn!(target: "query_client", error = %err, "query reconciliation failed");
            self.apply(generation, |state| {
                state.error = Some(err.to_string());
            });
        }

        // Loading clears on success and failure alike. Gated on the ask
        // counter, not the data counter: a reset() mid-flight discards this
        // query's data but must not leave its loading flag stuck on, while a
        // newer ask() keeps ownership of the flag.
        {
            let mut state = self.lock_state();
            if self.ask_generation.load(Ordering::SeqCst) == ask_generation {
                state.is_loading = false;
            }
        }
        self.snapshot()
    }

    /* --------------------- Internals --------------------- */

    async fn reconcile(&self, generation: u64, request: &QueryRequest) -> Result<()> {
        let resp = self.client.send(request).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(QueryClientError::request_failed(status));
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            self.reconcile_buffered(generation, resp).await
        } else if content_type.starts_with("application/x-ndjson") {
            self.reconcile_events(generation, resp).await
        } else {
            self.reconcile_sniffed(generation, resp).await
        }
    }

    /// Whole payload is buffered; decode it as one document.
    async fn reconcile_buffered(&self, generation: u64, resp: reqwest::Response) -> Result<()> {
        let body = resp.bytes().await?;
        if body.is_empty() {
            return Err(QueryClientError::EmptyResponse);
        }
        let doc: QueryResponse = serde_json::from_slice(&body)
            .map_err(|e| QueryClientError::Decode(e.to_string()))?;
        self.apply(generation, |state| {
            state.answer = doc.answer;
            state.sources = doc.sources;
        });
        Ok(())
    }

    /// Negotiated framing: newline-delimited `StreamChunk` events.
    async fn reconcile_events(&self, generation: u64, resp: reqwest::Response) -> Result<()> {
        let mut stream = resp.bytes_stream();
        let mut decoder = Utf8Accumulator::new();
        let mut buffer = EventStreamBuffer::new();
        let mut saw_data = false;

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(QueryClientError::from)?;
            saw_data = true;
            let text = decoder.push(&bytes);
            for event in buffer.push(&text) {
                self.apply_event(generation, event);
            }
        }
        let tail = decoder.finish();
        for event in buffer.push(&tail) {
            self.apply_event(generation, event);
        }
        if let Some(event) = buffer.finish() {
            self.apply_event(generation, event);
        }

        if !saw_data {
            return Err(QueryClientError::EmptyResponse);
        }
        Ok(())
    }

    /// Unknown framing: re-try the whole accumulated buffer as a complete
    /// document after every chunk, revealing raw text until that succeeds.
    async fn reconcile_sniffed(&self, generation: u64, resp: reqwest::Response) -> Result<()> {
        let mut stream = resp.bytes_stream();
        let mut decoder = Utf8Accumulator::new();
        let mut buffer = ReconcileBuffer::new();

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(QueryClientError::from)?;
            let text = decoder.push(&bytes);
            if text.is_empty() {
                continue;
            }
            match buffer.push(&text) {
                ReconcileUpdate::Partial(partial) => {
                    self.apply(generation, |state| state.answer = partial);
                }
                ReconcileUpdate::Resolved(doc) => {
                    self.apply(generation, |state| {
                        state.answer = doc.answer;
                        state.sources = doc.sources;
                    });
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            if let ReconcileUpdate::Partial(partial) = buffer.push(&tail) {
                self.apply(generation, |state| state.answer = partial);
            }
        }

        if !buffer.saw_data() {
            return Err(QueryClientError::EmptyResponse);
        }
        if let Some(doc) = buffer.finish() {
            self.apply(generation, |state| {
                state.answer = doc.answer;
                state.sources = doc.sources;
            });
        }
        Ok(())
    }

    fn apply_event(&self, generation: u64, event: StreamChunk) {
        match event {
            StreamChunk::Token { content } => self.apply(generation, |state| {
                state.answer.push_str(&content);
            }),
            StreamChunk::Sources { sources } => self.apply(generation, |state| {
                state.sources = sources;
            }),
            StreamChunk::Complete { data } => self.apply(generation, |state| {
                state.answer = data.answer;
                state.sources = data.sources;
            }),
            StreamChunk::Error { message } => self.apply(generation, |state| {
                state.error = Some(message);
            }),
        }
    }

    /// Mutates the slot only if `generation` is still current. The check and
    /// the mutation happen under the same lock.
    fn apply<F: FnOnce(&mut QueryResult)>(&self, generation: u64, f: F) {
        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(
                target: "query_client",
                generation,
                "discarding state mutation from superseded query"
            );
            return;
        }
        f(&mut state);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueryResult> {
        // The closures passed to apply() cannot panic; recover anyway.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
