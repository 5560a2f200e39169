use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::config::CacheConfig;
use common::{AppError, Result};
use scoring::{EvalContext, FeedRule, Post, ScoredPost};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, instrument, warn};

use crate::cache::ProjectionCache;
use crate::clock::{Clock, SystemClock};
use crate::key::{Projection, ProjectionKey};
use crate::metrics;
use crate::projection::{filter_feed, preview_feed, score_feed, FeedPreview};
use crate::sample::builtin_sample;

pub type PostBatch = Arc<[Post]>;
pub type RuleSet = Arc<[FeedRule]>;

#[derive(Clone)]
pub struct FeedPipelineBuilder {
    cache_capacity: usize,
    cache_ttl: Duration,
    clock: Arc<dyn Clock>,
    sample: Option<Vec<Post>>,
}

impl Default for FeedPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedPipelineBuilder {
    pub fn new() -> Self {
        Self {
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(60),
            clock: Arc::new(SystemClock),
            sample: None,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new().cache(config.capacity, Duration::from_secs(config.ttl_secs))
    }

    pub fn cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the built-in preview corpus.
    pub fn sample(mut self, posts: Vec<Post>) -> Self {
        self.sample = Some(posts);
        self
    }

    pub fn build(self) -> FeedPipeline {
        let sample = self
            .sample
            .unwrap_or_else(|| builtin_sample(self.clock.now()));

        let inner = Inner {
            scored: Stage::new(Projection::Scored, self.cache_capacity, self.cache_ttl),
            filtered: Stage::new(Projection::Filtered, self.cache_capacity, self.cache_ttl),
            preview: Stage::new(Projection::Preview, self.cache_capacity, self.cache_ttl),
            clock: self.clock,
            sample: sample.into(),
        };

        FeedPipeline {
            inner: Arc::new(inner),
        }
    }
}

/// One cached, coalescing projection.
struct Stage<V> {
    projection: Projection,
    cache: ProjectionCache<V>,
    pending: Mutex<HashMap<String, Vec<oneshot::Sender<Arc<V>>>>>,
}

impl<V: Send + Sync + 'static> Stage<V> {
    fn new(projection: Projection, capacity: usize, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            projection,
            cache: ProjectionCache::new(capacity, ttl),
            pending: Mutex::new(HashMap::new()),
        })
    }

    fn label(&self) -> &'static str {
        self.projection.as_str()
    }

    /// Returns the waiter and whether the caller must start the computation.
    async fn register_waiter(&self, key: &str) -> (oneshot::Receiver<Arc<V>>, bool) {
        let (tx, rx) = oneshot::channel();
        let mut guard = self.pending.lock().await;
        match guard.get_mut(key) {
            Some(waiters) => {
                waiters.push(tx);
                (rx, false)
            }
            None => {
                guard.insert(key.to_string(), vec![tx]);
                (rx, true)
            }
        }
    }

    /// Hands `value` to every waiter. `None` drops the senders, which the
    /// waiters observe as an abandoned computation.
    async fn finish(&self, key: &str, value: Option<Arc<V>>) {
        let waiters = {
            let mut guard = self.pending.lock().await;
            guard.remove(key).unwrap_or_default()
        };
        if let Some(value) = value {
            for waiter in waiters {
                let _ = waiter.send(Arc::clone(&value));
            }
        }
    }

    async fn run<F>(self: &Arc<Self>, key: ProjectionKey, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> V + Send + 'static,
    {
        if let Some(hit) = self.cache.get(key.as_str()).await {
            metrics::CACHE_HITS.with_label_values(&[self.label()]).inc();
            debug!(%key, "projection cache hit");
            return Ok(hit);
        }
        metrics::CACHE_MISSES
            .with_label_values(&[self.label()])
            .inc();

        let (rx, leader) = self.register_waiter(key.as_str()).await;
        if leader {
            let stage = Arc::clone(self);
            tokio::spawn(async move { stage.compute_and_publish(key, compute).await });
        } else {
            metrics::COALESCED_TOTAL
                .with_label_values(&[self.label()])
                .inc();
        }

        rx.await.map_err(|_| {
            AppError::computation(anyhow::anyhow!(
                "{} projection did not complete",
                self.label()
            ))
        })
    }

    async fn compute_and_publish<F>(self: Arc<Self>, key: ProjectionKey, compute: F)
    where
        F: FnOnce() -> V + Send + 'static,
    {
        // A previous leader may have stored the result between our cache
        // miss and waiter registration.
        if let Some(hit) = self.cache.get(key.as_str()).await {
            self.finish(key.as_str(), Some(hit)).await;
            return;
        }

        let timer = metrics::COMPUTE_SECONDS
            .with_label_values(&[self.label()])
            .start_timer();
        let result = tokio::task::spawn_blocking(compute).await;
        timer.observe_duration();

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                self.cache
                    .put(key.as_str().to_string(), Arc::clone(&value))
                    .await;
                self.finish(key.as_str(), Some(value)).await;
            }
            Err(err) => {
                metrics::COMPUTE_FAILURES
                    .with_label_values(&[self.label()])
                    .inc();
                warn!(%key, error = %err, "projection computation failed");
                self.finish(key.as_str(), None).await;
            }
        }
    }
}

struct Inner {
    scored: Arc<Stage<Vec<ScoredPost>>>,
    filtered: Arc<Stage<Vec<Post>>>,
    preview: Arc<Stage<FeedPreview>>,
    clock: Arc<dyn Clock>,
    sample: PostBatch,
}

/// Cached, read-only projections of a post batch under a rule set.
///
/// Results are keyed by content (see [`ProjectionKey`]), so identical inputs
/// are scored once per cache TTL, and concurrent identical requests share a
/// single computation. Nothing here writes rules back anywhere.
#[derive(Clone)]
pub struct FeedPipeline {
    inner: Arc<Inner>,
}

impl FeedPipeline {
    pub fn builder() -> FeedPipelineBuilder {
        FeedPipelineBuilder::new()
    }

    /// Evaluation instant for a pass started now.
    pub fn eval_context(&self) -> EvalContext {
        EvalContext::at(self.inner.clock.now())
    }

    pub fn sample(&self) -> PostBatch {
        Arc::clone(&self.inner.sample)
    }

    #[instrument(skip_all, fields(posts = posts.len(), rules = rules.len()))]
    pub async fn scored_feed(&self, posts: PostBatch, rules: RuleSet) -> Result<Arc<Vec<ScoredPost>>> {
        let key = ProjectionKey::new(Projection::Scored, &posts, &rules)?;
        let ctx = self.eval_context();
        self.inner
            .scored
            .run(key, move || {
                metrics::POSTS_PROCESSED
                    .with_label_values(&[Projection::Scored.as_str()])
                    .inc_by(posts.len() as u64);
                score_feed(&posts, &rules, &ctx)
            })
            .await
    }

    #[instrument(skip_all, fields(posts = posts.len(), rules = rules.len()))]
    pub async fn filtered_feed(&self, posts: PostBatch, rules: RuleSet) -> Result<Arc<Vec<Post>>> {
        let key = ProjectionKey::new(Projection::Filtered, &posts, &rules)?;
        let ctx = self.eval_context();
        self.inner
            .filtered
            .run(key, move || {
                metrics::POSTS_PROCESSED
                    .with_label_values(&[Projection::Filtered.as_str()])
                    .inc_by(posts.len() as u64);
                filter_feed(&posts, &rules, &ctx)
            })
            .await
    }

    /// Preview of `rules` against the configured sample corpus.
    pub async fn preview(&self, rules: RuleSet) -> Result<Arc<FeedPreview>> {
        self.preview_with(self.sample(), rules).await
    }

    #[instrument(skip_all, fields(sample = sample.len(), rules = rules.len()))]
    pub async fn preview_with(&self, sample: PostBatch, rules: RuleSet) -> Result<Arc<FeedPreview>> {
        let key = ProjectionKey::new(Projection::Preview, &sample, &rules)?;
        let ctx = self.eval_context();
        self.inner
            .preview
            .run(key, move || {
                metrics::POSTS_PROCESSED
                    .with_label_values(&[Projection::Preview.as_str()])
                    .inc_by(sample.len() as u64);
                preview_feed(&sample, &rules, &ctx)
            })
            .await
    }

    pub async fn invalidate(&self, key: &ProjectionKey) -> bool {
        match key.projection() {
            Projection::Scored => self.inner.scored.cache.invalidate(key.as_str()).await,
            Projection::Filtered => self.inner.filtered.cache.invalidate(key.as_str()).await,
            Projection::Preview => self.inner.preview.cache.invalidate(key.as_str()).await,
        }
    }

    /// Drops every cached projection and returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let scored = self.inner.scored.cache.clear().await;
        let filtered = self.inner.filtered.cache.clear().await;
        let preview = self.inner.preview.cache.clear().await;
        debug!(scored, filtered, preview, "cleared projection caches");
        scored + filtered + preview
    }

    pub async fn cached_entries(&self) -> usize {
        self.inner.scored.cache.len().await
            + self.inner.filtered.cache.len().await
            + self.inner.preview.cache.len().await
    }
}
