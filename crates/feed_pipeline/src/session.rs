use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use common::{AppError, Result};
use scoring::{Post, ScoredPost};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::metrics;
use crate::pipeline::{FeedPipeline, PostBatch, RuleSet};

/// Scored and filtered views of one submission.
#[derive(Debug)]
pub struct FeedSnapshot {
    pub generation: u64,
    pub scored: Arc<Vec<ScoredPost>>,
    pub visible: Arc<Vec<Post>>,
}

/// Latest-wins view over a [`FeedPipeline`] for callers that resubmit rules
/// in quick succession, such as an editor adjusting weights. A submission
/// that finishes after a newer one started is discarded, unless the newest
/// submission failed, so the published snapshot belongs to the newest
/// submission that has completed.
pub struct FeedSession {
    pipeline: FeedPipeline,
    generation: AtomicU64,
    tx: watch::Sender<Option<Arc<FeedSnapshot>>>,
    /// Highest generation whose computation failed.
    failed: watch::Sender<u64>,
}

impl FeedSession {
    pub fn new(pipeline: FeedPipeline) -> Self {
        let (tx, _rx) = watch::channel(None);
        let (failed, _rx) = watch::channel(0);
        Self {
            pipeline,
            generation: AtomicU64::new(0),
            tx,
            failed,
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Computes both projections for `posts` under `rules`. Returns the
    /// snapshot if it was published, or `None` if a newer submission
    /// superseded it first. A failed submission does not supersede older
    /// ones still in flight.
    #[instrument(skip_all, fields(posts = posts.len(), rules = rules.len()))]
    pub async fn submit(&self, posts: PostBatch, rules: RuleSet) -> Result<Option<Arc<FeedSnapshot>>> {
        let generation = self.begin();

        let computed = futures::future::try_join(
            self.pipeline
                .scored_feed(Arc::clone(&posts), Arc::clone(&rules)),
            self.pipeline.filtered_feed(posts, rules),
        )
        .await;

        match computed {
            Ok((scored, visible)) => Ok(self.publish(generation, scored, visible)),
            Err(err) => {
                warn!(generation, error = %err, "feed submission failed");
                self.abandon(generation);
                Err(err)
            }
        }
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(
        &self,
        generation: u64,
        scored: Arc<Vec<ScoredPost>>,
        visible: Arc<Vec<Post>>,
    ) -> Option<Arc<FeedSnapshot>> {
        let snapshot = Arc::new(FeedSnapshot {
            generation,
            scored,
            visible,
        });

        let published = self.tx.send_if_modified(|slot| {
            let newer_published = slot
                .as_ref()
                .is_some_and(|current| current.generation > generation);
            let current = self.current_generation();
            let newest_failed = *self.failed.borrow() >= current;
            if newer_published || (current != generation && !newest_failed) {
                return false;
            }
            *slot = Some(Arc::clone(&snapshot));
            true
        });

        if published {
            Some(snapshot)
        } else {
            metrics::SUPERSEDED_TOTAL.inc();
            debug!(generation, latest = self.current_generation(), "discarded superseded snapshot");
            None
        }
    }

    fn abandon(&self, generation: u64) {
        self.failed.send_if_modified(|watermark| {
            if *watermark >= generation {
                return false;
            }
            *watermark = generation;
            true
        });
    }

    pub fn latest(&self) -> Option<Arc<FeedSnapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<FeedSnapshot>>> {
        self.tx.subscribe()
    }

    /// Waits until the newest submission at call time, or a later one, has
    /// been published. Fails if that submission failed and nothing at least
    /// as new was published. Before any submission, waits for the first.
    pub async fn settled(&self) -> Result<Arc<FeedSnapshot>> {
        let target = self.current_generation().max(1);
        let mut snapshots = self.tx.subscribe();
        let mut failures = self.failed.subscribe();
        loop {
            let ready = snapshots
                .borrow_and_update()
                .clone()
                .filter(|snapshot| snapshot.generation >= target);
            if let Some(snapshot) = ready {
                return Ok(snapshot);
            }
            if *failures.borrow_and_update() >= target {
                return Err(AppError::computation(anyhow::anyhow!(
                    "feed submission {} failed",
                    target
                )));
            }
            let changed = tokio::select! {
                changed = snapshots.changed() => changed,
                changed = failures.changed() => changed,
            };
            changed.map_err(|_| AppError::computation(anyhow::anyhow!("feed session closed")))?;
        }
    }
}
