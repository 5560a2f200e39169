use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

pub static CACHE_HITS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_pipeline_cache_hits_total",
        "Projection cache hits by projection",
        &["projection"]
    )
    .expect("cache hits")
});

pub static CACHE_MISSES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_pipeline_cache_misses_total",
        "Projection cache misses by projection",
        &["projection"]
    )
    .expect("cache misses")
});

pub static COALESCED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_pipeline_coalesced_total",
        "Requests that joined an in-flight computation, by projection",
        &["projection"]
    )
    .expect("coalesced")
});

pub static COMPUTE_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "feed_pipeline_compute_seconds",
        "Projection compute latency",
        &["projection"]
    )
    .expect("compute latency")
});

pub static POSTS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_pipeline_posts_processed_total",
        "Posts evaluated by projection",
        &["projection"]
    )
    .expect("posts processed")
});

pub static COMPUTE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "feed_pipeline_compute_failures_total",
        "Projection computations that did not complete",
        &["projection"]
    )
    .expect("compute failures")
});

pub static SUPERSEDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "feed_session_superseded_total",
        "Session snapshots discarded because a newer submission arrived"
    )
    .expect("superseded")
});
