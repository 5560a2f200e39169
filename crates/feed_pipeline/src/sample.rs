use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use common::{AppError, Result};
use scoring::{Author, Metrics, Post};
use tracing::info;

struct SampleSpec {
    id: &'static str,
    platform: &'static str,
    handle: &'static str,
    display_name: Option<&'static str>,
    content: Option<&'static str>,
    hours_ago: i64,
    metrics: Option<(u64, u64, u64)>,
    labels: &'static [&'static str],
}

const SAMPLE: &[SampleSpec] = &[
    SampleSpec {
        id: "sample-bsky-1",
        platform: "bluesky",
        handle: "maya.bsky.social",
        display_name: Some("Maya"),
        content: Some("Shipped a new release of our open source technology stack today"),
        hours_ago: 2,
        metrics: Some((120, 30, 14)),
        labels: &[],
    },
    SampleSpec {
        id: "sample-masto-1",
        platform: "mastodon",
        handle: "@lin@fosstodon.org",
        display_name: Some("Lin"),
        content: Some("Long thread about AI safety research and evaluation methods"),
        hours_ago: 9,
        metrics: Some((45, 12, 20)),
        labels: &[],
    },
    SampleSpec {
        id: "sample-tw-1",
        platform: "twitter",
        handle: "deals_bot_4821",
        display_name: None,
        content: Some("Limited offer!!! Click now for free crypto, this is not spam"),
        hours_ago: 1,
        metrics: Some((0, 2, 0)),
        labels: &["promo"],
    },
    SampleSpec {
        id: "sample-ig-1",
        platform: "instagram",
        handle: "studio.north",
        display_name: Some("Studio North"),
        content: Some("Behind the scenes from this week's shoot"),
        hours_ago: 30,
        metrics: Some((860, 40, 55)),
        labels: &["photo"],
    },
    SampleSpec {
        id: "sample-tg-1",
        platform: "telegram",
        handle: "weekly_digest",
        display_name: Some("Weekly Digest"),
        content: Some("This week in technology: chips, compilers and a new AI model"),
        hours_ago: 72,
        metrics: None,
        labels: &[],
    },
    SampleSpec {
        id: "sample-news-1",
        platform: "newsletter",
        handle: "editor@letters.example",
        display_name: None,
        content: None,
        hours_ago: 5,
        metrics: None,
        labels: &[],
    },
    SampleSpec {
        id: "sample-bsky-2",
        platform: "bluesky",
        handle: "nightowl.bsky.social",
        display_name: Some("Night Owl"),
        content: Some("Content warning: graphic imagery"),
        hours_ago: 14,
        metrics: Some((8, 1, 3)),
        labels: &["nsfw", "graphic-media"],
    },
    SampleSpec {
        id: "sample-masto-2",
        platform: "mastodon",
        handle: "@sam@hachyderm.io",
        display_name: Some("Sam"),
        content: Some("Quiet morning, coffee and a good book"),
        hours_ago: 200,
        metrics: Some((3, 0, 1)),
        labels: &[],
    },
];

/// Built-in preview corpus, timestamped relative to `now`. It covers every
/// platform plus sparse posts (no content, no metrics, zero likes).
pub fn builtin_sample(now: DateTime<Utc>) -> Vec<Post> {
    SAMPLE
        .iter()
        .map(|spec| Post {
            id: spec.id.to_string(),
            content: spec.content.map(str::to_string),
            created_at: Some(
                (now - Duration::hours(spec.hours_ago)).to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            author: Author {
                handle: spec.handle.to_string(),
                display_name: spec.display_name.map(str::to_string),
            },
            platform: spec.platform.to_string(),
            metrics: spec.metrics.map(|(likes, reposts, replies)| Metrics {
                likes,
                reposts,
                replies,
            }),
            labels: (!spec.labels.is_empty())
                .then(|| spec.labels.iter().map(|l| l.to_string()).collect()),
        })
        .collect()
}

/// Loads a preview corpus from a JSON array of posts.
pub async fn load_sample<P: AsRef<Path>>(path: P) -> Result<Vec<Post>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let posts: Vec<Post> = serde_json::from_slice(&bytes)?;
    if posts.is_empty() {
        return Err(AppError::invalid_input(format!(
            "preview sample {} contains no posts",
            path.display()
        )));
    }
    info!(path = %path.display(), count = posts.len(), "loaded preview sample");
    Ok(posts)
}
