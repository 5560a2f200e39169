use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use feed_pipeline::{FeedPipeline, FeedSession, FixedClock, PostBatch, RuleSet};
use scoring::{Author, Condition, FeedRule, Operator, Post};

fn session() -> FeedSession {
    let pipeline = FeedPipeline::builder()
        .clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )))
        .build();
    FeedSession::new(pipeline)
}

fn batch() -> PostBatch {
    vec![Post {
        id: "p1".into(),
        content: Some("weekly rust digest".into()),
        created_at: None,
        author: Author {
            handle: "digest".into(),
            display_name: None,
        },
        platform: "newsletter".into(),
        metrics: None,
        labels: None,
    }]
    .into()
}

fn boost(weight: u32) -> RuleSet {
    vec![FeedRule::boost(
        "rust",
        weight,
        Condition::new("content", Operator::Contains, "rust"),
    )]
    .into()
}

#[tokio::test]
async fn sequential_submissions_publish_in_order() -> Result<()> {
    let session = session();
    assert!(session.latest().is_none());

    let first = session.submit(batch(), boost(10)).await?.expect("published");
    assert_eq!(first.generation, 1);
    assert_eq!(first.scored[0].score, 60.0);

    let second = session.submit(batch(), boost(20)).await?.expect("published");
    assert_eq!(second.generation, 2);
    assert_eq!(session.latest().map(|s| s.scored[0].score), Some(70.0));
    Ok(())
}

#[tokio::test]
async fn superseded_submission_is_discarded() -> Result<()> {
    let session = session();

    let stale = session.submit(batch(), boost(10));
    tokio::pin!(stale);
    // Start the first submission so it claims generation 1, then let a
    // newer submission overtake it.
    assert!(futures::poll!(&mut stale).is_pending());

    let fresh = session.submit(batch(), boost(40)).await?.expect("published");
    assert_eq!(fresh.generation, 2);

    let outcome = stale.await?;
    assert!(outcome.is_none());

    let latest = session.latest().expect("snapshot");
    assert_eq!(latest.generation, 2);
    assert_eq!(latest.scored[0].score, 90.0);
    Ok(())
}

#[tokio::test]
async fn settled_waits_for_newest_generation() -> Result<()> {
    let session = Arc::new(session());
    let mut updates = session.subscribe();

    let writer = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            for weight in [5, 15, 25] {
                session.submit(batch(), boost(weight)).await?;
            }
            anyhow::Ok(())
        })
    };
    writer.await??;

    let settled = session.settled().await?;
    assert_eq!(settled.generation, 3);
    assert_eq!(settled.scored[0].score, 75.0);
    assert_eq!(settled.visible.len(), 1);
    assert!(updates.has_changed()?);
    Ok(())
}
