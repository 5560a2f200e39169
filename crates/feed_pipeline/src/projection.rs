//! Synchronous projections over a post batch. The async pipeline caches
//! these; they are also usable directly.

use scoring::scorer::score_and_check;
use scoring::{passes_filters, score_post, EvalContext, FeedRule, Post, ScoredPost};
use serde::{Deserialize, Serialize};

/// Scores every post and orders by descending score. Ties keep input order.
pub fn score_feed(posts: &[Post], rules: &[FeedRule], ctx: &EvalContext) -> Vec<ScoredPost> {
    let mut scored: Vec<ScoredPost> = posts
        .iter()
        .map(|post| score_post(post, rules, ctx))
        .collect();
    sort_by_score(&mut scored);
    scored
}

/// Posts that every enabled filter rule lets through, in input order.
pub fn filter_feed(posts: &[Post], rules: &[FeedRule], ctx: &EvalContext) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| passes_filters(post, rules, ctx))
        .cloned()
        .collect()
}

fn sort_by_score(scored: &mut [ScoredPost]) {
    // `sort_by` is stable; scores are never NaN.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStats {
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub total_posts: usize,
    pub filtered_posts: usize,
    pub visible_posts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPreview {
    pub posts: Vec<ScoredPost>,
    pub stats: PreviewStats,
}

/// Impact of a candidate rule set on a sample corpus. Score statistics cover
/// the whole sample, hidden posts included.
pub fn preview_feed(sample: &[Post], rules: &[FeedRule], ctx: &EvalContext) -> FeedPreview {
    let mut posts = Vec::with_capacity(sample.len());
    let mut hidden = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for post in sample {
        let (score, visible) = score_and_check(post, rules, ctx);
        if !visible {
            hidden += 1;
        }
        sum += score;
        min = min.min(score);
        max = max.max(score);
        posts.push(ScoredPost {
            post: post.clone(),
            score,
        });
    }
    sort_by_score(&mut posts);

    let total = sample.len();
    let stats = if total == 0 {
        PreviewStats::default()
    } else {
        PreviewStats {
            avg_score: sum / total as f64,
            min_score: min,
            max_score: max,
            total_posts: total,
            filtered_posts: hidden,
            visible_posts: total - hidden,
        }
    };

    FeedPreview { posts, stats }
}
