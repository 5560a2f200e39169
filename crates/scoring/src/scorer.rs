use serde::{Deserialize, Serialize};

use crate::fields::EvalContext;
use crate::model::{FeedRule, Post, RuleKind, ScoredPost};
use crate::rules::{apply_filter_rule, passes_filters, rule_delta};

pub const BASE_SCORE: f64 = 50.0;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Identifies the rule semantics implemented here; bump when scoring changes.
pub const ENGINE_VERSION: &str = "feed_rules_v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleContribution {
    pub rule_id: String,
    pub rule_name: String,
    pub delta: f64,
}

/// Why a post got its score and whether it survives the filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub post_id: String,
    pub base: f64,
    pub raw_score: f64,
    pub score: f64,
    pub contributions: Vec<RuleContribution>,
    pub hidden_by: Vec<String>,
    pub visible: bool,
}

fn clamp_score(raw: f64) -> f64 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

fn raw_score(post: &Post, rules: &[FeedRule], ctx: &EvalContext) -> f64 {
    rules
        .iter()
        .filter(|rule| rule.kind.is_scoring())
        .map(|rule| rule_delta(post, rule, ctx))
        .fold(BASE_SCORE, |acc, delta| acc + delta)
}

/// Base score plus every boost/demote contribution, clamped once to
/// `[MIN_SCORE, MAX_SCORE]`.
pub fn calculate_post_score(post: &Post, rules: &[FeedRule], ctx: &EvalContext) -> f64 {
    clamp_score(raw_score(post, rules, ctx))
}

pub fn score_post(post: &Post, rules: &[FeedRule], ctx: &EvalContext) -> ScoredPost {
    ScoredPost {
        post: post.clone(),
        score: calculate_post_score(post, rules, ctx),
    }
}

pub fn explain_post(post: &Post, rules: &[FeedRule], ctx: &EvalContext) -> ScoreBreakdown {
    let mut contributions = Vec::new();
    let mut hidden_by = Vec::new();

    for rule in rules {
        match rule.kind {
            RuleKind::Filter => {
                if !apply_filter_rule(post, rule, ctx) {
                    hidden_by.push(rule.id.clone());
                }
            }
            _ => {
                let delta = rule_delta(post, rule, ctx);
                if delta != 0.0 {
                    contributions.push(RuleContribution {
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        delta,
                    });
                }
            }
        }
    }

    let raw = contributions
        .iter()
        .fold(BASE_SCORE, |acc, contribution| acc + contribution.delta);

    ScoreBreakdown {
        post_id: post.id.clone(),
        base: BASE_SCORE,
        raw_score: raw,
        score: clamp_score(raw),
        contributions,
        visible: hidden_by.is_empty(),
        hidden_by,
    }
}

/// Convenience for callers that want both answers for one post.
pub fn score_and_check(post: &Post, rules: &[FeedRule], ctx: &EvalContext) -> (f64, bool) {
    (
        calculate_post_score(post, rules, ctx),
        passes_filters(post, rules, ctx),
    )
}
