use scoring::{FeedRule, Post, RuleIssue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub rules: Vec<FeedRule>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub rules: Vec<FeedRule>,
    /// Overrides the configured sample corpus.
    #[serde(default)]
    pub sample: Option<Vec<Post>>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub post: Post,
    #[serde(default)]
    pub rules: Vec<FeedRule>,
}

#[derive(Debug, Deserialize)]
pub struct LintRequest {
    pub rules: Vec<FeedRule>,
}

#[derive(Debug, Serialize)]
pub struct LintResponse {
    pub valid: bool,
    pub issues: Vec<RuleIssue>,
}

impl From<Vec<RuleIssue>> for LintResponse {
    fn from(issues: Vec<RuleIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}
