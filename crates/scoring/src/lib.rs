pub mod condition;
pub mod fields;
pub mod lint;
pub mod model;
pub mod rules;
pub mod scorer;

pub use condition::evaluate_condition;
pub use fields::{EvalContext, FieldPath, FieldValue};
pub use lint::{lint_rule, lint_rules, IssueKind, RuleIssue};
pub use model::{
    Author, Condition, ConditionValue, FeedRule, Metrics, Operator, Post, RuleKind, ScoredPost,
};
pub use rules::{apply_boost_rule, apply_demote_rule, apply_filter_rule, passes_filters};
pub use scorer::{
    calculate_post_score, explain_post, score_post, ScoreBreakdown, BASE_SCORE, ENGINE_VERSION,
};
