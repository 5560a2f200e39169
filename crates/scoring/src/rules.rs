use crate::condition::evaluate_condition;
use crate::fields::EvalContext;
use crate::model::{FeedRule, Post, RuleKind};

fn fires(post: &Post, rule: &FeedRule, ctx: &EvalContext) -> bool {
    rule.enabled && evaluate_condition(post, &rule.condition, ctx)
}

/// `weight` when an enabled boost rule matches, otherwise 0.
pub fn apply_boost_rule(post: &Post, rule: &FeedRule, ctx: &EvalContext) -> f64 {
    match rule.kind {
        RuleKind::Boost { weight } if fires(post, rule, ctx) => f64::from(weight),
        _ => 0.0,
    }
}

/// `-weight` when an enabled demote rule matches, otherwise 0.
pub fn apply_demote_rule(post: &Post, rule: &FeedRule, ctx: &EvalContext) -> f64 {
    match rule.kind {
        RuleKind::Demote { weight } if fires(post, rule, ctx) => -f64::from(weight),
        _ => 0.0,
    }
}

/// `false` (hide) only when an enabled filter rule matches.
pub fn apply_filter_rule(post: &Post, rule: &FeedRule, ctx: &EvalContext) -> bool {
    match rule.kind {
        RuleKind::Filter => !fires(post, rule, ctx),
        _ => true,
    }
}

/// Signed score contribution of any rule kind. Filter rules contribute 0.
pub fn rule_delta(post: &Post, rule: &FeedRule, ctx: &EvalContext) -> f64 {
    match rule.kind {
        RuleKind::Boost { .. } => apply_boost_rule(post, rule, ctx),
        RuleKind::Demote { .. } => apply_demote_rule(post, rule, ctx),
        RuleKind::Filter => 0.0,
    }
}

/// A post stays visible only if every filter rule lets it through.
pub fn passes_filters(post: &Post, rules: &[FeedRule], ctx: &EvalContext) -> bool {
    rules.iter().all(|rule| apply_filter_rule(post, rule, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, Condition, Operator};

    fn post(content: &str) -> Post {
        Post {
            id: "p1".into(),
            content: Some(content.into()),
            created_at: None,
            author: Author {
                handle: "bob".into(),
                display_name: None,
            },
            platform: "mastodon".into(),
            metrics: None,
            labels: None,
        }
    }

    fn spam() -> Condition {
        Condition::new("content", Operator::Contains, "spam")
    }

    #[test]
    fn boost_returns_weight_on_match() {
        let ctx = EvalContext::default();
        let rule = FeedRule::boost("b", 20, spam());
        assert_eq!(apply_boost_rule(&post("spam"), &rule, &ctx), 20.0);
        assert_eq!(apply_boost_rule(&post("ham"), &rule, &ctx), 0.0);
    }

    #[test]
    fn demote_negates_weight() {
        let ctx = EvalContext::default();
        let rule = FeedRule::demote("d", 30, spam());
        assert_eq!(apply_demote_rule(&post("spam"), &rule, &ctx), -30.0);
        assert_eq!(apply_demote_rule(&post("ham"), &rule, &ctx), 0.0);
    }

    #[test]
    fn disabled_rules_do_nothing() {
        let ctx = EvalContext::default();
        let spammy = post("spam");
        assert_eq!(
            apply_boost_rule(&spammy, &FeedRule::boost("b", 20, spam()).disabled(), &ctx),
            0.0
        );
        assert_eq!(
            apply_demote_rule(&spammy, &FeedRule::demote("d", 20, spam()).disabled(), &ctx),
            0.0
        );
        assert!(apply_filter_rule(
            &spammy,
            &FeedRule::filter("f", spam()).disabled(),
            &ctx
        ));
    }

    #[test]
    fn filter_hides_only_enabled_matches() {
        let ctx = EvalContext::default();
        let rule = FeedRule::filter("f", spam());
        assert!(!apply_filter_rule(&post("spam"), &rule, &ctx));
        assert!(apply_filter_rule(&post("ham"), &rule, &ctx));
    }

    #[test]
    fn appliers_ignore_other_kinds() {
        let ctx = EvalContext::default();
        let spammy = post("spam");
        let boost = FeedRule::boost("b", 20, spam());
        let filter = FeedRule::filter("f", spam());
        assert_eq!(apply_demote_rule(&spammy, &boost, &ctx), 0.0);
        assert_eq!(apply_boost_rule(&spammy, &filter, &ctx), 0.0);
        assert!(apply_filter_rule(&spammy, &boost, &ctx));
        assert_eq!(rule_delta(&spammy, &filter, &ctx), 0.0);
    }

    #[test]
    fn every_filter_must_pass() {
        let ctx = EvalContext::default();
        let rules = vec![
            FeedRule::filter("spam", spam()),
            FeedRule::filter("ads", Condition::new("content", Operator::Contains, "buy now")),
        ];
        assert!(passes_filters(&post("hello"), &rules, &ctx));
        assert!(!passes_filters(&post("spam"), &rules, &ctx));
        assert!(!passes_filters(&post("buy now!"), &rules, &ctx));
    }
}
