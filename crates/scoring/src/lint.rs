//! Static checks for rule definitions, meant for a rule editor. Scoring never
//! consults these; a rule that fails lint still evaluates (to no effect).

use std::collections::HashSet;

use serde::Serialize;

use crate::condition::pattern_error;
use crate::fields::FieldPath;
use crate::model::{ConditionValue, FeedRule, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnknownField,
    InvalidPattern,
    NonNumericOperand,
    EmptyValue,
    DuplicateId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleIssue {
    pub rule_id: String,
    pub kind: IssueKind,
    pub message: String,
}

impl RuleIssue {
    fn new(rule: &FeedRule, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            kind,
            message: message.into(),
        }
    }
}

pub fn lint_rule(rule: &FeedRule) -> Vec<RuleIssue> {
    let mut issues = Vec::new();
    let condition = &rule.condition;

    if FieldPath::parse(&condition.field).is_none() {
        issues.push(RuleIssue::new(
            rule,
            IssueKind::UnknownField,
            format!("unknown field `{}`", condition.field),
        ));
    }

    match condition.operator {
        Operator::Gt | Operator::Lt if condition.value.as_number().is_none() => {
            issues.push(RuleIssue::new(
                rule,
                IssueKind::NonNumericOperand,
                format!(
                    "`{}` needs a numeric value, got `{}`",
                    condition.operator.as_str(),
                    condition.value.to_text()
                ),
            ));
        }
        Operator::Regex => {
            let pattern = condition.value.to_text();
            if let Some(message) = pattern_error(&pattern) {
                issues.push(RuleIssue::new(rule, IssueKind::InvalidPattern, message));
            }
        }
        Operator::Contains => {
            if matches!(&condition.value, ConditionValue::Text(s) if s.is_empty()) {
                issues.push(RuleIssue::new(
                    rule,
                    IssueKind::EmptyValue,
                    "empty `contains` value matches every post",
                ));
            }
        }
        _ => {}
    }

    issues
}

pub fn lint_rules(rules: &[FeedRule]) -> Vec<RuleIssue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            issues.push(RuleIssue::new(
                rule,
                IssueKind::DuplicateId,
                format!("rule id `{}` is used more than once", rule.id),
            ));
        }
        issues.extend(lint_rule(rule));
    }
    issues
}
