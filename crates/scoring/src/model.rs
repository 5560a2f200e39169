use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub handle: String,
    #[serde(
        rename = "displayName",
        alias = "display_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Metrics {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
}

impl Metrics {
    pub fn total_engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.reposts)
            .saturating_add(self.replies)
    }
}

/// One feed item. The engine only ever reads posts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Raw ISO-8601 text, parsed on demand so a malformed timestamp only
    /// affects `age_hours`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub author: Author,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPost {
    #[serde(flatten)]
    pub post: Post,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Contains,
    Equals,
    Gt,
    Lt,
    Regex,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Contains => "contains",
            Operator::Equals => "equals",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Regex => "regex",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
}

impl ConditionValue {
    /// Numeric reading used by `gt`/`lt`: numbers as-is, numeric strings parsed.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            ConditionValue::Number(n) => Some(*n),
            ConditionValue::Text(s) => s.trim().parse::<f64>().ok(),
        };
        number.filter(|n| !n.is_nan())
    }

    pub fn to_text(&self) -> String {
        match self {
            ConditionValue::Number(n) => format_number(*n),
            ConditionValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_string())
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        ConditionValue::Number(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Number(value as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<ConditionValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Effect of a rule. Only score-bearing kinds carry a weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleKind {
    Boost { weight: u32 },
    Demote { weight: u32 },
    Filter,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Boost { .. } => "boost",
            RuleKind::Demote { .. } => "demote",
            RuleKind::Filter => "filter",
        }
    }

    pub fn is_scoring(&self) -> bool {
        !matches!(self, RuleKind::Filter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedRule {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub enabled: bool,
    pub condition: Condition,
}

impl FeedRule {
    pub fn boost(id: impl Into<String>, weight: u32, condition: Condition) -> Self {
        Self::with_kind(id, RuleKind::Boost { weight }, condition)
    }

    pub fn demote(id: impl Into<String>, weight: u32, condition: Condition) -> Self {
        Self::with_kind(id, RuleKind::Demote { weight }, condition)
    }

    pub fn filter(id: impl Into<String>, condition: Condition) -> Self {
        Self::with_kind(id, RuleKind::Filter, condition)
    }

    fn with_kind(id: impl Into<String>, kind: RuleKind, condition: Condition) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            enabled: true,
            condition,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Shortest decimal rendering: `100`, `1.5`, `-0.25`.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
