//! Field lookup against a [`Post`].
//!
//! Paths are dotted strings (`author.handle`, `metrics.likes`). Only a closed
//! set of paths is legal; anything else resolves to missing, as does any
//! absent optional along the way. Derived fields are computed here rather
//! than stored on the post.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{format_number, Metrics, Post};

/// Evaluation instant shared by every condition in one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
}

impl EvalContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    Likes,
    Reposts,
    Replies,
}

impl MetricField {
    fn read(&self, metrics: &Metrics) -> u64 {
        match self {
            MetricField::Likes => metrics.likes,
            MetricField::Reposts => metrics.reposts,
            MetricField::Replies => metrics.replies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    AgeHours,
    EngagementRatio,
}

impl DerivedField {
    pub const ALL: [DerivedField; 2] = [DerivedField::AgeHours, DerivedField::EngagementRatio];

    pub fn name(&self) -> &'static str {
        match self {
            DerivedField::AgeHours => "age_hours",
            DerivedField::EngagementRatio => "engagement_ratio",
        }
    }

    fn compute(&self, post: &Post, ctx: &EvalContext) -> Option<f64> {
        match self {
            DerivedField::AgeHours => {
                let created = parse_timestamp(post.created_at.as_deref()?)?;
                let millis = (ctx.now - created).num_milliseconds();
                Some(millis as f64 / 3_600_000.0)
            }
            DerivedField::EngagementRatio => {
                let metrics = post.metrics.as_ref()?;
                if metrics.likes == 0 {
                    return None;
                }
                Some(metrics.total_engagement() as f64 / metrics.likes as f64)
            }
        }
    }
}

/// Every legal field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Derived(DerivedField),
    Id,
    Content,
    CreatedAt,
    Platform,
    AuthorHandle,
    AuthorDisplayName,
    Metric(MetricField),
    Labels,
    Label(usize),
}

impl FieldPath {
    pub fn parse(path: &str) -> Option<Self> {
        // Derived fields shadow structural lookup.
        if let Some(derived) = DerivedField::ALL.into_iter().find(|d| d.name() == path) {
            return Some(FieldPath::Derived(derived));
        }

        let segments: Vec<&str> = path.split('.').collect();
        let parsed = match segments.as_slice() {
            ["id"] => FieldPath::Id,
            ["content"] => FieldPath::Content,
            ["created_at"] => FieldPath::CreatedAt,
            ["platform"] => FieldPath::Platform,
            ["author", "handle"] => FieldPath::AuthorHandle,
            ["author", "displayName" | "display_name"] => FieldPath::AuthorDisplayName,
            ["metrics", "likes"] => FieldPath::Metric(MetricField::Likes),
            ["metrics", "reposts"] => FieldPath::Metric(MetricField::Reposts),
            ["metrics", "replies"] => FieldPath::Metric(MetricField::Replies),
            ["labels"] => FieldPath::Labels,
            ["labels", index] => FieldPath::Label(index.parse().ok()?),
            _ => return None,
        };
        Some(parsed)
    }
}

/// A resolved field value, borrowed from the post where possible.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    List(&'a [String]),
}

impl<'a> FieldValue<'a> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// String coercion: lists join with `,`, numbers print in shortest form.
    pub fn to_text(&self) -> Cow<'a, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(*s),
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
            FieldValue::List(items) => Cow::Owned(items.join(",")),
        }
    }
}

/// Resolves `path` against `post`. `None` means missing.
pub fn resolve<'a>(post: &'a Post, path: &str, ctx: &EvalContext) -> Option<FieldValue<'a>> {
    resolve_path(post, FieldPath::parse(path)?, ctx)
}

pub fn resolve_path<'a>(
    post: &'a Post,
    path: FieldPath,
    ctx: &EvalContext,
) -> Option<FieldValue<'a>> {
    let value = match path {
        FieldPath::Derived(derived) => FieldValue::Number(derived.compute(post, ctx)?),
        FieldPath::Id => FieldValue::Text(&post.id),
        FieldPath::Content => FieldValue::Text(post.content.as_deref()?),
        FieldPath::CreatedAt => FieldValue::Text(post.created_at.as_deref()?),
        FieldPath::Platform => FieldValue::Text(&post.platform),
        FieldPath::AuthorHandle => FieldValue::Text(&post.author.handle),
        FieldPath::AuthorDisplayName => FieldValue::Text(post.author.display_name.as_deref()?),
        FieldPath::Metric(metric) => FieldValue::Number(metric.read(post.metrics.as_ref()?) as f64),
        FieldPath::Labels => FieldValue::List(post.labels.as_deref()?),
        FieldPath::Label(index) => FieldValue::Text(post.labels.as_ref()?.get(index)?),
    };
    Some(value)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Author;
    use chrono::TimeZone;

    fn ctx() -> EvalContext {
        EvalContext::at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn post() -> Post {
        Post {
            id: "p1".into(),
            content: Some("hello".into()),
            created_at: Some("2024-03-01T06:00:00Z".into()),
            author: Author {
                handle: "alice.bsky.social".into(),
                display_name: None,
            },
            platform: "bluesky".into(),
            metrics: Some(Metrics {
                likes: 4,
                reposts: 2,
                replies: 2,
            }),
            labels: Some(vec!["news".into(), "tech".into()]),
        }
    }

    #[test]
    fn unknown_paths_do_not_parse() {
        assert_eq!(FieldPath::parse("author"), None);
        assert_eq!(FieldPath::parse("metrics.views"), None);
        assert_eq!(FieldPath::parse("content.length"), None);
        assert_eq!(FieldPath::parse("labels.first"), None);
        assert_eq!(FieldPath::parse(""), None);
    }

    #[test]
    fn structural_paths_resolve() {
        let post = post();
        assert_eq!(
            resolve(&post, "author.handle", &ctx()),
            Some(FieldValue::Text("alice.bsky.social"))
        );
        assert_eq!(
            resolve(&post, "metrics.likes", &ctx()),
            Some(FieldValue::Number(4.0))
        );
        assert_eq!(
            resolve(&post, "labels.1", &ctx()),
            Some(FieldValue::Text("tech"))
        );
        assert_eq!(resolve(&post, "labels.5", &ctx()), None);
        assert_eq!(resolve(&post, "author.displayName", &ctx()), None);
    }

    #[test]
    fn missing_container_is_missing() {
        let mut post = post();
        post.metrics = None;
        assert_eq!(resolve(&post, "metrics.likes", &ctx()), None);
    }

    #[test]
    fn age_hours_uses_eval_instant() {
        let post = post();
        assert_eq!(
            resolve(&post, "age_hours", &ctx()),
            Some(FieldValue::Number(6.0))
        );
    }

    #[test]
    fn age_hours_missing_for_bad_timestamp() {
        let mut post = post();
        post.created_at = Some("yesterday".into());
        assert_eq!(resolve(&post, "age_hours", &ctx()), None);
        post.created_at = None;
        assert_eq!(resolve(&post, "age_hours", &ctx()), None);
    }

    #[test]
    fn age_hours_accepts_date_only() {
        let mut post = post();
        post.created_at = Some("2024-03-01".into());
        assert_eq!(
            resolve(&post, "age_hours", &ctx()),
            Some(FieldValue::Number(12.0))
        );
    }

    #[test]
    fn engagement_ratio_counts_all_engagement() {
        let post = post();
        assert_eq!(
            resolve(&post, "engagement_ratio", &ctx()),
            Some(FieldValue::Number(2.0))
        );
    }

    #[test]
    fn engagement_ratio_missing_without_likes() {
        let mut post = post();
        post.metrics = Some(Metrics {
            likes: 0,
            reposts: 10,
            replies: 3,
        });
        assert_eq!(resolve(&post, "engagement_ratio", &ctx()), None);
    }

    #[test]
    fn list_coerces_to_joined_text() {
        let post = post();
        let value = resolve(&post, "labels", &ctx()).unwrap();
        assert_eq!(value.to_text(), "news,tech");
        assert_eq!(value.as_number(), None);
    }
}
