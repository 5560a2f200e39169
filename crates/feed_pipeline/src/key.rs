use std::fmt;

use common::{Fingerprint, Result};
use scoring::{Condition, FeedRule, Post, RuleKind, ENGINE_VERSION};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    Scored,
    Filtered,
    Preview,
}

impl Projection {
    pub const ALL: [Projection; 3] = [Projection::Scored, Projection::Filtered, Projection::Preview];

    pub fn as_str(&self) -> &'static str {
        match self {
            Projection::Scored => "scored",
            Projection::Filtered => "filtered",
            Projection::Preview => "preview",
        }
    }

    /// Whether `rule` can change this projection's output.
    pub fn depends_on(&self, rule: &FeedRule) -> bool {
        if !rule.enabled {
            return false;
        }
        match self {
            Projection::Scored => rule.kind.is_scoring(),
            Projection::Filtered => !rule.kind.is_scoring(),
            Projection::Preview => true,
        }
    }
}

/// The parts of a rule that affect evaluation; ids and names do not.
#[derive(Serialize)]
struct RuleSignature<'a> {
    kind: &'a RuleKind,
    condition: &'a Condition,
}

/// Content address of one projection: the post batch plus the rules that
/// projection depends on.
///
/// Disabled rules and rules of an irrelevant kind are left out, and the
/// remaining rule signatures are sorted, so reordering or toggling an
/// unrelated rule reuses the cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    projection: Projection,
    key: String,
}

impl ProjectionKey {
    pub fn new(projection: Projection, posts: &[Post], rules: &[FeedRule]) -> Result<Self> {
        let posts_digest = Fingerprint::new().with_json(posts)?.finish_short(32);

        let mut signatures = rules
            .iter()
            .filter(|rule| projection.depends_on(rule))
            .map(|rule| {
                serde_json::to_string(&RuleSignature {
                    kind: &rule.kind,
                    condition: &rule.condition,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        signatures.sort_unstable();

        let rules_digest = signatures
            .iter()
            .fold(Fingerprint::new().with_str(ENGINE_VERSION), |fp, sig| {
                fp.with_str(sig)
            })
            .finish_short(32);

        Ok(Self {
            projection,
            key: format!(
                "{} posts:{} rules:{}",
                projection.as_str(),
                posts_digest,
                rules_digest
            ),
        })
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ProjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
