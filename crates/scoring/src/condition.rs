use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use crate::fields::{resolve, EvalContext, FieldValue};
use crate::model::{Condition, ConditionValue, Operator, Post};

const REGEX_CACHE_CAPACITY: usize = 256;
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Compiled patterns keyed by source text. Failed compilations are cached
/// as `None` so a broken rule is only reported once per eviction.
static REGEX_CACHE: Lazy<Mutex<LruCache<String, Option<Regex>>>> = Lazy::new(|| {
    let capacity = NonZeroUsize::new(REGEX_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
    Mutex::new(LruCache::new(capacity))
});

/// Evaluates one condition against a post. Missing fields, type mismatches
/// and invalid patterns all evaluate to `false`.
pub fn evaluate_condition(post: &Post, condition: &Condition, ctx: &EvalContext) -> bool {
    let Some(field) = resolve(post, &condition.field, ctx) else {
        trace!(post_id = %post.id, field = %condition.field, "field missing");
        return false;
    };

    match condition.operator {
        Operator::Contains => contains(&field, &condition.value),
        Operator::Equals => equals(&field, &condition.value),
        Operator::Gt => compare(&field, &condition.value, |lhs, rhs| lhs > rhs),
        Operator::Lt => compare(&field, &condition.value, |lhs, rhs| lhs < rhs),
        Operator::Regex => matches_pattern(&field, &condition.value),
    }
}

fn contains(field: &FieldValue<'_>, value: &ConditionValue) -> bool {
    let haystack = field.to_text().to_lowercase();
    let needle = value.to_text().to_lowercase();
    haystack.contains(&needle)
}

fn equals(field: &FieldValue<'_>, value: &ConditionValue) -> bool {
    match value {
        ConditionValue::Text(expected) => field.to_text() == expected.as_str(),
        ConditionValue::Number(expected) => field.as_number() == Some(*expected),
    }
}

fn compare(field: &FieldValue<'_>, value: &ConditionValue, op: impl Fn(f64, f64) -> bool) -> bool {
    match (field.as_number(), value.as_number()) {
        (Some(lhs), Some(rhs)) => op(lhs, rhs),
        _ => false,
    }
}

fn matches_pattern(field: &FieldValue<'_>, value: &ConditionValue) -> bool {
    let pattern = value.to_text();
    let haystack = field.to_text();
    with_compiled(&pattern, |regex| regex.is_match(&haystack)).unwrap_or(false)
}

/// Runs `f` against the compiled form of `pattern`, or returns `None` when
/// the pattern does not compile. The cache lock is only held for the lookup
/// and insert; `f` runs on a cloned handle.
pub(crate) fn with_compiled<T>(pattern: &str, f: impl FnOnce(&Regex) -> T) -> Option<T> {
    cached(pattern).as_ref().map(f)
}

fn cached(pattern: &str) -> Option<Regex> {
    if let Ok(mut cache) = REGEX_CACHE.lock() {
        if let Some(entry) = cache.get(pattern) {
            return entry.clone();
        }
    }
    let compiled = compile(pattern).ok();
    if let Ok(mut cache) = REGEX_CACHE.lock() {
        cache.put(pattern.to_string(), compiled.clone());
    }
    compiled
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|err| {
            debug!(pattern, error = %err, "invalid rule pattern");
            err
        })
}

/// Why `pattern` cannot be used, or `None` if it compiles.
pub(crate) fn pattern_error(pattern: &str) -> Option<String> {
    let err = compile(pattern).err()?;
    let detail = err.to_string();
    let reason = detail.lines().last().unwrap_or_default().trim();
    let reason = reason.strip_prefix("error: ").unwrap_or(reason);
    if reason.contains("not supported") {
        Some(format!(
            "pattern `{}` uses unsupported syntax ({}); look-around and backreferences are not available",
            pattern, reason
        ))
    } else {
        Some(format!("pattern `{}` does not compile: {}", pattern, reason))
    }
}
