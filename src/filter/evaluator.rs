//! Chain evaluation of condition sequences.
//!
//! Evaluation is pure and stateless: the same article and conditions always
//! produce the same answer, and many articles can be evaluated concurrently
//! with no shared state. Temporal operators take "now" as an argument so
//! tests stay deterministic; [`evaluate`] pins it to the wall clock.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{Article, Condition, Field, Logic, Operator};

/// Drops conditions that cannot be evaluated (empty operands, operators
/// that do not fit the field kind).
///
/// A sequence with holes keeps its remaining conditions and their combinator
/// tags; a chain that loses its opener simply starts at the next survivor.
pub fn valid_conditions(conditions: &[Condition]) -> Vec<Condition> {
    conditions.iter().filter(|c| c.is_valid()).cloned().collect()
}

/// Returns true if the article matches the condition chain.
///
/// Callers pre-filter with [`valid_conditions`] and decide what an empty
/// sequence means for them; given one anyway, nothing matches.
pub fn evaluate(article: &Article, conditions: &[Condition]) -> bool {
    evaluate_at(article, conditions, Utc::now())
}

/// [`evaluate`] with an explicit "now" for temporal operators.
pub fn evaluate_at(article: &Article, conditions: &[Condition], now: DateTime<Utc>) -> bool {
    let Some((first, rest)) = conditions.split_first() else {
        return false;
    };

    // Strict left-to-right fold. `negate` inverts the atomic match before
    // combination, never the aggregate.
    let mut result = atomic_match(article, first, now) != first.negate;
    for condition in rest {
        let matched = atomic_match(article, condition, now) != condition.negate;
        result = match condition.logic {
            Logic::Or => result || matched,
            // A stray `none` tag mid-chain combines as `and`.
            Logic::And | Logic::None => result && matched,
        };
    }

    result
}

fn atomic_match(article: &Article, condition: &Condition, now: DateTime<Utc>) -> bool {
    match condition.field {
        Field::Title => match_text(&article.title, condition),
        Field::Link => match_text(&article.link, condition),
        Field::Author => match_text(&article.author, condition),
        Field::Content => match_text(&article.content, condition),
        Field::FeedId => match_text(&article.feed_id, condition),
        Field::Categories => intersects(&article.categories, &condition.values),
        Field::Read => article.read == coerce_bool(&condition.value),
        Field::Starred => article.starred == coerce_bool(&condition.value),
        Field::PublishedAt => match_temporal(article.published_at, condition, now),
    }
}

/// Text operators are case-insensitive across the board.
fn match_text(haystack: &str, condition: &Condition) -> bool {
    let haystack = haystack.to_lowercase();
    let needle = condition.value.to_lowercase();
    match condition.operator {
        Operator::Contains => haystack.contains(&needle),
        Operator::Equals => haystack == needle,
        Operator::StartsWith => haystack.starts_with(&needle),
        Operator::EndsWith => haystack.ends_with(&needle),
        _ => false,
    }
}

/// Multi-select match: non-empty intersection, case-insensitive.
fn intersects(categories: &[String], values: &[String]) -> bool {
    categories.iter().any(|category| {
        values
            .iter()
            .any(|value| value.eq_ignore_ascii_case(category))
    })
}

fn coerce_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn match_temporal(published_at: DateTime<Utc>, condition: &Condition, now: DateTime<Utc>) -> bool {
    match condition.operator {
        Operator::Before => {
            parse_instant(&condition.value).is_some_and(|instant| published_at < instant)
        }
        Operator::After => {
            parse_instant(&condition.value).is_some_and(|instant| published_at > instant)
        }
        Operator::WithinDays => condition
            .value
            .trim()
            .parse::<i64>()
            .ok()
            .is_some_and(|days| {
                published_at <= now && published_at >= now - Duration::days(days)
            }),
        _ => false,
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
/// An unparseable operand makes the atomic match false.
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
