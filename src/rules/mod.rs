//! Bulk rule application: conditions select articles, actions mutate them.
//!
//! The engine owns sequencing and counting only. Articles come from an
//! [`ArticleSource`] and mutations go through an [`ActionExecutor`]; the
//! bundled SQLite store implements both, tests substitute mocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::filter;
use crate::models::{Action, Article, Rule};

/// Provider of the article corpus a rule sweeps over.
pub trait ArticleSource {
    /// Full working set, in the store's stable order.
    fn articles(&self) -> anyhow::Result<Vec<Article>>;
}

/// Sink executing one named action against one article by key.
pub trait ActionExecutor {
    fn execute(&self, article_id: &str, action: &Action) -> anyhow::Result<()>;
}

/// Errors that fail a whole apply call.
///
/// Per-article action failures are not in here: they are logged, excluded
/// from the affected count, and the sweep continues.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("a rule needs at least one action")]
    NoActions,

    #[error("a rule needs at least one valid condition")]
    NoConditions,

    #[error("article source unavailable: {0}")]
    Source(anyhow::Error),
}

/// Cooperative cancellation flag for long sweeps.
///
/// Cancellation is checked between articles; actions already applied stay
/// applied (bulk apply is at-least-once, not transactional).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one apply call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Articles with at least one action applied. An article counts once no
    /// matter how many of the rule's actions ran on it.
    pub affected: u64,
    pub cancelled: bool,
}

pub struct RuleEngine<S, E> {
    source: S,
    executor: E,
}

impl<S: ArticleSource, E: ActionExecutor> RuleEngine<S, E> {
    pub fn new(source: S, executor: E) -> Self {
        Self { source, executor }
    }

    /// Applies `rule` to every matching article in the source.
    ///
    /// An unreachable source is fatal for the call; everything after that
    /// is best-effort. Failed actions log at `warn` and the article is
    /// only counted if some other action of the rule succeeded for it.
    pub fn apply(&self, rule: &Rule, cancel: &CancelToken) -> Result<ApplyOutcome, RuleError> {
        if rule.actions.is_empty() {
            return Err(RuleError::NoActions);
        }

        let conditions = filter::valid_conditions(&rule.conditions);
        if conditions.is_empty() {
            return Err(RuleError::NoConditions);
        }

        let articles = self.source.articles().map_err(RuleError::Source)?;

        let mut affected = 0u64;
        let mut cancelled = false;

        for article in &articles {
            if cancel.is_cancelled() {
                tracing::info!(affected, "rule application cancelled");
                cancelled = true;
                break;
            }

            if !filter::evaluate(article, &conditions) {
                continue;
            }

            let mut applied = false;
            for action in &rule.actions {
                match self.executor.execute(&article.id, action) {
                    Ok(()) => applied = true,
                    Err(err) => {
                        tracing::warn!(
                            article_id = %article.id,
                            action = action.kind.as_str(),
                            "action failed: {err:#}"
                        );
                    }
                }
            }

            if applied {
                affected += 1;
            }
        }

        Ok(ApplyOutcome {
            affected,
            cancelled,
        })
    }
}
