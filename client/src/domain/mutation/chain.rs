//! Best-effort multi-step chains.
//!
//! Steps run in order and independently. A failing step is logged and
//! recorded; it never stops later steps and never undoes earlier ones.

use std::future::Future;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::domain::HttpError;

/// One labelled step of a chain.
pub struct ChainStep<'a> {
    label: String,
    run: BoxFuture<'a, Result<(), HttpError>>,
}

impl<'a> ChainStep<'a> {
    /// Step named `label` that runs `run` when the chain reaches it.
    pub fn new(
        label: impl Into<String>,
        run: impl Future<Output = Result<(), HttpError>> + Send + 'a,
    ) -> Self {
        Self {
            label: label.into(),
            run: Box::pin(run),
        }
    }

    /// Label reported in the chain outcome.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A step that failed and was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStep {
    /// Label of the failed step.
    pub label: String,
    /// Why it failed.
    pub error: HttpError,
}

/// Outcome of a chain: which steps landed and which were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainReport {
    /// Labels of the steps that succeeded, in run order.
    pub completed: Vec<String>,
    /// Steps that failed, in run order.
    pub skipped: Vec<SkippedStep>,
}

impl ChainReport {
    /// Whether every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fold another report into this one, keeping step order.
    pub fn absorb(&mut self, other: ChainReport) {
        self.completed.extend(other.completed);
        self.skipped.extend(other.skipped);
    }
}

/// Run `steps` in order, collecting failures instead of propagating them.
pub async fn run_chain(steps: Vec<ChainStep<'_>>) -> ChainReport {
    let mut report = ChainReport::default();
    for ChainStep { label, run } in steps {
        match run.await {
            Ok(()) => {
                debug!(step = %label, "chain step completed");
                report.completed.push(label);
            }
            Err(error) => {
                warn!(step = %label, %error, "chain step failed; continuing");
                report.skipped.push(SkippedStep { label, error });
            }
        }
    }
    report
}
