// 🔁 Batch executor - many independent store calls, one tally
//
// Items run one after another. A failing item is recorded and the loop moves
// on; nothing is retried and nothing aborts the remaining items.

use crate::error::{CrmError, Result};
use tracing::{info, warn};

#[derive(Debug)]
pub struct BatchFailure<I> {
    /// Position of the item in the submitted batch
    pub index: usize,
    pub item: I,
    pub error: CrmError,
}

#[derive(Debug)]
pub struct BatchResult<T, I> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchFailure<I>>,
}

impl<T, I> Default for BatchResult<T, I> {
    fn default() -> Self {
        BatchResult {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T, I> BatchResult<T, I> {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn error_count(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.success_count() + self.error_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} succeeded, {} failed",
            self.success_count(),
            self.total(),
            self.error_count()
        )
    }

    /// "#3: Record not found: abc" per failure
    pub fn failure_messages(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|f| format!("#{}: {}", f.index + 1, f.error))
            .collect()
    }
}

pub struct BatchExecutor {
    label: String,
}

impl BatchExecutor {
    pub fn new(label: impl Into<String>) -> Self {
        BatchExecutor {
            label: label.into(),
        }
    }

    /// Run `op` on every item in order, tallying successes and failures
    pub fn run<I, T, F>(&self, items: impl IntoIterator<Item = I>, mut op: F) -> BatchResult<T, I>
    where
        F: FnMut(&I) -> Result<T>,
    {
        let mut result = BatchResult::default();

        for (index, item) in items.into_iter().enumerate() {
            match op(&item) {
                Ok(value) => result.succeeded.push(value),
                Err(error) => {
                    warn!("{}: item #{} failed: {}", self.label, index + 1, error);
                    result.failed.push(BatchFailure { index, item, error });
                }
            }
        }

        info!("{}: {}", self.label, result.summary());
        result
    }
}
