//! Aggregate execution statistics over task records.

use super::{TaskRecord, TaskStatus};
use serde::{Deserialize, Serialize};

/// Counts and rates over every known task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatistics {
    /// Number of known tasks.
    #[serde(rename = "total_tasks")]
    pub total: usize,
    /// Number of completed tasks.
    #[serde(rename = "completed_tasks")]
    pub completed: usize,
    /// Number of failed tasks.
    #[serde(rename = "failed_tasks")]
    pub failed: usize,
    /// Number of running tasks.
    #[serde(rename = "running_tasks")]
    pub running: usize,
    /// Completed tasks divided by total tasks, `0` when there are none.
    pub success_rate: f64,
    /// Mean duration of completed tasks that have one, `0` when none do.
    pub average_duration: f64,
}

impl TaskStatistics {
    /// Computes statistics over the given records.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "rates and means are reported as floating point"
    )]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TaskRecord>) -> Self {
        let mut stats = Self::default();
        let mut duration_sum = 0.0;
        let mut duration_count = 0_usize;

        for record in records {
            stats.total += 1;
            match record.status() {
                TaskStatus::Completed => {
                    stats.completed += 1;
                    if let Some(duration) = record.duration() {
                        duration_sum += duration;
                        duration_count += 1;
                    }
                }
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Pending | TaskStatus::Cancelled => {}
            }
        }

        if stats.total > 0 {
            stats.success_rate = stats.completed as f64 / stats.total as f64;
        }
        if duration_count > 0 {
            stats.average_duration = duration_sum / duration_count as f64;
        }
        stats
    }
}
