//! crates/learntrack_core/src/aggregate.rs
//!
//! The Course Progress Aggregator: derives the 0-100 percentage from
//! LessonProgress rows relative to the current catalog and writes it back
//! onto the Enrollment row. It owns no storage of its own and is re-run in
//! full after every mutation, so retries and concurrent updates can't
//! drift the cached value.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::CourseStanding;
use crate::ports::{CatalogReader, PortResult, ProgressStore};

#[derive(Clone)]
pub struct CourseProgressAggregator {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn CatalogReader>,
}

impl CourseProgressAggregator {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self { store, catalog }
    }

    /// Recomputes a learner's standing in one course against the CURRENT
    /// catalog, persists it onto the enrollment row, and returns it so the
    /// caller can answer without a second read.
    ///
    /// Propagates `CourseNotFound` if the course vanished concurrently. A
    /// course edited smaller after enrollment just makes the percentage jump;
    /// progress always reflects current course structure, not a snapshot.
    pub async fn recompute(&self, learner_id: Uuid, course_id: Uuid) -> PortResult<CourseStanding> {
        let course = self.catalog.get_course(course_id).await?;
        let total = course.lesson_ids.len() as u32;
        let done = self
            .store
            .count_completed_lessons(learner_id, course_id)
            .await?;

        let progress = percentage(done, total);
        let standing = CourseStanding {
            progress,
            completed: progress == 100,
        };
        self.store
            .write_course_progress(learner_id, course_id, standing)
            .await?;

        debug!(%learner_id, %course_id, done, total, progress, "course progress recomputed");
        Ok(standing)
    }
}

/// floor(100 * done / total), clamped to 100.
///
/// Truncation, not rounding: 100 must never be reported before the last
/// lesson is actually done. The clamp covers rows left over after the course
/// shrank. A course with no lessons is 0, not an error.
pub(crate) fn percentage(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    ((100 * u64::from(done)) / u64::from(total)).min(100) as u8
}
