//! crates/learntrack_core/src/progress.rs
//!
//! The Lesson Progress Tracker: the write path for per-lesson completion and
//! accumulated time. Each update is one atomic store merge (minutes
//! accumulate and the completed flag only ever ORs upward) followed by an
//! enrollment touch and a full course recompute.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::aggregate::CourseProgressAggregator;
use crate::domain::{CourseProgress, CourseStanding, LessonProgress};
use crate::enrollment::EnrollmentManager;
use crate::ports::{CatalogReader, LessonProgressMerge, PortResult, ProgressStore};

/// A client's progress report for one lesson.
///
/// `completed: false` never un-completes a lesson; the flag is merged with a
/// boolean OR, so such a request is accepted as a no-op rather than refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressUpdate {
    pub completed: bool,
    pub time_spent_minutes: u32,
}

#[derive(Clone)]
pub struct LessonTracker {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn CatalogReader>,
    enrollments: EnrollmentManager,
    aggregator: CourseProgressAggregator,
}

impl LessonTracker {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        catalog: Arc<dyn CatalogReader>,
        enrollments: EnrollmentManager,
        aggregator: CourseProgressAggregator,
    ) -> Self {
        Self {
            store,
            catalog,
            enrollments,
            aggregator,
        }
    }

    /// Records one progress event for a lesson and returns the merged row
    /// plus the freshly recomputed course standing.
    ///
    /// Fails with `LessonNotFound` for an unknown lesson and `NotEnrolled`
    /// when the learner has no membership in the lesson's course. The row is
    /// created lazily on first touch. A merge that lands before a failed
    /// recompute stands; the cached percentage heals on the next successful
    /// recompute.
    pub async fn update_progress(
        &self,
        learner_id: Uuid,
        lesson_id: Uuid,
        update: ProgressUpdate,
    ) -> PortResult<(LessonProgress, CourseStanding)> {
        let lesson = self.catalog.get_lesson(lesson_id).await?;
        self.enrollments
            .require_enrollment(learner_id, lesson.course_id)
            .await?;

        let record = self
            .store
            .merge_lesson_progress(LessonProgressMerge {
                learner_id,
                lesson_id,
                course_id: lesson.course_id,
                mark_completed: update.completed,
                add_minutes: update.time_spent_minutes,
                at: Utc::now(),
            })
            .await?;

        self.enrollments.touch(learner_id, lesson.course_id).await?;
        let standing = self.aggregator.recompute(learner_id, lesson.course_id).await?;

        info!(
            %learner_id,
            %lesson_id,
            completed = record.completed,
            minutes = record.time_spent_minutes,
            course_progress = standing.progress,
            "lesson progress recorded"
        );
        Ok((record, standing))
    }

    /// A learner's standing in one course plus every per-lesson row so far.
    /// Fails with `NotEnrolled` when there is no membership; an enrolled
    /// learner who never touched a lesson gets an empty list.
    pub async fn course_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<CourseProgress> {
        let enrollment = self
            .enrollments
            .require_enrollment(learner_id, course_id)
            .await?;
        let lessons = self
            .store
            .list_lesson_progress(learner_id, course_id)
            .await?;
        Ok(CourseProgress {
            enrollment,
            lessons,
        })
    }
}
