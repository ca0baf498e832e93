//! crates/learntrack_core/src/enrollment.rs
//!
//! The Enrollment Manager: creates and reads learner-course memberships.
//! Every progress-affecting path in the engine goes through
//! [`EnrollmentManager::require_enrollment`] before touching any state.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Enrollment, EnrollmentWithCourse};
use crate::ports::{CatalogReader, PortError, PortResult, ProgressStore};

#[derive(Clone)]
pub struct EnrollmentManager {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn CatalogReader>,
}

impl EnrollmentManager {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self { store, catalog }
    }

    /// Enrolls a learner in a course.
    ///
    /// Fails with `CourseNotFound` when the catalog doesn't know the course
    /// and with `AlreadyEnrolled` when the pair exists. Duplicate detection
    /// rides the store's unique constraint so a concurrent double-enroll
    /// resolves there, not in a check-then-act here.
    pub async fn enroll(&self, learner_id: Uuid, course_id: Uuid) -> PortResult<Enrollment> {
        let course = self.catalog.get_course(course_id).await?;

        let now = Utc::now();
        let enrollment = Enrollment {
            learner_id,
            course_id: course.id,
            progress: 0,
            completed: false,
            enrolled_at: now,
            last_accessed_at: now,
        };
        self.store.insert_enrollment(&enrollment).await?;

        info!(%learner_id, %course_id, "learner enrolled");
        Ok(enrollment)
    }

    /// A learner's enrollments, newest first, each with its course summary.
    pub async fn enrollments_for(&self, learner_id: Uuid) -> PortResult<Vec<EnrollmentWithCourse>> {
        let enrollments = self.store.list_enrollments(learner_id).await?;

        let mut with_courses = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let course = self.catalog.get_course(enrollment.course_id).await?;
            with_courses.push(EnrollmentWithCourse {
                enrollment,
                course: course.summary(),
            });
        }
        Ok(with_courses)
    }

    /// The guard in front of every progress-affecting call: the enrollment,
    /// or `NotEnrolled`.
    pub async fn require_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Enrollment> {
        self.store
            .find_enrollment(learner_id, course_id)
            .await?
            .ok_or(PortError::NotEnrolled {
                learner_id,
                course_id,
            })
    }

    /// Bumps `last_accessed_at`. Silently a no-op when no enrollment exists;
    /// callers are expected to have gone through [`Self::require_enrollment`]
    /// already.
    pub async fn touch(&self, learner_id: Uuid, course_id: Uuid) -> PortResult<()> {
        self.store
            .touch_enrollment(learner_id, course_id, Utc::now())
            .await
    }
}
