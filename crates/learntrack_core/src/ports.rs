//! crates/learntrack_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the progress engine. These
//! traits form the boundary of the hexagonal architecture: the Catalog is
//! consumed read-only, the store is the only shared mutable resource, and
//! the engine stays independent of whatever implements either side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Achievement, AchievementUnlock, Course, CourseStanding, Enrollment, Lesson, LessonProgress,
    Quiz, QuizAttempt,
};

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port and engine operation.
///
/// All variants are terminal for the triggering call; only `Unavailable` is
/// worth a caller-side retry. [`PortError::kind`] is the stable
/// machine-readable name surfaced to API clients.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("course {0} not found")]
    CourseNotFound(Uuid),
    #[error("lesson {0} not found")]
    LessonNotFound(Uuid),
    #[error("quiz {0} not found")]
    QuizNotFound(Uuid),
    #[error("learner {learner_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled { learner_id: Uuid, course_id: Uuid },
    #[error("learner {learner_id} is not enrolled in course {course_id}")]
    NotEnrolled { learner_id: Uuid, course_id: Uuid },
    #[error("submission has {submitted} answers but the quiz has {expected} questions")]
    MalformedSubmission { submitted: usize, expected: usize },
    #[error("attempt limit of {max_attempts} reached for quiz {quiz_id}")]
    AttemptLimitReached { quiz_id: Uuid, max_attempts: u32 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl PortError {
    /// Stable machine-readable kind for API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CourseNotFound(_) => "course_not_found",
            Self::LessonNotFound(_) => "lesson_not_found",
            Self::QuizNotFound(_) => "quiz_not_found",
            Self::AlreadyEnrolled { .. } => "already_enrolled",
            Self::NotEnrolled { .. } => "not_enrolled",
            Self::MalformedSubmission { .. } => "malformed_submission",
            Self::AttemptLimitReached { .. } => "attempt_limit_reached",
            Self::Unavailable(_) => "store_unavailable",
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Catalog port (read-only)
//=========================================================================================

/// Read-only access to course/lesson/quiz/achievement definitions. Owned by
/// course-authoring; this core never writes through it.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson>;

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    /// Every achievement definition. Definitions are few; no paging.
    async fn list_achievements(&self) -> PortResult<Vec<Achievement>>;
}

//=========================================================================================
// Progress store port
//=========================================================================================

/// The inputs of one atomic lesson-progress merge.
///
/// The store must apply the whole struct as a single read-modify-write
/// against the (learner, lesson) row: minutes accumulate and the completed
/// flag is OR-merged, with `completed_at` stamped only on the first
/// transition. Two concurrent merges for the same row must both land.
#[derive(Debug, Clone, Copy)]
pub struct LessonProgressMerge {
    pub learner_id: Uuid,
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub mark_completed: bool,
    pub add_minutes: u32,
    pub at: DateTime<Utc>,
}

/// Learner-wide lesson aggregates, one of the achievement-rule inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonTotals {
    pub lessons_completed: u32,
    pub minutes_spent: u32,
}

/// The persistence contract for the four mutable record types.
///
/// Uniqueness of (learner, course) enrollments and (learner, achievement)
/// unlocks is enforced HERE, not re-derived in application logic, so
/// concurrent writers resolve at the store.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    // --- Enrollments ---

    /// Fails with [`PortError::AlreadyEnrolled`] when the (learner, course)
    /// pair already exists.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> PortResult<()>;

    async fn find_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>>;

    /// A learner's enrollments, newest first.
    async fn list_enrollments(&self, learner_id: Uuid) -> PortResult<Vec<Enrollment>>;

    /// Bumps `last_accessed_at`; a no-op when no enrollment exists.
    async fn touch_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Writes the aggregator's output onto the enrollment row. Single-row,
    /// atomic by construction.
    async fn write_course_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        standing: CourseStanding,
    ) -> PortResult<()>;

    // --- Lesson progress ---

    /// Applies one merge atomically and returns the resulting row.
    async fn merge_lesson_progress(
        &self,
        merge: LessonProgressMerge,
    ) -> PortResult<LessonProgress>;

    async fn list_lesson_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Vec<LessonProgress>>;

    async fn count_completed_lessons(&self, learner_id: Uuid, course_id: Uuid)
        -> PortResult<u32>;

    /// Completed-lesson count and minutes across every course.
    async fn lesson_totals(&self, learner_id: Uuid) -> PortResult<LessonTotals>;

    // --- Quiz attempts (append-only) ---

    async fn insert_attempt(&self, attempt: &QuizAttempt) -> PortResult<()>;

    /// A learner's attempts at one quiz, newest first.
    async fn list_attempts(&self, learner_id: Uuid, quiz_id: Uuid) -> PortResult<Vec<QuizAttempt>>;

    async fn count_attempts(&self, learner_id: Uuid, quiz_id: Uuid) -> PortResult<u32>;

    /// Best score across all of a learner's attempts, if any.
    async fn best_quiz_score(&self, learner_id: Uuid) -> PortResult<Option<u8>>;

    // --- Achievement unlocks ---

    /// Insert-if-absent. Returns true when THIS call created the unlock,
    /// false when it already existed (including losing a concurrent race).
    async fn insert_unlock_if_absent(&self, unlock: &AchievementUnlock) -> PortResult<bool>;

    /// A learner's unlocks, newest first.
    async fn list_unlocks(&self, learner_id: Uuid) -> PortResult<Vec<AchievementUnlock>>;
}
