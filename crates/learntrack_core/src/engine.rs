//! crates/learntrack_core/src/engine.rs
//!
//! `ProgressEngine` is the thin coordinator the HTTP layer talks to. Each
//! component stays independently usable; the engine owns only the wiring
//! between them: progress updates trigger achievement evaluation, and a
//! graded lesson quiz marks its lesson complete for enrolled learners.

use std::sync::Arc;

use uuid::Uuid;

use crate::achievements::AchievementEvaluator;
use crate::aggregate::CourseProgressAggregator;
use crate::domain::{
    CourseProgress, CourseStanding, Enrollment, EnrollmentWithCourse, GradeReport, LearnerFacts,
    LessonProgress, QuizAttempt, UnlockedAchievement,
};
use crate::enrollment::EnrollmentManager;
use crate::grading::{GradingPolicy, QuizGrader};
use crate::ports::{CatalogReader, PortError, PortResult, ProgressStore};
use crate::progress::{LessonTracker, ProgressUpdate};

/// What one progress update changed: the lesson record after the merge, the
/// recomputed course standing, and any achievements it tipped over.
#[derive(Debug, Clone)]
pub struct LessonProgressOutcome {
    pub record: LessonProgress,
    pub course: CourseStanding,
    pub unlocked: Vec<UnlockedAchievement>,
}

/// What one quiz submission produced.
#[derive(Debug, Clone)]
pub struct QuizOutcome {
    pub grade: GradeReport,
    pub unlocked: Vec<UnlockedAchievement>,
}

#[derive(Clone)]
pub struct ProgressEngine {
    enrollments: EnrollmentManager,
    tracker: LessonTracker,
    grader: QuizGrader,
    achievements: AchievementEvaluator,
}

impl ProgressEngine {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self::with_policy(store, catalog, GradingPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn ProgressStore>,
        catalog: Arc<dyn CatalogReader>,
        policy: GradingPolicy,
    ) -> Self {
        let enrollments = EnrollmentManager::new(store.clone(), catalog.clone());
        let aggregator = CourseProgressAggregator::new(store.clone(), catalog.clone());
        let tracker = LessonTracker::new(
            store.clone(),
            catalog.clone(),
            enrollments.clone(),
            aggregator,
        );
        let grader = QuizGrader::with_policy(store.clone(), catalog.clone(), policy);
        let achievements = AchievementEvaluator::new(store, catalog);

        Self {
            enrollments,
            tracker,
            grader,
            achievements,
        }
    }

    //=========================================================================
    // Enrollment
    //=========================================================================

    pub async fn enroll(&self, learner_id: Uuid, course_id: Uuid) -> PortResult<Enrollment> {
        self.enrollments.enroll(learner_id, course_id).await
    }

    pub async fn enrollments_for(
        &self,
        learner_id: Uuid,
    ) -> PortResult<Vec<EnrollmentWithCourse>> {
        self.enrollments.enrollments_for(learner_id).await
    }

    //=========================================================================
    // Lesson progress
    //=========================================================================

    /// Records a progress update and re-evaluates achievements afterwards,
    /// since completions and accumulated minutes can both tip a rule.
    pub async fn record_lesson_progress(
        &self,
        learner_id: Uuid,
        lesson_id: Uuid,
        update: ProgressUpdate,
    ) -> PortResult<LessonProgressOutcome> {
        let (record, course) = self
            .tracker
            .update_progress(learner_id, lesson_id, update)
            .await?;
        let unlocked = self.achievements.evaluate(learner_id).await?;

        Ok(LessonProgressOutcome {
            record,
            course,
            unlocked,
        })
    }

    pub async fn course_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<CourseProgress> {
        self.tracker.course_progress(learner_id, course_id).await
    }

    //=========================================================================
    // Quizzes
    //=========================================================================

    /// Grades a submission, then applies the side effects grading itself
    /// stays out of: a lesson-attached quiz marks its lesson complete when
    /// the learner is enrolled (an unenrolled learner still gets a grade),
    /// and achievements are re-evaluated. The lesson wiring runs against the
    /// same quiz snapshot the grader read.
    pub async fn submit_quiz_attempt(
        &self,
        learner_id: Uuid,
        quiz_id: Uuid,
        answers: &[u32],
        time_spent_minutes: u32,
    ) -> PortResult<QuizOutcome> {
        let (grade, quiz) = self
            .grader
            .submit_attempt(learner_id, quiz_id, answers, time_spent_minutes)
            .await?;

        if let Some(lesson_id) = quiz.lesson_id {
            match self
                .enrollments
                .require_enrollment(learner_id, quiz.course_id)
                .await
            {
                Ok(_) => {
                    self.tracker
                        .update_progress(
                            learner_id,
                            lesson_id,
                            ProgressUpdate {
                                completed: true,
                                time_spent_minutes: 0,
                            },
                        )
                        .await?;
                }
                Err(PortError::NotEnrolled { .. }) => {}
                Err(other) => return Err(other),
            }
        }

        let unlocked = self.achievements.evaluate(learner_id).await?;
        Ok(QuizOutcome { grade, unlocked })
    }

    pub async fn quiz_attempts(
        &self,
        learner_id: Uuid,
        quiz_id: Uuid,
    ) -> PortResult<Vec<QuizAttempt>> {
        self.grader.attempts_for(learner_id, quiz_id).await
    }

    //=========================================================================
    // Achievements and stats
    //=========================================================================

    pub async fn evaluate_achievements(
        &self,
        learner_id: Uuid,
    ) -> PortResult<Vec<UnlockedAchievement>> {
        self.achievements.evaluate(learner_id).await
    }

    pub async fn achievements_for(
        &self,
        learner_id: Uuid,
    ) -> PortResult<Vec<UnlockedAchievement>> {
        self.achievements.unlocked_for(learner_id).await
    }

    pub async fn learner_stats(&self, learner_id: Uuid) -> PortResult<LearnerFacts> {
        self.achievements.learner_facts(learner_id).await
    }
}
