//! crates/learntrack_core/src/grading.rs
//!
//! The Quiz Grading Engine: scores a submission against the answer key by
//! positional comparison and persists an immutable attempt record. Grading
//! never touches lesson or enrollment state (the engine facade wires
//! lesson-attached quizzes to the tracker), so it can be exercised without
//! any enrollment at all.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{GradeReport, Quiz, QuizAttempt, QuizQuestion};
use crate::ports::{CatalogReader, PortError, PortResult, ProgressStore};

/// How many attempts a learner gets per quiz. The default is the source
/// system's permissive behavior: resubmit as often as you like.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradingPolicy {
    pub max_attempts: Option<u32>,
}

#[derive(Clone)]
pub struct QuizGrader {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn CatalogReader>,
    policy: GradingPolicy,
}

impl QuizGrader {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self::with_policy(store, catalog, GradingPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn ProgressStore>,
        catalog: Arc<dyn CatalogReader>,
        policy: GradingPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    /// Grades one submission and persists it as a new attempt. Returns the
    /// report together with the quiz it was graded against, so callers that
    /// act on the quiz afterwards work from the same snapshot.
    ///
    /// Fails with `QuizNotFound` for an unknown quiz and with
    /// `MalformedSubmission` when the answer count doesn't match the question
    /// count; partial submissions are refused before anything is written.
    /// With a max-attempts policy configured, an exhausted learner gets
    /// `AttemptLimitReached`. Prior attempts are never mutated.
    pub async fn submit_attempt(
        &self,
        learner_id: Uuid,
        quiz_id: Uuid,
        answers: &[u32],
        time_spent_minutes: u32,
    ) -> PortResult<(GradeReport, Quiz)> {
        let quiz = self.catalog.get_quiz(quiz_id).await?;

        let total_questions = quiz.questions.len();
        if answers.len() != total_questions {
            return Err(PortError::MalformedSubmission {
                submitted: answers.len(),
                expected: total_questions,
            });
        }

        if let Some(max_attempts) = self.policy.max_attempts {
            let taken = self.store.count_attempts(learner_id, quiz_id).await?;
            if taken >= max_attempts {
                return Err(PortError::AttemptLimitReached {
                    quiz_id,
                    max_attempts,
                });
            }
        }

        let correct_count = count_correct(&quiz.questions, answers);
        let score = score_percentage(correct_count, total_questions as u32);

        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            learner_id,
            quiz_id,
            answers: answers.to_vec(),
            score,
            correct_count,
            total_questions: total_questions as u32,
            time_spent_minutes,
            submitted_at: Utc::now(),
        };
        self.store.insert_attempt(&attempt).await?;

        info!(%learner_id, %quiz_id, score, correct_count, total_questions, "quiz attempt graded");
        let report = GradeReport {
            attempt_id: attempt.id,
            score,
            correct_count,
            total_questions: total_questions as u32,
        };
        Ok((report, quiz))
    }

    /// A learner's attempt history for one quiz, newest first.
    pub async fn attempts_for(
        &self,
        learner_id: Uuid,
        quiz_id: Uuid,
    ) -> PortResult<Vec<QuizAttempt>> {
        self.store.list_attempts(learner_id, quiz_id).await
    }
}

/// Question i is correct iff answers[i] picks its correct option.
fn count_correct(questions: &[QuizQuestion], answers: &[u32]) -> u32 {
    questions
        .iter()
        .zip(answers)
        .filter(|(question, &answer)| answer as usize == question.correct_option_index)
        .count() as u32
}

/// round(100 * correct / total). Rounding, not truncation: the score is
/// informational, unlike the course percentage which gates completion.
fn score_percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    ((100.0 * f64::from(correct)) / f64::from(total)).round() as u8
}
