//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapters: the concrete implementations
//! of the `ProgressStore` and `CatalogReader` ports from the `core` crate.
//! All interactions with the PostgreSQL database go through `sqlx`.
//!
//! Queries use the runtime API rather than the compile-time macros so the
//! workspace builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learntrack_core::domain::{
    Achievement, AchievementRule, AchievementUnlock, Course, CourseStanding, Enrollment, Lesson,
    LessonKind, LessonProgress, Quiz, QuizAttempt, QuizQuestion,
};
use learntrack_core::ports::{
    CatalogReader, LessonProgressMerge, LessonTotals, PortError, PortResult, ProgressStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Maps any sqlx failure onto the transient-infrastructure variant.
fn unavailable(e: sqlx::Error) -> PortError {
    PortError::Unavailable(e.to_string())
}

//=========================================================================================
// The Progress Store Adapter
//=========================================================================================

/// A database adapter that implements the `ProgressStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct EnrollmentRecord {
    learner_id: Uuid,
    course_id: Uuid,
    progress: i16,
    completed: bool,
    enrolled_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}
impl EnrollmentRecord {
    fn to_domain(self) -> Enrollment {
        Enrollment {
            learner_id: self.learner_id,
            course_id: self.course_id,
            progress: self.progress as u8,
            completed: self.completed,
            enrolled_at: self.enrolled_at,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

#[derive(FromRow)]
struct LessonProgressRecord {
    learner_id: Uuid,
    lesson_id: Uuid,
    course_id: Uuid,
    completed: bool,
    time_spent_minutes: i32,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}
impl LessonProgressRecord {
    fn to_domain(self) -> LessonProgress {
        LessonProgress {
            learner_id: self.learner_id,
            lesson_id: self.lesson_id,
            course_id: self.course_id,
            completed: self.completed,
            time_spent_minutes: self.time_spent_minutes as u32,
            completed_at: self.completed_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct QuizAttemptRecord {
    id: Uuid,
    learner_id: Uuid,
    quiz_id: Uuid,
    answers: Vec<i32>,
    score: i16,
    correct_count: i32,
    total_questions: i32,
    time_spent_minutes: i32,
    submitted_at: DateTime<Utc>,
}
impl QuizAttemptRecord {
    fn to_domain(self) -> QuizAttempt {
        QuizAttempt {
            id: self.id,
            learner_id: self.learner_id,
            quiz_id: self.quiz_id,
            answers: self.answers.into_iter().map(|a| a as u32).collect(),
            score: self.score as u8,
            correct_count: self.correct_count as u32,
            total_questions: self.total_questions as u32,
            time_spent_minutes: self.time_spent_minutes as u32,
            submitted_at: self.submitted_at,
        }
    }
}

#[derive(FromRow)]
struct UnlockRecord {
    learner_id: Uuid,
    achievement_id: Uuid,
    unlocked_at: DateTime<Utc>,
}
impl UnlockRecord {
    fn to_domain(self) -> AchievementUnlock {
        AchievementUnlock {
            learner_id: self.learner_id,
            achievement_id: self.achievement_id,
            unlocked_at: self.unlocked_at,
        }
    }
}

//=========================================================================================
// `ProgressStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressStore for PgStore {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO enrollments \
             (learner_id, course_id, progress, completed, enrolled_at, last_accessed_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(enrollment.learner_id)
        .bind(enrollment.course_id)
        .bind(enrollment.progress as i16)
        .bind(enrollment.completed)
        .bind(enrollment.enrolled_at)
        .bind(enrollment.last_accessed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => PortError::AlreadyEnrolled {
                learner_id: enrollment.learner_id,
                course_id: enrollment.course_id,
            },
            _ => unavailable(e),
        })?;
        Ok(())
    }

    async fn find_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT learner_id, course_id, progress, completed, enrolled_at, last_accessed_at \
             FROM enrollments WHERE learner_id = $1 AND course_id = $2",
        )
        .bind(learner_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(record.map(EnrollmentRecord::to_domain))
    }

    async fn list_enrollments(&self, learner_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let records = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT learner_id, course_id, progress, completed, enrolled_at, last_accessed_at \
             FROM enrollments WHERE learner_id = $1 ORDER BY enrolled_at DESC",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn touch_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE enrollments SET last_accessed_at = $3 \
             WHERE learner_id = $1 AND course_id = $2",
        )
        .bind(learner_id)
        .bind(course_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn write_course_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        standing: CourseStanding,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE enrollments SET progress = $3, completed = $4 \
             WHERE learner_id = $1 AND course_id = $2",
        )
        .bind(learner_id)
        .bind(course_id)
        .bind(standing.progress as i16)
        .bind(standing.completed)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn merge_lesson_progress(
        &self,
        merge: LessonProgressMerge,
    ) -> PortResult<LessonProgress> {
        // A single upsert keeps concurrent merges for the same row lossless.
        // Minutes are summed and completed only ever flips upward, with
        // completed_at keeping its first value.
        let record = sqlx::query_as::<_, LessonProgressRecord>(
            "INSERT INTO lesson_progress \
             (learner_id, lesson_id, course_id, completed, time_spent_minutes, completed_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, CASE WHEN $4 THEN $6 END, $6) \
             ON CONFLICT (learner_id, lesson_id) DO UPDATE SET \
                 completed = lesson_progress.completed OR EXCLUDED.completed, \
                 time_spent_minutes = lesson_progress.time_spent_minutes + EXCLUDED.time_spent_minutes, \
                 completed_at = COALESCE(lesson_progress.completed_at, EXCLUDED.completed_at), \
                 updated_at = EXCLUDED.updated_at \
             RETURNING learner_id, lesson_id, course_id, completed, time_spent_minutes, \
                       completed_at, updated_at",
        )
        .bind(merge.learner_id)
        .bind(merge.lesson_id)
        .bind(merge.course_id)
        .bind(merge.mark_completed)
        .bind(merge.add_minutes as i32)
        .bind(merge.at)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(record.to_domain())
    }

    async fn list_lesson_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Vec<LessonProgress>> {
        let records = sqlx::query_as::<_, LessonProgressRecord>(
            "SELECT learner_id, lesson_id, course_id, completed, time_spent_minutes, \
                    completed_at, updated_at \
             FROM lesson_progress WHERE learner_id = $1 AND course_id = $2 \
             ORDER BY updated_at ASC, lesson_id ASC",
        )
        .bind(learner_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_completed_lessons(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lesson_progress \
             WHERE learner_id = $1 AND course_id = $2 AND completed",
        )
        .bind(learner_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(count as u32)
    }

    async fn lesson_totals(&self, learner_id: Uuid) -> PortResult<LessonTotals> {
        let (lessons_completed, minutes_spent): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE completed), \
                    COALESCE(SUM(time_spent_minutes), 0) \
             FROM lesson_progress WHERE learner_id = $1",
        )
        .bind(learner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(LessonTotals {
            lessons_completed: lessons_completed as u32,
            minutes_spent: minutes_spent as u32,
        })
    }

    async fn insert_attempt(&self, attempt: &QuizAttempt) -> PortResult<()> {
        let answers: Vec<i32> = attempt.answers.iter().map(|&a| a as i32).collect();
        sqlx::query(
            "INSERT INTO quiz_attempts \
             (id, learner_id, quiz_id, answers, score, correct_count, total_questions, \
              time_spent_minutes, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(attempt.id)
        .bind(attempt.learner_id)
        .bind(attempt.quiz_id)
        .bind(answers)
        .bind(attempt.score as i16)
        .bind(attempt.correct_count as i32)
        .bind(attempt.total_questions as i32)
        .bind(attempt.time_spent_minutes as i32)
        .bind(attempt.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn list_attempts(&self, learner_id: Uuid, quiz_id: Uuid) -> PortResult<Vec<QuizAttempt>> {
        let records = sqlx::query_as::<_, QuizAttemptRecord>(
            "SELECT id, learner_id, quiz_id, answers, score, correct_count, total_questions, \
                    time_spent_minutes, submitted_at \
             FROM quiz_attempts WHERE learner_id = $1 AND quiz_id = $2 \
             ORDER BY submitted_at DESC",
        )
        .bind(learner_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_attempts(&self, learner_id: Uuid, quiz_id: Uuid) -> PortResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_attempts WHERE learner_id = $1 AND quiz_id = $2",
        )
        .bind(learner_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(count as u32)
    }

    async fn best_quiz_score(&self, learner_id: Uuid) -> PortResult<Option<u8>> {
        let best: Option<i16> = sqlx::query_scalar(
            "SELECT MAX(score) FROM quiz_attempts WHERE learner_id = $1",
        )
        .bind(learner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(best.map(|score| score as u8))
    }

    async fn insert_unlock_if_absent(&self, unlock: &AchievementUnlock) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO achievement_unlocks (learner_id, achievement_id, unlocked_at) \
             VALUES ($1, $2, $3) ON CONFLICT (learner_id, achievement_id) DO NOTHING",
        )
        .bind(unlock.learner_id)
        .bind(unlock.achievement_id)
        .bind(unlock.unlocked_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_unlocks(&self, learner_id: Uuid) -> PortResult<Vec<AchievementUnlock>> {
        let records = sqlx::query_as::<_, UnlockRecord>(
            "SELECT learner_id, achievement_id, unlocked_at \
             FROM achievement_unlocks WHERE learner_id = $1 ORDER BY unlocked_at DESC",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//=========================================================================================
// The Catalog Adapter
//=========================================================================================

/// A database adapter that implements the read-only `CatalogReader` port.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Creates a new `PgCatalog`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    course_id: Uuid,
    position: i32,
    kind: String,
    estimated_minutes: i32,
}
impl LessonRecord {
    fn to_domain(self) -> PortResult<Lesson> {
        let kind = LessonKind::parse(&self.kind).ok_or_else(|| {
            PortError::Unavailable(format!("lesson {} has unknown kind '{}'", self.id, self.kind))
        })?;
        Ok(Lesson {
            id: self.id,
            course_id: self.course_id,
            order: self.position as u32,
            kind,
            estimated_minutes: self.estimated_minutes as u32,
        })
    }
}

/// The JSONB shape of one quiz question in the `quizzes.questions` column.
#[derive(serde::Deserialize)]
struct QuestionRecord {
    prompt: String,
    options: Vec<String>,
    correct_option_index: usize,
}
impl QuestionRecord {
    fn to_domain(self) -> QuizQuestion {
        QuizQuestion {
            prompt: self.prompt,
            options: self.options,
            correct_option_index: self.correct_option_index,
        }
    }
}

/// The JSONB shape of the `achievements.rule` column.
#[derive(serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RuleRecord {
    CoursesCompleted { at_least: u32 },
    QuizScoreAtLeast { score: u8 },
    LessonsCompleted { at_least: u32 },
    StudyMinutes { at_least: u32 },
}
impl RuleRecord {
    fn to_domain(self) -> AchievementRule {
        match self {
            Self::CoursesCompleted { at_least } => AchievementRule::CoursesCompleted { at_least },
            Self::QuizScoreAtLeast { score } => AchievementRule::QuizScoreAtLeast { score },
            Self::LessonsCompleted { at_least } => AchievementRule::LessonsCompleted { at_least },
            Self::StudyMinutes { at_least } => AchievementRule::StudyMinutes { at_least },
        }
    }
}

#[async_trait]
impl CatalogReader for PgCatalog {
    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let title: Option<String> =
            sqlx::query_scalar("SELECT title FROM courses WHERE id = $1")
                .bind(course_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;
        let title = title.ok_or(PortError::CourseNotFound(course_id))?;

        let lesson_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM lessons WHERE course_id = $1 ORDER BY position ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let quiz_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM quizzes WHERE course_id = $1")
                .bind(course_id)
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;

        Ok(Course {
            id: course_id,
            title,
            lesson_ids,
            quiz_ids,
        })
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, course_id, position, kind, estimated_minutes \
             FROM lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or(PortError::LessonNotFound(lesson_id))?;
        record.to_domain()
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let row: Option<(Uuid, Option<Uuid>, serde_json::Value)> = sqlx::query_as(
            "SELECT course_id, lesson_id, questions FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        let (course_id, lesson_id, questions) =
            row.ok_or(PortError::QuizNotFound(quiz_id))?;

        let questions: Vec<QuestionRecord> =
            serde_json::from_value(questions).map_err(|e| {
                PortError::Unavailable(format!("quiz {} has malformed questions: {}", quiz_id, e))
            })?;

        Ok(Quiz {
            id: quiz_id,
            course_id,
            lesson_id,
            questions: questions.into_iter().map(|q| q.to_domain()).collect(),
        })
    }

    async fn list_achievements(&self) -> PortResult<Vec<Achievement>> {
        let rows: Vec<(Uuid, String, serde_json::Value, i32)> = sqlx::query_as(
            "SELECT id, name, rule, points FROM achievements ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut achievements = Vec::with_capacity(rows.len());
        for (id, name, rule, points) in rows {
            let rule: RuleRecord = serde_json::from_value(rule).map_err(|e| {
                PortError::Unavailable(format!("achievement {} has malformed rule: {}", id, e))
            })?;
            achievements.push(Achievement {
                id,
                name,
                rule: rule.to_domain(),
                points: points as u32,
            });
        }
        Ok(achievements)
    }
}
