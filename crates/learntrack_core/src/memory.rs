//! crates/learntrack_core/src/memory.rs
//!
//! In-memory adapters for both ports, backed by std mutexes. They are the
//! reference implementation of the store contract and what the test suites
//! run against; the Postgres adapters live in the API service.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Achievement, AchievementUnlock, Course, CourseStanding, Enrollment, Lesson, LessonProgress,
    Quiz, QuizAttempt,
};
use crate::ports::{
    CatalogReader, LessonProgressMerge, LessonTotals, PortError, PortResult, ProgressStore,
};

//=========================================================================================
// MemoryStore
//=========================================================================================

#[derive(Default)]
struct StoreState {
    // keyed (learner_id, course_id)
    enrollments: HashMap<(Uuid, Uuid), Enrollment>,
    // keyed (learner_id, lesson_id)
    lesson_progress: HashMap<(Uuid, Uuid), LessonProgress>,
    attempts: Vec<QuizAttempt>,
    // keyed (learner_id, achievement_id)
    unlocks: HashMap<(Uuid, Uuid), AchievementUnlock>,
}

/// Mutex-guarded maps mirroring the four persisted record types. Every
/// operation takes the lock once, so each is atomic by construction.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> PortResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| PortError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> PortResult<()> {
        let mut state = self.locked()?;
        let key = (enrollment.learner_id, enrollment.course_id);
        if state.enrollments.contains_key(&key) {
            return Err(PortError::AlreadyEnrolled {
                learner_id: enrollment.learner_id,
                course_id: enrollment.course_id,
            });
        }
        state.enrollments.insert(key, enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let state = self.locked()?;
        Ok(state.enrollments.get(&(learner_id, course_id)).cloned())
    }

    async fn list_enrollments(&self, learner_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let state = self.locked()?;
        let mut rows: Vec<Enrollment> = state
            .enrollments
            .values()
            .filter(|enrollment| enrollment.learner_id == learner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(rows)
    }

    async fn touch_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.locked()?;
        if let Some(enrollment) = state.enrollments.get_mut(&(learner_id, course_id)) {
            enrollment.last_accessed_at = at;
        }
        Ok(())
    }

    async fn write_course_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        standing: CourseStanding,
    ) -> PortResult<()> {
        let mut state = self.locked()?;
        if let Some(enrollment) = state.enrollments.get_mut(&(learner_id, course_id)) {
            enrollment.progress = standing.progress;
            enrollment.completed = standing.completed;
        }
        Ok(())
    }

    async fn merge_lesson_progress(
        &self,
        merge: LessonProgressMerge,
    ) -> PortResult<LessonProgress> {
        let mut state = self.locked()?;
        let record = state
            .lesson_progress
            .entry((merge.learner_id, merge.lesson_id))
            .or_insert_with(|| LessonProgress {
                learner_id: merge.learner_id,
                lesson_id: merge.lesson_id,
                course_id: merge.course_id,
                completed: false,
                time_spent_minutes: 0,
                completed_at: None,
                updated_at: merge.at,
            });

        record.time_spent_minutes = record.time_spent_minutes.saturating_add(merge.add_minutes);
        if merge.mark_completed && !record.completed {
            record.completed = true;
            record.completed_at = Some(merge.at);
        }
        record.updated_at = merge.at;
        Ok(record.clone())
    }

    async fn list_lesson_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Vec<LessonProgress>> {
        let state = self.locked()?;
        let mut rows: Vec<LessonProgress> = state
            .lesson_progress
            .values()
            .filter(|record| record.learner_id == learner_id && record.course_id == course_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.updated_at
                .cmp(&b.updated_at)
                .then(a.lesson_id.cmp(&b.lesson_id))
        });
        Ok(rows)
    }

    async fn count_completed_lessons(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<u32> {
        let state = self.locked()?;
        let count = state
            .lesson_progress
            .values()
            .filter(|record| {
                record.learner_id == learner_id
                    && record.course_id == course_id
                    && record.completed
            })
            .count();
        Ok(count as u32)
    }

    async fn lesson_totals(&self, learner_id: Uuid) -> PortResult<LessonTotals> {
        let state = self.locked()?;
        let mut totals = LessonTotals::default();
        for record in state
            .lesson_progress
            .values()
            .filter(|record| record.learner_id == learner_id)
        {
            if record.completed {
                totals.lessons_completed += 1;
            }
            totals.minutes_spent = totals.minutes_spent.saturating_add(record.time_spent_minutes);
        }
        Ok(totals)
    }

    async fn insert_attempt(&self, attempt: &QuizAttempt) -> PortResult<()> {
        let mut state = self.locked()?;
        state.attempts.push(attempt.clone());
        Ok(())
    }

    async fn list_attempts(&self, learner_id: Uuid, quiz_id: Uuid) -> PortResult<Vec<QuizAttempt>> {
        let state = self.locked()?;
        let mut rows: Vec<QuizAttempt> = state
            .attempts
            .iter()
            .filter(|attempt| attempt.learner_id == learner_id && attempt.quiz_id == quiz_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn count_attempts(&self, learner_id: Uuid, quiz_id: Uuid) -> PortResult<u32> {
        let state = self.locked()?;
        let count = state
            .attempts
            .iter()
            .filter(|attempt| attempt.learner_id == learner_id && attempt.quiz_id == quiz_id)
            .count();
        Ok(count as u32)
    }

    async fn best_quiz_score(&self, learner_id: Uuid) -> PortResult<Option<u8>> {
        let state = self.locked()?;
        Ok(state
            .attempts
            .iter()
            .filter(|attempt| attempt.learner_id == learner_id)
            .map(|attempt| attempt.score)
            .max())
    }

    async fn insert_unlock_if_absent(&self, unlock: &AchievementUnlock) -> PortResult<bool> {
        let mut state = self.locked()?;
        let key = (unlock.learner_id, unlock.achievement_id);
        if state.unlocks.contains_key(&key) {
            return Ok(false);
        }
        state.unlocks.insert(key, unlock.clone());
        Ok(true)
    }

    async fn list_unlocks(&self, learner_id: Uuid) -> PortResult<Vec<AchievementUnlock>> {
        let state = self.locked()?;
        let mut rows: Vec<AchievementUnlock> = state
            .unlocks
            .values()
            .filter(|unlock| unlock.learner_id == learner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.unlocked_at.cmp(&a.unlocked_at));
        Ok(rows)
    }
}

//=========================================================================================
// MemoryCatalog
//=========================================================================================

#[derive(Default)]
struct CatalogState {
    courses: HashMap<Uuid, Course>,
    lessons: HashMap<Uuid, Lesson>,
    quizzes: HashMap<Uuid, Quiz>,
    achievements: HashMap<Uuid, Achievement>,
}

/// A catalog that is populated up front. Inserting a definition again
/// replaces it, which is how course edits are modelled.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> PortResult<MutexGuard<'_, CatalogState>> {
        self.state
            .lock()
            .map_err(|_| PortError::Unavailable("memory catalog lock poisoned".into()))
    }

    pub fn insert_course(&self, course: Course) {
        if let Ok(mut state) = self.state.lock() {
            state.courses.insert(course.id, course);
        }
    }

    pub fn insert_lesson(&self, lesson: Lesson) {
        if let Ok(mut state) = self.state.lock() {
            state.lessons.insert(lesson.id, lesson);
        }
    }

    pub fn insert_quiz(&self, quiz: Quiz) {
        if let Ok(mut state) = self.state.lock() {
            state.quizzes.insert(quiz.id, quiz);
        }
    }

    pub fn insert_achievement(&self, achievement: Achievement) {
        if let Ok(mut state) = self.state.lock() {
            state.achievements.insert(achievement.id, achievement);
        }
    }
}

#[async_trait]
impl CatalogReader for MemoryCatalog {
    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let state = self.locked()?;
        state
            .courses
            .get(&course_id)
            .cloned()
            .ok_or(PortError::CourseNotFound(course_id))
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let state = self.locked()?;
        state
            .lessons
            .get(&lesson_id)
            .cloned()
            .ok_or(PortError::LessonNotFound(lesson_id))
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let state = self.locked()?;
        state
            .quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or(PortError::QuizNotFound(quiz_id))
    }

    async fn list_achievements(&self) -> PortResult<Vec<Achievement>> {
        let state = self.locked()?;
        let mut definitions: Vec<Achievement> = state.achievements.values().cloned().collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(definitions)
    }
}
