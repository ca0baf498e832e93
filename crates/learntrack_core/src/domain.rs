//! crates/learntrack_core/src/domain.rs
//!
//! Defines the pure, core data structures for the progress engine.
//! These structs are independent of any database or serialization format:
//! catalog definitions are read-only input, the four record types are the
//! mutable state, and the remaining structs are derived values handed back
//! to callers.

use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Catalog definitions (read-only input, owned by course-authoring)
//=========================================================================================

/// The delivery format of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonKind {
    Video,
    Text,
    Audio,
    Quiz,
}

impl LessonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Quiz => "quiz",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            "audio" => Some(Self::Audio),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

/// A course definition: an ordered set of lessons plus any attached quizzes.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    /// Lesson ids in course order.
    pub lesson_ids: Vec<Uuid>,
    /// Per-lesson and course-final quizzes.
    pub quiz_ids: Vec<Uuid>,
}

impl Course {
    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            id: self.id,
            title: self.title.clone(),
            lesson_count: self.lesson_ids.len() as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    /// Position within the course. Unique and totally ordered per course;
    /// contiguity is not required.
    pub order: u32,
    pub kind: LessonKind,
    pub estimated_minutes: u32,
}

/// One quiz question: option texts plus the index of the correct option.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    /// Set when the quiz belongs to a single lesson; `None` for a
    /// course-final quiz.
    pub lesson_id: Option<Uuid>,
    pub questions: Vec<QuizQuestion>,
}

/// An achievement definition: a rule threshold worth some points.
#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub rule: AchievementRule,
    pub points: u32,
}

/// The predicate an achievement unlocks on, evaluated against
/// [`LearnerFacts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementRule {
    CoursesCompleted { at_least: u32 },
    QuizScoreAtLeast { score: u8 },
    LessonsCompleted { at_least: u32 },
    StudyMinutes { at_least: u32 },
}

impl AchievementRule {
    pub fn is_satisfied(&self, facts: &LearnerFacts) -> bool {
        match *self {
            Self::CoursesCompleted { at_least } => facts.courses_completed >= at_least,
            Self::QuizScoreAtLeast { score } => {
                facts.best_quiz_score.is_some_and(|best| best >= score)
            }
            Self::LessonsCompleted { at_least } => facts.lessons_completed >= at_least,
            Self::StudyMinutes { at_least } => facts.minutes_spent >= at_least,
        }
    }
}

/// The aggregate inputs achievement rules are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearnerFacts {
    pub courses_completed: u32,
    pub lessons_completed: u32,
    pub minutes_spent: u32,
    pub best_quiz_score: Option<u8>,
}

//=========================================================================================
// Mutable records (the four persisted tables)
//=========================================================================================

/// A learner's membership in a course; the root of all progress data.
///
/// `progress` and `completed` are a derived cache written back by the
/// aggregator after every lesson update. The LessonProgress rows stay the
/// source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub learner_id: Uuid,
    pub course_id: Uuid,
    /// Cached course percentage, 0-100.
    pub progress: u8,
    pub completed: bool,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

/// Per-learner, per-lesson completion and time state.
///
/// `completed` is monotonic: once true it never goes back to false.
/// `completed_at` is stamped on the first transition and immutable after.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonProgress {
    pub learner_id: Uuid,
    pub lesson_id: Uuid,
    /// Denormalized from the lesson so aggregation never joins the catalog.
    pub course_id: Uuid,
    pub completed: bool,
    pub time_spent_minutes: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// One graded submission. Append-only; never edited once written.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub quiz_id: Uuid,
    /// Selected option index per question, in question order.
    pub answers: Vec<u32>,
    /// 0-100, rounded.
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_spent_minutes: u32,
    pub submitted_at: DateTime<Utc>,
}

/// A learner's unlock of one achievement. Never revoked.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementUnlock {
    pub learner_id: Uuid,
    pub achievement_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
}

//=========================================================================================
// Derived values returned to callers
//=========================================================================================

/// The slice of a course embedded in enrollment listings.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub lesson_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentWithCourse {
    pub enrollment: Enrollment,
    pub course: CourseSummary,
}

/// The aggregator's output: what the enrollment's cache is set to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseStanding {
    pub progress: u8,
    pub completed: bool,
}

/// A learner's standing in one course plus the per-lesson detail rows.
/// Lessons never touched have no row; callers combine this with the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseProgress {
    pub enrollment: Enrollment,
    pub lessons: Vec<LessonProgress>,
}

/// What the grading engine hands back after scoring a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeReport {
    pub attempt_id: Uuid,
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
}

/// An unlock joined with its definition, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub unlocked_at: DateTime<Utc>,
}
