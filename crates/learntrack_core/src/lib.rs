pub mod achievements;
pub mod aggregate;
pub mod domain;
pub mod engine;
pub mod enrollment;
pub mod grading;
pub mod memory;
pub mod ports;
pub mod progress;

pub use achievements::AchievementEvaluator;
pub use aggregate::CourseProgressAggregator;
pub use domain::{
    Achievement, AchievementRule, AchievementUnlock, Course, CourseProgress, CourseStanding,
    CourseSummary, Enrollment, EnrollmentWithCourse, GradeReport, LearnerFacts, Lesson, LessonKind,
    LessonProgress, Quiz, QuizAttempt, QuizQuestion, UnlockedAchievement,
};
pub use engine::{LessonProgressOutcome, ProgressEngine, QuizOutcome};
pub use enrollment::EnrollmentManager;
pub use grading::{GradingPolicy, QuizGrader};
pub use memory::{MemoryCatalog, MemoryStore};
pub use ports::{
    CatalogReader, LessonProgressMerge, LessonTotals, PortError, PortResult, ProgressStore,
};
pub use progress::{LessonTracker, ProgressUpdate};
