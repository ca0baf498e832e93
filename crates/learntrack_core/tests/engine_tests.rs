//! Integration tests driving the full engine through the in-memory adapters.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use learntrack_core::{
    Achievement, AchievementRule, CatalogReader, Course, GradingPolicy, Lesson, LessonKind,
    MemoryCatalog, MemoryStore, PortError, PortResult, ProgressEngine, ProgressUpdate, Quiz,
    QuizQuestion,
};
use pretty_assertions::assert_eq;
use uuid::Uuid;

struct Harness {
    catalog: Arc<MemoryCatalog>,
    engine: ProgressEngine,
}

impl Harness {
    fn new() -> Self {
        Self::with_policy(GradingPolicy::default())
    }

    fn with_policy(policy: GradingPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let engine = ProgressEngine::with_policy(store, catalog.clone(), policy);
        Self { catalog, engine }
    }

    /// Seeds a course with `lesson_count` lessons and returns (course, lessons).
    fn seed_course(&self, lesson_count: usize) -> (Uuid, Vec<Uuid>) {
        let course_id = Uuid::new_v4();
        let lesson_ids: Vec<Uuid> = (0..lesson_count).map(|_| Uuid::new_v4()).collect();
        for (index, &lesson_id) in lesson_ids.iter().enumerate() {
            self.catalog.insert_lesson(Lesson {
                id: lesson_id,
                course_id,
                order: index as u32,
                kind: LessonKind::Video,
                estimated_minutes: 10,
            });
        }
        self.catalog.insert_course(Course {
            id: course_id,
            title: "Intro to Gardening".into(),
            lesson_ids: lesson_ids.clone(),
            quiz_ids: Vec::new(),
        });
        (course_id, lesson_ids)
    }

    /// Seeds a quiz whose answer key is `key` (correct option per question).
    fn seed_quiz(&self, course_id: Uuid, lesson_id: Option<Uuid>, key: &[usize]) -> Uuid {
        let quiz_id = Uuid::new_v4();
        self.catalog.insert_quiz(Quiz {
            id: quiz_id,
            course_id,
            lesson_id,
            questions: key
                .iter()
                .map(|&correct_option_index| QuizQuestion {
                    prompt: "pick one".into(),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_option_index,
                })
                .collect(),
        });
        quiz_id
    }

    fn seed_achievement(&self, name: &str, rule: AchievementRule) -> Uuid {
        let achievement_id = Uuid::new_v4();
        self.catalog.insert_achievement(Achievement {
            id: achievement_id,
            name: name.into(),
            rule,
            points: 10,
        });
        achievement_id
    }
}

fn completed() -> ProgressUpdate {
    ProgressUpdate {
        completed: true,
        time_spent_minutes: 0,
    }
}

fn minutes(time_spent_minutes: u32) -> ProgressUpdate {
    ProgressUpdate {
        completed: false,
        time_spent_minutes,
    }
}

/// Counts quiz reads on their way through to the real catalog.
struct CountingCatalog {
    inner: Arc<MemoryCatalog>,
    quiz_reads: AtomicUsize,
}

#[async_trait]
impl CatalogReader for CountingCatalog {
    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        self.inner.get_course(course_id).await
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        self.inner.get_lesson(lesson_id).await
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        self.quiz_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_quiz(quiz_id).await
    }

    async fn list_achievements(&self) -> PortResult<Vec<Achievement>> {
        self.inner.list_achievements().await
    }
}

//=========================================================================================
// Enrollment
//=========================================================================================

#[tokio::test]
async fn enrollment_starts_with_zero_progress() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(3);
    let learner_id = Uuid::new_v4();

    let enrollment = h.engine.enroll(learner_id, course_id).await.unwrap();
    assert_eq!(enrollment.progress, 0);
    assert!(!enrollment.completed);

    let listed = h.engine.enrollments_for(learner_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].course.id, course_id);
    assert_eq!(listed[0].course.lesson_count, 3);
}

#[tokio::test]
async fn duplicate_enrollment_is_rejected() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(1);
    let learner_id = Uuid::new_v4();

    let original = h.engine.enroll(learner_id, course_id).await.unwrap();
    let err = h.engine.enroll(learner_id, course_id).await.unwrap_err();
    assert!(matches!(err, PortError::AlreadyEnrolled { .. }));
    assert_eq!(err.kind(), "already_enrolled");

    // The original enrollment survives the failed duplicate.
    let listed = h.engine.enrollments_for(learner_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].enrollment.enrolled_at, original.enrolled_at);
}

#[tokio::test]
async fn enrolling_in_an_unknown_course_fails() {
    let h = Harness::new();
    let err = h
        .engine
        .enroll(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::CourseNotFound(_)));
}

#[tokio::test]
async fn lesson_updates_bump_last_accessed() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let learner_id = Uuid::new_v4();

    let enrollment = h.engine.enroll(learner_id, course_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    h.engine
        .record_lesson_progress(learner_id, lesson_ids[0], minutes(1))
        .await
        .unwrap();

    let listed = h.engine.enrollments_for(learner_id).await.unwrap();
    assert!(listed[0].enrollment.last_accessed_at > enrollment.last_accessed_at);
}

//=========================================================================================
// Lesson progress
//=========================================================================================

#[tokio::test]
async fn progress_updates_require_enrollment() {
    let h = Harness::new();
    let (_, lesson_ids) = h.seed_course(1);

    let err = h
        .engine
        .record_lesson_progress(Uuid::new_v4(), lesson_ids[0], completed())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotEnrolled { .. }));
}

#[tokio::test]
async fn updating_an_unknown_lesson_fails() {
    let h = Harness::new();
    let err = h
        .engine
        .record_lesson_progress(Uuid::new_v4(), Uuid::new_v4(), completed())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::LessonNotFound(_)));
}

#[tokio::test]
async fn completion_never_reverts() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    let done = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    assert!(done.record.completed);

    // A later completed=false update must not undo the completion.
    let after = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], minutes(2))
        .await
        .unwrap();
    assert!(after.record.completed);
    assert_eq!(after.record.completed_at, done.record.completed_at);
    assert_eq!(after.course.progress, 100);
}

#[tokio::test]
async fn completed_at_is_stamped_only_once() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    let first = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();

    assert!(first.record.completed_at.is_some());
    assert_eq!(second.record.completed_at, first.record.completed_at);
}

#[tokio::test]
async fn time_spent_accumulates() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    h.engine
        .record_lesson_progress(learner_id, lesson_ids[0], minutes(5))
        .await
        .unwrap();
    let after = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], minutes(3))
        .await
        .unwrap();
    assert_eq!(after.record.time_spent_minutes, 8);
    assert!(!after.record.completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_updates_to_one_lesson_keep_every_minute() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    // 25 racing merges of 4 minutes each against the same row.
    let mut handles = Vec::new();
    for _ in 0..25 {
        let engine = h.engine.clone();
        let lesson_id = lesson_ids[0];
        handles.push(tokio::spawn(async move {
            engine
                .record_lesson_progress(learner_id, lesson_id, minutes(4))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let progress = h
        .engine
        .course_progress(learner_id, course_id)
        .await
        .unwrap();
    assert_eq!(progress.lessons.len(), 1);
    assert_eq!(progress.lessons[0].time_spent_minutes, 100);

    let stats = h.engine.learner_stats(learner_id).await.unwrap();
    assert_eq!(stats.minutes_spent, 100);
}

#[tokio::test]
async fn course_progress_lists_only_touched_lessons() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(3);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    let untouched = h
        .engine
        .course_progress(learner_id, course_id)
        .await
        .unwrap();
    assert!(untouched.lessons.is_empty());

    h.engine
        .record_lesson_progress(learner_id, lesson_ids[1], minutes(4))
        .await
        .unwrap();
    let touched = h
        .engine
        .course_progress(learner_id, course_id)
        .await
        .unwrap();
    assert_eq!(touched.lessons.len(), 1);
    assert_eq!(touched.lessons[0].lesson_id, lesson_ids[1]);

    let err = h
        .engine
        .course_progress(Uuid::new_v4(), course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotEnrolled { .. }));
}

//=========================================================================================
// Aggregation
//=========================================================================================

#[tokio::test]
async fn percentage_tracks_completed_lesson_count() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(4);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    // Minutes alone move nothing.
    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], minutes(10))
        .await
        .unwrap();
    assert_eq!(outcome.course.progress, 0);

    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    assert_eq!(outcome.course.progress, 25);

    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[1], completed())
        .await
        .unwrap();
    assert_eq!(outcome.course.progress, 50);
    assert!(!outcome.course.completed);
}

#[tokio::test]
async fn an_empty_course_reports_zero_without_error() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(0);
    let learner_id = Uuid::new_v4();

    h.engine.enroll(learner_id, course_id).await.unwrap();
    let progress = h
        .engine
        .course_progress(learner_id, course_id)
        .await
        .unwrap();
    assert_eq!(progress.enrollment.progress, 0);
    assert!(progress.lessons.is_empty());
}

#[tokio::test]
async fn finishing_every_lesson_completes_the_course() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(2);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    h.engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[1], completed())
        .await
        .unwrap();

    assert_eq!(outcome.course.progress, 100);
    assert!(outcome.course.completed);

    let listed = h.engine.enrollments_for(learner_id).await.unwrap();
    assert_eq!(listed[0].enrollment.progress, 100);
    assert!(listed[0].enrollment.completed);
}

#[tokio::test]
async fn percentage_recomputes_against_the_current_catalog() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(4);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    h.engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[1], completed())
        .await
        .unwrap();
    assert_eq!(outcome.course.progress, 50);

    // Course editing shrinks the lesson list to three; the next update
    // recomputes against what the catalog says now. floor(2 * 100 / 3) = 66.
    h.catalog.insert_course(Course {
        id: course_id,
        title: "Intro to Gardening".into(),
        lesson_ids: lesson_ids[..3].to_vec(),
        quiz_ids: Vec::new(),
    });
    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[2], minutes(1))
        .await
        .unwrap();
    assert_eq!(outcome.course.progress, 66);
}

//=========================================================================================
// Quiz grading
//=========================================================================================

#[tokio::test]
async fn quiz_grading_compares_positionally() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(1);
    let quiz_id = h.seed_quiz(course_id, None, &[0, 1, 2, 0]);
    let learner_id = Uuid::new_v4();

    let outcome = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0, 1, 2, 3], 7)
        .await
        .unwrap();
    assert_eq!(outcome.grade.correct_count, 3);
    assert_eq!(outcome.grade.total_questions, 4);
    assert_eq!(outcome.grade.score, 75);

    let attempts = h.engine.quiz_attempts(learner_id, quiz_id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].answers, vec![0, 1, 2, 3]);
    assert_eq!(attempts[0].time_spent_minutes, 7);
}

#[tokio::test]
async fn malformed_submissions_are_rejected_without_persisting() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(1);
    let quiz_id = h.seed_quiz(course_id, None, &[0, 1, 2, 0]);
    let learner_id = Uuid::new_v4();

    let err = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0, 1], 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PortError::MalformedSubmission {
            submitted: 2,
            expected: 4
        }
    ));
    assert!(h
        .engine
        .quiz_attempts(learner_id, quiz_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn submitting_an_unknown_quiz_fails() {
    let h = Harness::new();
    let err = h
        .engine
        .submit_quiz_attempt(Uuid::new_v4(), Uuid::new_v4(), &[0], 0)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::QuizNotFound(_)));
}

#[tokio::test]
async fn resubmissions_append_new_attempts() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(1);
    let quiz_id = h.seed_quiz(course_id, None, &[1, 1]);
    let learner_id = Uuid::new_v4();

    let first = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0, 0], 3)
        .await
        .unwrap();
    let second = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[1, 1], 4)
        .await
        .unwrap();
    assert_eq!(first.grade.score, 0);
    assert_eq!(second.grade.score, 100);
    assert_ne!(first.grade.attempt_id, second.grade.attempt_id);

    let attempts = h.engine.quiz_attempts(learner_id, quiz_id).await.unwrap();
    assert_eq!(attempts.len(), 2);

    let stats = h.engine.learner_stats(learner_id).await.unwrap();
    assert_eq!(stats.best_quiz_score, Some(100));
}

#[tokio::test]
async fn attempt_limit_blocks_further_submissions() {
    let h = Harness::with_policy(GradingPolicy {
        max_attempts: Some(2),
    });
    let (course_id, _) = h.seed_course(1);
    let quiz_id = h.seed_quiz(course_id, None, &[0]);
    let learner_id = Uuid::new_v4();

    h.engine
        .submit_quiz_attempt(learner_id, quiz_id, &[1], 0)
        .await
        .unwrap();
    h.engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0], 0)
        .await
        .unwrap();

    let err = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0], 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PortError::AttemptLimitReached { max_attempts: 2, .. }
    ));
    assert_eq!(
        h.engine
            .quiz_attempts(learner_id, quiz_id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn grading_stands_alone_without_an_enrollment() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let quiz_id = h.seed_quiz(course_id, Some(lesson_ids[0]), &[2, 2]);
    let learner_id = Uuid::new_v4();

    // Not enrolled: the grade is still produced and recorded, but no lesson
    // progress appears as a side effect.
    let outcome = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[2, 0], 5)
        .await
        .unwrap();
    assert_eq!(outcome.grade.score, 50);

    let stats = h.engine.learner_stats(learner_id).await.unwrap();
    assert_eq!(stats.lessons_completed, 0);
}

#[tokio::test]
async fn a_lesson_quiz_completes_its_lesson_for_enrolled_learners() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(2);
    let quiz_id = h.seed_quiz(course_id, Some(lesson_ids[0]), &[3]);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    h.engine
        .submit_quiz_attempt(learner_id, quiz_id, &[3], 6)
        .await
        .unwrap();

    let progress = h
        .engine
        .course_progress(learner_id, course_id)
        .await
        .unwrap();
    assert_eq!(progress.enrollment.progress, 50);
    let record = progress
        .lessons
        .iter()
        .find(|record| record.lesson_id == lesson_ids[0])
        .unwrap();
    assert!(record.completed);
}

#[tokio::test]
async fn a_submission_reads_its_quiz_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let counting = Arc::new(CountingCatalog {
        inner: catalog.clone(),
        quiz_reads: AtomicUsize::new(0),
    });
    let engine = ProgressEngine::new(store, counting.clone());

    let course_id = Uuid::new_v4();
    let lesson_id = Uuid::new_v4();
    let quiz_id = Uuid::new_v4();
    catalog.insert_lesson(Lesson {
        id: lesson_id,
        course_id,
        order: 0,
        kind: LessonKind::Video,
        estimated_minutes: 10,
    });
    catalog.insert_course(Course {
        id: course_id,
        title: "Intro to Gardening".into(),
        lesson_ids: vec![lesson_id],
        quiz_ids: vec![quiz_id],
    });
    catalog.insert_quiz(Quiz {
        id: quiz_id,
        course_id,
        lesson_id: Some(lesson_id),
        questions: vec![QuizQuestion {
            prompt: "pick one".into(),
            options: vec!["a".into(), "b".into()],
            correct_option_index: 0,
        }],
    });

    let learner_id = Uuid::new_v4();
    engine.enroll(learner_id, course_id).await.unwrap();
    engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0], 2)
        .await
        .unwrap();

    // The grade and the lesson wiring both come from that single read.
    assert_eq!(counting.quiz_reads.load(Ordering::SeqCst), 1);
    let progress = engine.course_progress(learner_id, course_id).await.unwrap();
    assert!(progress.lessons[0].completed);
}

//=========================================================================================
// Achievements
//=========================================================================================

#[tokio::test]
async fn achievements_unlock_exactly_once() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(2);
    let achievement_id =
        h.seed_achievement("First Steps", AchievementRule::LessonsCompleted { at_least: 1 });
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);
    assert_eq!(outcome.unlocked[0].achievement.id, achievement_id);

    // Re-satisfying the rule does not re-unlock.
    let again = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    assert!(again.unlocked.is_empty());
    assert!(h
        .engine
        .evaluate_achievements(learner_id)
        .await
        .unwrap()
        .is_empty());

    let held = h.engine.achievements_for(learner_id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].achievement.name, "First Steps");
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_evaluations_resolve_to_a_single_unlock() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(1);
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();
    h.engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();

    // Defined only now, so the rule is already satisfied when the racing
    // evaluations all see it for the first time.
    h.seed_achievement("First Steps", AchievementRule::LessonsCompleted { at_least: 1 });

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.evaluate_achievements(learner_id).await
        }));
    }
    let mut newly_unlocked = 0;
    for handle in handles {
        newly_unlocked += handle.await.unwrap().unwrap().len();
    }
    assert_eq!(newly_unlocked, 1);

    let held = h.engine.achievements_for(learner_id).await.unwrap();
    assert_eq!(held.len(), 1);
}

#[tokio::test]
async fn quiz_score_rules_use_the_best_attempt() {
    let h = Harness::new();
    let (course_id, _) = h.seed_course(1);
    let quiz_id = h.seed_quiz(course_id, None, &[0, 0, 0, 0]);
    h.seed_achievement("Sharp Shooter", AchievementRule::QuizScoreAtLeast { score: 80 });
    let learner_id = Uuid::new_v4();

    let below = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0, 0, 0, 1], 0)
        .await
        .unwrap();
    assert_eq!(below.grade.score, 75);
    assert!(below.unlocked.is_empty());

    let above = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &[0, 0, 0, 0], 0)
        .await
        .unwrap();
    assert_eq!(above.grade.score, 100);
    assert_eq!(above.unlocked.len(), 1);
    assert_eq!(above.unlocked[0].achievement.name, "Sharp Shooter");
}

#[tokio::test]
async fn study_time_rules_track_accumulated_minutes() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(2);
    h.seed_achievement("Half Hour", AchievementRule::StudyMinutes { at_least: 30 });
    let learner_id = Uuid::new_v4();
    h.engine.enroll(learner_id, course_id).await.unwrap();

    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], minutes(20))
        .await
        .unwrap();
    assert!(outcome.unlocked.is_empty());

    // Minutes from a different lesson count toward the same total.
    let outcome = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[1], minutes(10))
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);
    assert_eq!(outcome.unlocked[0].achievement.name, "Half Hour");
}

//=========================================================================================
// End to end
//=========================================================================================

#[tokio::test]
async fn completing_a_course_end_to_end() {
    let h = Harness::new();
    let (course_id, lesson_ids) = h.seed_course(2);
    let quiz_id = h.seed_quiz(course_id, None, &[0; 10]);
    h.seed_achievement(
        "Course Conqueror",
        AchievementRule::CoursesCompleted { at_least: 1 },
    );
    let learner_id = Uuid::new_v4();

    h.engine.enroll(learner_id, course_id).await.unwrap();

    let first = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[0], completed())
        .await
        .unwrap();
    assert_eq!(first.course.progress, 50);
    assert!(first.unlocked.is_empty());

    let second = h
        .engine
        .record_lesson_progress(learner_id, lesson_ids[1], completed())
        .await
        .unwrap();
    assert_eq!(second.course.progress, 100);
    assert!(second.course.completed);
    assert_eq!(second.unlocked.len(), 1);
    assert_eq!(second.unlocked[0].achievement.name, "Course Conqueror");

    // Nine of ten on the course final.
    let mut answers = vec![0u32; 10];
    answers[9] = 1;
    let quiz = h
        .engine
        .submit_quiz_attempt(learner_id, quiz_id, &answers, 12)
        .await
        .unwrap();
    assert_eq!(quiz.grade.score, 90);
    assert!(quiz.unlocked.is_empty());

    let held = h.engine.achievements_for(learner_id).await.unwrap();
    assert_eq!(held.len(), 1);

    let stats = h.engine.learner_stats(learner_id).await.unwrap();
    assert_eq!(stats.courses_completed, 1);
    assert_eq!(stats.lessons_completed, 2);
    assert_eq!(stats.best_quiz_score, Some(90));
}
