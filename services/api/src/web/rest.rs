//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use learntrack_core::domain::{
    CourseProgress, CourseStanding, CourseSummary, Enrollment, EnrollmentWithCourse, GradeReport,
    LearnerFacts, LessonProgress, QuizAttempt, UnlockedAchievement,
};
use learntrack_core::{LessonProgressOutcome, ProgressUpdate, QuizOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        enroll_handler,
        list_enrollments_handler,
        update_lesson_progress_handler,
        course_progress_handler,
        submit_quiz_handler,
        list_quiz_attempts_handler,
        list_achievements_handler,
        learner_stats_handler,
    ),
    components(
        schemas(
            EnrollmentDto,
            CourseSummaryDto,
            EnrollmentWithCourseDto,
            UpdateProgressRequest,
            LessonProgressDto,
            CourseStandingDto,
            UnlockedAchievementDto,
            UpdateProgressResponse,
            CourseProgressResponse,
            SubmitQuizRequest,
            GradeReportDto,
            SubmitQuizResponse,
            QuizAttemptDto,
            LearnerStatsDto,
        )
    ),
    tags(
        (name = "LearnTrack API", description = "API endpoints for learner progress and assessment.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A learner's membership in one course, including the derived progress.
#[derive(Serialize, ToSchema)]
pub struct EnrollmentDto {
    pub course_id: Uuid,
    pub progress: u8,
    pub completed: bool,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentDto {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            course_id: enrollment.course_id,
            progress: enrollment.progress,
            completed: enrollment.completed,
            enrolled_at: enrollment.enrolled_at,
            last_accessed_at: enrollment.last_accessed_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CourseSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub lesson_count: u32,
}

impl From<CourseSummary> for CourseSummaryDto {
    fn from(summary: CourseSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            lesson_count: summary.lesson_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EnrollmentWithCourseDto {
    pub enrollment: EnrollmentDto,
    pub course: CourseSummaryDto,
}

impl From<EnrollmentWithCourse> for EnrollmentWithCourseDto {
    fn from(entry: EnrollmentWithCourse) -> Self {
        Self {
            enrollment: entry.enrollment.into(),
            course: entry.course.into(),
        }
    }
}

/// The payload for a lesson progress update. Both fields default so a client
/// can report completion, minutes, or both.
#[derive(Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub time_spent_minutes: u32,
}

#[derive(Serialize, ToSchema)]
pub struct LessonProgressDto {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub completed: bool,
    pub time_spent_minutes: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<LessonProgress> for LessonProgressDto {
    fn from(record: LessonProgress) -> Self {
        Self {
            lesson_id: record.lesson_id,
            course_id: record.course_id,
            completed: record.completed,
            time_spent_minutes: record.time_spent_minutes,
            completed_at: record.completed_at,
            updated_at: record.updated_at,
        }
    }
}

/// The derived standing in one course after an update.
#[derive(Serialize, ToSchema)]
pub struct CourseStandingDto {
    pub progress: u8,
    pub completed: bool,
}

impl From<CourseStanding> for CourseStandingDto {
    fn from(standing: CourseStanding) -> Self {
        Self {
            progress: standing.progress,
            completed: standing.completed,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UnlockedAchievementDto {
    pub id: Uuid,
    pub name: String,
    pub points: u32,
    pub unlocked_at: DateTime<Utc>,
}

impl From<UnlockedAchievement> for UnlockedAchievementDto {
    fn from(unlocked: UnlockedAchievement) -> Self {
        Self {
            id: unlocked.achievement.id,
            name: unlocked.achievement.name,
            points: unlocked.achievement.points,
            unlocked_at: unlocked.unlocked_at,
        }
    }
}

/// The response payload sent after a lesson progress update.
#[derive(Serialize, ToSchema)]
pub struct UpdateProgressResponse {
    pub lesson: LessonProgressDto,
    pub course: CourseStandingDto,
    pub unlocked_achievements: Vec<UnlockedAchievementDto>,
}

impl From<LessonProgressOutcome> for UpdateProgressResponse {
    fn from(outcome: LessonProgressOutcome) -> Self {
        Self {
            lesson: outcome.record.into(),
            course: outcome.course.into(),
            unlocked_achievements: outcome.unlocked.into_iter().map(Into::into).collect(),
        }
    }
}

/// A learner's standing in one course plus every lesson they have touched.
#[derive(Serialize, ToSchema)]
pub struct CourseProgressResponse {
    pub enrollment: EnrollmentDto,
    pub lessons: Vec<LessonProgressDto>,
}

impl From<CourseProgress> for CourseProgressResponse {
    fn from(progress: CourseProgress) -> Self {
        Self {
            enrollment: progress.enrollment.into(),
            lessons: progress.lessons.into_iter().map(Into::into).collect(),
        }
    }
}

/// The payload for a quiz submission: one selected option index per question,
/// in question order.
#[derive(Deserialize, ToSchema)]
pub struct SubmitQuizRequest {
    pub answers: Vec<u32>,
    #[serde(default)]
    pub time_spent_minutes: u32,
}

#[derive(Serialize, ToSchema)]
pub struct GradeReportDto {
    pub attempt_id: Uuid,
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
}

impl From<GradeReport> for GradeReportDto {
    fn from(grade: GradeReport) -> Self {
        Self {
            attempt_id: grade.attempt_id,
            score: grade.score,
            correct_count: grade.correct_count,
            total_questions: grade.total_questions,
        }
    }
}

/// The response payload sent after grading a quiz submission.
#[derive(Serialize, ToSchema)]
pub struct SubmitQuizResponse {
    pub grade: GradeReportDto,
    pub unlocked_achievements: Vec<UnlockedAchievementDto>,
}

impl From<QuizOutcome> for SubmitQuizResponse {
    fn from(outcome: QuizOutcome) -> Self {
        Self {
            grade: outcome.grade.into(),
            unlocked_achievements: outcome.unlocked.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizAttemptDto {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub answers: Vec<u32>,
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_spent_minutes: u32,
    pub submitted_at: DateTime<Utc>,
}

impl From<QuizAttempt> for QuizAttemptDto {
    fn from(attempt: QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            answers: attempt.answers,
            score: attempt.score,
            correct_count: attempt.correct_count,
            total_questions: attempt.total_questions,
            time_spent_minutes: attempt.time_spent_minutes,
            submitted_at: attempt.submitted_at,
        }
    }
}

/// Aggregate learner counters: the facts achievement rules run against plus
/// the points total across unlocked achievements.
#[derive(Serialize, ToSchema)]
pub struct LearnerStatsDto {
    pub courses_completed: u32,
    pub lessons_completed: u32,
    pub minutes_spent: u32,
    pub best_quiz_score: Option<u8>,
    pub achievement_points: u32,
}

impl LearnerStatsDto {
    fn new(facts: LearnerFacts, achievement_points: u32) -> Self {
        Self {
            courses_completed: facts.courses_completed,
            lessons_completed: facts.lessons_completed,
            minutes_spent: facts.minutes_spent,
            best_quiz_score: facts.best_quiz_score,
            achievement_points,
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Enroll the calling learner in a course.
#[utoipa::path(
    post,
    path = "/courses/{course_id}/enroll",
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentDto),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled in this course"),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("course_id" = Uuid, Path, description = "The course to enroll in."),
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn enroll_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let enrollment = app_state.engine.enroll(learner_id, course_id).await?;
    Ok((StatusCode::CREATED, Json(EnrollmentDto::from(enrollment))))
}

/// List the calling learner's enrollments, newest first.
#[utoipa::path(
    get,
    path = "/enrollments",
    responses(
        (status = 200, description = "The learner's enrollments", body = [EnrollmentWithCourseDto]),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn list_enrollments_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let enrollments = app_state.engine.enrollments_for(learner_id).await?;
    let body: Vec<EnrollmentWithCourseDto> =
        enrollments.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Record a progress update against one lesson.
///
/// Completion is monotonic and reported minutes accumulate; the response
/// carries the recomputed course standing and any achievements the update
/// unlocked.
#[utoipa::path(
    post,
    path = "/lessons/{lesson_id}/progress",
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = UpdateProgressResponse),
        (status = 403, description = "Not enrolled in the lesson's course"),
        (status = 404, description = "Lesson not found"),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("lesson_id" = Uuid, Path, description = "The lesson being updated."),
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn update_lesson_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
    Path(lesson_id): Path<Uuid>,
    Json(payload): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .engine
        .record_lesson_progress(
            learner_id,
            lesson_id,
            ProgressUpdate {
                completed: payload.completed,
                time_spent_minutes: payload.time_spent_minutes,
            },
        )
        .await?;
    Ok(Json(UpdateProgressResponse::from(outcome)))
}

/// Fetch the calling learner's progress in one course.
#[utoipa::path(
    get,
    path = "/courses/{course_id}/progress",
    responses(
        (status = 200, description = "Per-lesson progress for the course", body = CourseProgressResponse),
        (status = 403, description = "Not enrolled in this course"),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("course_id" = Uuid, Path, description = "The course to inspect."),
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn course_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = app_state
        .engine
        .course_progress(learner_id, course_id)
        .await?;
    Ok(Json(CourseProgressResponse::from(progress)))
}

/// Submit answers for a quiz and receive the graded result.
#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/attempts",
    request_body = SubmitQuizRequest,
    responses(
        (status = 201, description = "Attempt graded and recorded", body = SubmitQuizResponse),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "Attempt limit reached"),
        (status = 422, description = "Answer count does not match the question count"),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz being attempted."),
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn submit_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .engine
        .submit_quiz_attempt(
            learner_id,
            quiz_id,
            &payload.answers,
            payload.time_spent_minutes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(SubmitQuizResponse::from(outcome))))
}

/// List the calling learner's attempts at one quiz, newest first.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}/attempts",
    responses(
        (status = 200, description = "The learner's attempts", body = [QuizAttemptDto]),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz to inspect."),
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn list_quiz_attempts_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let attempts = app_state.engine.quiz_attempts(learner_id, quiz_id).await?;
    let body: Vec<QuizAttemptDto> = attempts.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// List the achievements the calling learner has unlocked, newest first.
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Unlocked achievements", body = [UnlockedAchievementDto]),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn list_achievements_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let unlocked = app_state.engine.achievements_for(learner_id).await?;
    let body: Vec<UnlockedAchievementDto> = unlocked.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Fetch the calling learner's aggregate study statistics.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Aggregate learner counters", body = LearnerStatsDto),
        (status = 401, description = "Missing or invalid learner identity")
    ),
    params(
        ("x-learner-id" = Uuid, Header, description = "The unique ID of the learner.")
    )
)]
pub async fn learner_stats_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(learner_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let facts = app_state.engine.learner_stats(learner_id).await?;
    let unlocked = app_state.engine.achievements_for(learner_id).await?;
    let achievement_points = unlocked
        .iter()
        .map(|unlock| unlock.achievement.points)
        .sum();
    Ok(Json(LearnerStatsDto::new(facts, achievement_points)))
}
