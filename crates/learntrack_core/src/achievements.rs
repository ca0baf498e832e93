//! crates/learntrack_core/src/achievements.rs
//!
//! The Achievement Evaluator: recomputes a learner's aggregate facts from the
//! store and unlocks any achievement whose rule they now satisfy. Evaluation
//! is rule-driven off the catalog, so adding a new achievement is a catalog
//! change, not a code change.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{AchievementUnlock, LearnerFacts, UnlockedAchievement};
use crate::ports::{CatalogReader, PortResult, ProgressStore};

#[derive(Clone)]
pub struct AchievementEvaluator {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn CatalogReader>,
}

impl AchievementEvaluator {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self { store, catalog }
    }

    /// Checks every rule against the learner's current facts and unlocks
    /// whatever newly qualifies.
    ///
    /// Returns only the unlocks created by this call. An unlock is written
    /// at most once per (learner, achievement); re-evaluating a learner who
    /// already holds everything they qualify for returns an empty list.
    pub async fn evaluate(&self, learner_id: Uuid) -> PortResult<Vec<UnlockedAchievement>> {
        let facts = self.learner_facts(learner_id).await?;
        let definitions = self.catalog.list_achievements().await?;

        let mut unlocked = Vec::new();
        for achievement in definitions {
            if !achievement.rule.is_satisfied(&facts) {
                continue;
            }
            let unlock = AchievementUnlock {
                learner_id,
                achievement_id: achievement.id,
                unlocked_at: Utc::now(),
            };
            if self.store.insert_unlock_if_absent(&unlock).await? {
                info!(
                    %learner_id,
                    achievement_id = %achievement.id,
                    name = %achievement.name,
                    "achievement unlocked"
                );
                unlocked.push(UnlockedAchievement {
                    achievement,
                    unlocked_at: unlock.unlocked_at,
                });
            }
        }
        Ok(unlocked)
    }

    /// Everything the learner holds, joined against the catalog definitions.
    /// Unlocks whose definition has since left the catalog are omitted.
    pub async fn unlocked_for(&self, learner_id: Uuid) -> PortResult<Vec<UnlockedAchievement>> {
        let unlocks = self.store.list_unlocks(learner_id).await?;
        let definitions = self.catalog.list_achievements().await?;

        let mut held = Vec::with_capacity(unlocks.len());
        for unlock in unlocks {
            if let Some(achievement) = definitions
                .iter()
                .find(|definition| definition.id == unlock.achievement_id)
            {
                held.push(UnlockedAchievement {
                    achievement: achievement.clone(),
                    unlocked_at: unlock.unlocked_at,
                });
            }
        }
        Ok(held)
    }

    /// Snapshot of the counters the rules are written against.
    pub async fn learner_facts(&self, learner_id: Uuid) -> PortResult<LearnerFacts> {
        let enrollments = self.store.list_enrollments(learner_id).await?;
        let totals = self.store.lesson_totals(learner_id).await?;
        let best_quiz_score = self.store.best_quiz_score(learner_id).await?;

        Ok(LearnerFacts {
            courses_completed: enrollments
                .iter()
                .filter(|enrollment| enrollment.completed)
                .count() as u32,
            lessons_completed: totals.lessons_completed,
            minutes_spent: totals.minutes_spent,
            best_quiz_score,
        })
    }
}
