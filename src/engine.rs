//! Per-user facade over the scheduler, ranker, profile model and ledger.
//!
//! Every mutating call is a load, modify, save cycle on the user's document,
//! serialized by a per-user lock. Read-only calls never write.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::services::gamification::{
    Activity, Dashboard, GamificationLedger, ProgressSnapshot, UnlockedAchievement, XpAward,
};
use crate::services::profile::{ProfileUpdate, Signal, UserProfile, UserProfileModel};
use crate::services::ranker::{CandidateItem, ContentRanker, LevelLexicon, RankingContext, ScoredItem};
use crate::services::scheduler::{
    EncounterContext, EncounterOutcome, ReviewError, ReviewOutcome, ScheduleStats, SpacedRepetitionScheduler,
    WordFilter, WordRecord,
};
use crate::services::streak::{StreakTracker, StreakUpdate};
use crate::store::{validate_user_id, MemoryStore, StateStore, StoreError, UserState};
use crate::types::{LengthPreference, ReviewQuality};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterResult {
    #[serde(flatten)]
    pub encounter: EncounterOutcome,
    pub streak: StreakUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    #[serde(flatten)]
    pub review: ReviewOutcome,
    pub streak: StreakUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
    pub award: XpAward,
    pub achievements: Vec<UnlockedAchievement>,
    pub streak: StreakUpdate,
    pub total_xp: u64,
}

pub struct LearningEngine {
    config: EngineConfig,
    store: Arc<dyn StateStore>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    scheduler: SpacedRepetitionScheduler,
    ranker: ContentRanker,
    profiles: UserProfileModel,
    ledger: GamificationLedger,
    streaks: StreakTracker,
    lexicon: LevelLexicon,
}

impl LearningEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn StateStore>) -> Self {
        Self {
            scheduler: SpacedRepetitionScheduler::new(config.scheduler.clone()),
            ranker: ContentRanker::new(config.ranker.clone()),
            profiles: UserProfileModel::new(config.profile.clone()),
            ledger: GamificationLedger::new(config.gamification.clone()),
            streaks: StreakTracker::new(config.gamification.meaningful_words_per_day),
            lexicon: LevelLexicon::default(),
            user_locks: Mutex::new(HashMap::new()),
            store,
            config,
        }
    }

    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_lexicon(mut self, lexicon: LevelLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `f` while holding the user's lock. Ids are validated before a
    /// lock entry exists, and the entry is dropped once no caller holds it.
    fn with_user_lock<T>(&self, user_id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        validate_user_id(user_id)?;
        let lock = Arc::clone(self.user_locks.lock().entry(user_id.to_string()).or_default());
        let result = {
            let _guard = lock.lock();
            f()
        };

        let mut locks = self.user_locks.lock();
        // one reference in the map, one held here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
        result
    }

    /// Runs `f` against the user's state and saves the result. A document
    /// that fails to load is reported instead of being overwritten.
    fn update<T>(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut UserState) -> Result<T>,
    ) -> Result<T> {
        self.with_user_lock(user_id, || {
            let mut state = self.load_or_new(user_id, now)?;
            let value = f(&mut state)?;
            state.updated_at = now;
            self.store.save(&state)?;
            Ok(value)
        })
    }

    fn load_or_new(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserState> {
        Ok(self
            .store
            .load(user_id)?
            .unwrap_or_else(|| UserState::new(user_id, now)))
    }

    /// Loads the user's state for the read-only views. Missing or unreadable
    /// documents yield a fresh default state.
    fn snapshot(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserState> {
        self.with_user_lock(user_id, || match self.store.load(user_id) {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Ok(UserState::new(user_id, now)),
            Err(StoreError::Serde(err)) => {
                tracing::warn!(user_id = %user_id, error = %err, "unreadable state, using defaults");
                Ok(UserState::new(user_id, now))
            }
            Err(err) => Err(err.into()),
        })
    }

    fn sync_known_words(&self, state: &mut UserState) {
        let mut known = state.profile.saved_words.clone();
        known.extend(self.scheduler.known_words(&state.vocabulary).map(str::to_string));
        state.profile.known_words = known;
    }

    fn encounter_in(
        &self,
        state: &mut UserState,
        word: &str,
        context: Option<EncounterContext>,
        now: DateTime<Utc>,
    ) -> EncounterOutcome {
        let outcome = self.scheduler.record_encounter(&mut state.vocabulary, word, context, now);
        if outcome.is_new {
            self.streaks.note_new_word(&mut state.streak, now.date_naive());
        }
        outcome
    }

    pub fn record_encounter(
        &self,
        user_id: &str,
        word: &str,
        context: Option<EncounterContext>,
    ) -> Result<EncounterResult> {
        self.record_encounter_at(user_id, word, context, Utc::now())
    }

    pub fn record_encounter_at(
        &self,
        user_id: &str,
        word: &str,
        context: Option<EncounterContext>,
        now: DateTime<Utc>,
    ) -> Result<EncounterResult> {
        if word.trim().is_empty() {
            return Err(ReviewError::EmptyWord.into());
        }
        self.update(user_id, now, |state| {
            let encounter = self.encounter_in(state, word, context, now);
            let streak = self.streaks.update(&mut state.streak, now.date_naive());
            self.sync_known_words(state);
            Ok(EncounterResult { encounter, streak })
        })
    }

    /// Rejects qualities outside 0..=5 before touching any state.
    pub fn review_word(&self, user_id: &str, word: &str, quality: u8) -> Result<ReviewResult> {
        self.review_word_at(user_id, word, quality, Utc::now())
    }

    pub fn review_word_at(
        &self,
        user_id: &str,
        word: &str,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult> {
        let quality = ReviewQuality::try_from(quality)?;
        if word.trim().is_empty() {
            return Err(ReviewError::EmptyWord.into());
        }
        self.update(user_id, now, |state| {
            let review = self.scheduler.review_word(&mut state.vocabulary, word, quality, now);
            if review.created {
                self.streaks.note_new_word(&mut state.streak, now.date_naive());
            }
            let streak = self.streaks.update(&mut state.streak, now.date_naive());
            self.sync_known_words(state);
            tracing::debug!(
                user_id = %user_id,
                word = %review.word,
                interval_days = review.interval_days,
                "review recorded"
            );
            Ok(ReviewResult { review, streak })
        })
    }

    /// Applies the signals in order and recomputes the derived profile.
    /// Saved words are also recorded as vocabulary encounters.
    pub fn build_profile(&self, user_id: &str, signals: Vec<Signal>) -> Result<ProfileUpdate> {
        self.build_profile_at(user_id, signals, Utc::now())
    }

    pub fn build_profile_at(
        &self,
        user_id: &str,
        signals: Vec<Signal>,
        now: DateTime<Utc>,
    ) -> Result<ProfileUpdate> {
        self.update(user_id, now, |state| {
            for signal in signals {
                if let Signal::WordSaved { word } = &signal {
                    if !word.trim().is_empty() {
                        self.encounter_in(state, word, None, now);
                    }
                }
                self.profiles.apply_signal(&mut state.profile, signal, now);
            }
            self.streaks.update(&mut state.streak, now.date_naive());

            let known: Vec<String> = self
                .scheduler
                .known_words(&state.vocabulary)
                .map(str::to_string)
                .collect();
            Ok(self.profiles.build_profile(
                &mut state.profile,
                None,
                known.iter().map(String::as_str),
                now,
            ))
        })
    }

    pub fn get_due_words(&self, user_id: &str) -> Result<Vec<String>> {
        self.get_due_words_at(user_id, Utc::now())
    }

    pub fn get_due_words_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<String>> {
        let state = self.snapshot(user_id, now)?;
        Ok(self
            .scheduler
            .due_words(&state.vocabulary, now)
            .into_iter()
            .map(|r| r.word.clone())
            .collect())
    }

    pub fn recommend(&self, user_id: &str, candidates: Vec<CandidateItem>, count: usize) -> Result<Vec<ScoredItem>> {
        self.recommend_at(user_id, candidates, count, Utc::now())
    }

    pub fn recommend_at(
        &self,
        user_id: &str,
        candidates: Vec<CandidateItem>,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        if candidates.is_empty() || count == 0 {
            return Ok(Vec::new());
        }
        let state = self.snapshot(user_id, now)?;
        let ctx = RankingContext::build(
            &state.vocabulary,
            &state.profile,
            &self.lexicon,
            &self.config.scheduler,
            &self.config.ranker,
            now,
        );
        Ok(self.ranker.recommend(candidates, &ctx, count))
    }

    pub fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        Ok(self.snapshot(user_id, Utc::now())?.profile)
    }

    pub fn set_length_preference(&self, user_id: &str, preference: LengthPreference) -> Result<()> {
        self.update(user_id, Utc::now(), |state| {
            state.profile.content_preferences.preferred_length = preference;
            Ok(())
        })
    }

    /// Grants XP for one activity, advances the streak on a perfect quiz and
    /// unlocks any achievements that now qualify.
    pub fn award_xp(&self, user_id: &str, activity: Activity) -> Result<ActivityResult> {
        self.award_xp_at(user_id, activity, Utc::now())
    }

    pub fn award_xp_at(&self, user_id: &str, mut activity: Activity, now: DateTime<Utc>) -> Result<ActivityResult> {
        let today = now.date_naive();
        self.update(user_id, now, |state| {
            if activity.is_perfect_quiz() {
                self.streaks.note_perfect_quiz(&mut state.streak, today);
            }
            let streak = self.streaks.update(&mut state.streak, today);

            activity.current_streak = state.streak.current_as_of(today);
            let award = self
                .ledger
                .award_xp(&mut state.ledger, &activity, state.profile.cefr_level);

            let progress = ProgressSnapshot {
                words_learned: state.vocabulary.len() as u32,
                words_today: state.streak.new_words_on(today),
                current_streak: activity.current_streak,
                level: state.profile.cefr_level,
                at: now,
            };
            let achievements = self.ledger.check_achievements(&mut state.ledger, &progress);

            Ok(ActivityResult {
                award,
                achievements,
                streak,
                total_xp: state.ledger.total_xp,
            })
        })
    }

    pub fn stats(&self, user_id: &str) -> Result<ScheduleStats> {
        self.stats_at(user_id, Utc::now())
    }

    pub fn stats_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<ScheduleStats> {
        let state = self.snapshot(user_id, now)?;
        Ok(self.scheduler.stats(
            &state.vocabulary,
            now,
            self.config.gamification.daily_word_goal as usize,
        ))
    }

    pub fn search_words(&self, user_id: &str, query: &str) -> Result<Vec<WordRecord>> {
        let state = self.snapshot(user_id, Utc::now())?;
        Ok(self
            .scheduler
            .search(&state.vocabulary, query)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn filter_words(&self, user_id: &str, filter: WordFilter) -> Result<Vec<WordRecord>> {
        let now = Utc::now();
        let state = self.snapshot(user_id, now)?;
        Ok(self
            .scheduler
            .filter(&state.vocabulary, filter, now)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn dashboard(&self, user_id: &str) -> Result<Dashboard> {
        self.dashboard_at(user_id, Utc::now())
    }

    pub fn dashboard_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<Dashboard> {
        let state = self.snapshot(user_id, now)?;
        Ok(self.ledger.dashboard(
            &state.ledger,
            &state.streak,
            state.vocabulary.len() as u32,
            state.streak.new_words_on(now.date_naive()),
            now,
        ))
    }

    /// Serializes the stored document. An unreadable document is an error
    /// here, never replaced by defaults.
    pub fn export_state(&self, user_id: &str) -> Result<String> {
        self.with_user_lock(user_id, || Ok(self.load_or_new(user_id, Utc::now())?.to_json()?))
    }

    /// Replaces the user's whole state. The document is parsed before the
    /// lock is taken, so a bad document leaves the stored state untouched.
    pub fn import_state(&self, user_id: &str, json: &str) -> Result<()> {
        let mut imported = UserState::from_json(json)?;
        imported.user_id = user_id.to_string();
        imported.profile.user_id = user_id.to_string();

        self.with_user_lock(user_id, || {
            self.store.save(&imported)?;
            tracing::info!(user_id = %user_id, words = imported.vocabulary.len(), "state imported");
            Ok(())
        })
    }
}
