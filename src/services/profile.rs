//! Learner profile derived from raw consumption signals.
//!
//! Raw history is kept bounded (newest entries win); every derived field is
//! recomputed from that history on each build.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProfileConfig;
use crate::types::{CefrLevel, Category, LengthPreference};

const DEFAULT_DIFFICULTY: f64 = 50.0;
const DEFAULT_COMPLETION: f64 = 1.0;
const DEFAULT_ARTICLE_SECONDS: f64 = 60.0;
const VIDEO_NOMINAL_SECONDS: f64 = 100.0;
const ARTICLE_INTEREST_WEIGHT: f64 = 1.5;
const ITEMS_PER_SESSION: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWatched {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRead {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCompleted {
    pub game_type: String,
    pub score: f64,
}

/// One behavioral event reported by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    VideoWatched(VideoWatched),
    ArticleRead(ArticleRead),
    WordSaved { word: String },
    GameCompleted(GameCompleted),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    Article,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionEvent {
    pub item_id: String,
    pub kind: ContentKind,
    pub timestamp: DateTime<Utc>,
    pub completion_rate: f64,
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_secs: Option<f64>,
    pub topics: Vec<String>,
}

impl ConsumptionEvent {
    /// Engagement seconds credited to the item's topics.
    fn interest_seconds(&self) -> f64 {
        match self.kind {
            ContentKind::Video => self.completion_rate * VIDEO_NOMINAL_SECONDS,
            ContentKind::Article => {
                self.time_spent_secs
                    .filter(|t| *t > 0.0)
                    .unwrap_or(DEFAULT_ARTICLE_SECONDS)
                    * ARTICLE_INTEREST_WEIGHT
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub game_type: String,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestSnapshot {
    pub timestamp: DateTime<Utc>,
    pub interests: BTreeMap<Category, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestShift {
    pub category: Category,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStyle {
    pub visual: f64,
    pub auditory: f64,
    pub kinesthetic: f64,
}

impl Default for LearningStyle {
    fn default() -> Self {
        Self {
            visual: 1.0 / 3.0,
            auditory: 1.0 / 3.0,
            kinesthetic: 1.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_hour_of_day: Option<u32>,
    pub total_sessions: u32,
    pub avg_items_per_session: f64,
    pub avg_videos_per_session: f64,
    pub avg_articles_per_session: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPreferences {
    pub preferred_length: LengthPreference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub cefr_level: CefrLevel,
    pub level_confidence: f64,
    /// Words the learner explicitly saved.
    pub saved_words: BTreeSet<String>,
    /// Saved words plus every word at or above the known mastery tier.
    pub known_words: BTreeSet<String>,
    pub videos_watched: VecDeque<ConsumptionEvent>,
    pub articles_read: VecDeque<ConsumptionEvent>,
    pub games_played: VecDeque<GameEvent>,
    pub interests: BTreeMap<Category, f64>,
    pub interest_history: VecDeque<InterestSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interest_update: Option<DateTime<Utc>>,
    pub learning_style: LearningStyle,
    pub optimal_difficulty: f64,
    pub engagement: Engagement,
    pub content_preferences: ContentPreferences,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            created_at: now,
            last_active: now,
            cefr_level: CefrLevel::A2,
            level_confidence: 0.3,
            saved_words: BTreeSet::new(),
            known_words: BTreeSet::new(),
            videos_watched: VecDeque::new(),
            articles_read: VecDeque::new(),
            games_played: VecDeque::new(),
            interests: Category::ALL.into_iter().map(|c| (c, 0.0)).collect(),
            interest_history: VecDeque::new(),
            last_interest_update: None,
            learning_style: LearningStyle::default(),
            optimal_difficulty: DEFAULT_DIFFICULTY,
            engagement: Engagement::default(),
            content_preferences: ContentPreferences::default(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.known_words.len()
    }

    fn consumed(&self) -> impl Iterator<Item = &ConsumptionEvent> {
        self.videos_watched.iter().chain(self.articles_read.iter())
    }

    /// Lowercased topics of the most recent `window` consumed items. Items
    /// without topics count as "general".
    pub fn recent_topics(&self, window: usize) -> HashSet<String> {
        let mut events: Vec<&ConsumptionEvent> = self.consumed().collect();
        events.sort_by_key(|e| e.timestamp);
        events
            .iter()
            .rev()
            .take(window)
            .flat_map(|e| {
                if e.topics.is_empty() {
                    vec!["general".to_string()]
                } else {
                    e.topics.iter().map(|t| t.to_lowercase()).collect()
                }
            })
            .collect()
    }

    pub fn average_difficulty(&self) -> f64 {
        let (sum, count) = self
            .consumed()
            .fold((0.0, 0usize), |(sum, n), e| (sum + e.difficulty, n + 1));
        if count == 0 {
            DEFAULT_DIFFICULTY
        } else {
            sum / count as f64
        }
    }

    pub fn average_completion(&self) -> f64 {
        let (sum, count) = self
            .consumed()
            .fold((0.0, 0usize), |(sum, n), e| (sum + e.completion_rate, n + 1));
        if count == 0 {
            DEFAULT_COMPLETION
        } else {
            sum / count as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub cefr_level: CefrLevel,
    pub level_changed: bool,
    pub shifts: Vec<InterestShift>,
}

#[derive(Debug, Clone, Default)]
pub struct UserProfileModel {
    config: ProfileConfig,
}

impl UserProfileModel {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Appends one signal to the raw history.
    pub fn apply_signal(&self, profile: &mut UserProfile, signal: Signal, now: DateTime<Utc>) {
        let cap = self.config.history_cap;
        match signal {
            Signal::VideoWatched(video) => push_bounded(
                &mut profile.videos_watched,
                ConsumptionEvent {
                    item_id: video.id,
                    kind: ContentKind::Video,
                    timestamp: now,
                    completion_rate: video.completion_rate.unwrap_or(DEFAULT_COMPLETION),
                    difficulty: video.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
                    time_spent_secs: None,
                    topics: video.topics,
                },
                cap,
            ),
            Signal::ArticleRead(article) => push_bounded(
                &mut profile.articles_read,
                ConsumptionEvent {
                    item_id: article.id,
                    kind: ContentKind::Article,
                    timestamp: now,
                    completion_rate: article.completion_rate.unwrap_or(DEFAULT_COMPLETION),
                    difficulty: article.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
                    time_spent_secs: article.time_spent_secs,
                    topics: article.topics,
                },
                cap,
            ),
            Signal::WordSaved { word } => {
                let word = word.trim().to_lowercase();
                if !word.is_empty() {
                    profile.saved_words.insert(word);
                }
            }
            Signal::GameCompleted(game) => push_bounded(
                &mut profile.games_played,
                GameEvent {
                    game_type: game.game_type,
                    score: game.score,
                    timestamp: now,
                },
                cap,
            ),
        }
        profile.last_active = now;
    }

    /// Applies the optional signal, refreshes the known-word set and
    /// recomputes every derived attribute.
    pub fn build_profile<'a>(
        &self,
        profile: &mut UserProfile,
        signal: Option<Signal>,
        known_from_reviews: impl IntoIterator<Item = &'a str>,
        now: DateTime<Utc>,
    ) -> ProfileUpdate {
        if let Some(signal) = signal {
            self.apply_signal(profile, signal, now);
        }

        let mut known = profile.saved_words.clone();
        known.extend(known_from_reviews.into_iter().map(str::to_string));
        profile.known_words = known;

        let previous_level = profile.cefr_level;
        self.infer_cefr_level(profile);
        let shifts = self.infer_interests(profile, now);
        self.infer_learning_style(profile);
        self.calculate_optimal_difficulty(profile);
        self.analyze_engagement(profile);

        if profile.cefr_level != previous_level {
            tracing::info!(
                user_id = %profile.user_id,
                from = %previous_level,
                to = %profile.cefr_level,
                "estimated level changed"
            );
        }

        ProfileUpdate {
            cefr_level: profile.cefr_level,
            level_changed: profile.cefr_level != previous_level,
            shifts,
        }
    }

    pub fn infer_cefr_level(&self, profile: &mut UserProfile) {
        let vocab = profile.vocabulary_size();
        let mut level = match vocab {
            0..=99 => CefrLevel::A1,
            100..=299 => CefrLevel::A2,
            300..=799 => CefrLevel::B1,
            800..=1999 => CefrLevel::B2,
            2000..=4999 => CefrLevel::C1,
            _ => CefrLevel::C2,
        };

        let avg_difficulty = profile.average_difficulty();
        if avg_difficulty < 30.0 {
            level = level.shift(-1);
        } else if avg_difficulty > 70.0 {
            level = level.shift(1);
        }

        let watched = profile.videos_watched.len() as f64;
        profile.cefr_level = level;
        profile.level_confidence = (0.5 + watched / 100.0 * 0.4).min(0.9);
    }

    /// Recomputes the 0-10 interest vector with exponential time decay and
    /// takes a snapshot when the snapshot interval has elapsed. Returns the
    /// categories that moved by more than the shift threshold since the
    /// previous snapshot.
    pub fn infer_interests(&self, profile: &mut UserProfile, now: DateTime<Utc>) -> Vec<InterestShift> {
        let mut scores: BTreeMap<Category, f64> = Category::ALL.into_iter().map(|c| (c, 0.0)).collect();
        let half_life = self.config.interest_half_life_days.max(f64::EPSILON);

        for event in profile.consumed() {
            let days_since = (now - event.timestamp).num_seconds() as f64 / 86_400.0;
            let weight = (-days_since / half_life).exp();
            let credit = weight * event.interest_seconds();
            for topic in &event.topics {
                *scores.entry(Category::from_topic(topic)).or_insert(0.0) += credit;
            }
        }

        let max_score = scores.values().copied().fold(1.0_f64, f64::max);
        for score in scores.values_mut() {
            *score = *score / max_score * 10.0;
        }
        profile.interests = scores;

        let interval = chrono::Duration::days(self.config.snapshot_interval_days);
        let due = profile
            .last_interest_update
            .map_or(true, |last| now - last > interval);
        if !due {
            return Vec::new();
        }
        profile.last_interest_update = Some(now);
        self.snapshot_interests(profile, now)
    }

    fn snapshot_interests(&self, profile: &mut UserProfile, now: DateTime<Utc>) -> Vec<InterestShift> {
        push_bounded(
            &mut profile.interest_history,
            InterestSnapshot {
                timestamp: now,
                interests: profile.interests.clone(),
            },
            self.config.max_snapshots,
        );

        let len = profile.interest_history.len();
        if len < 2 {
            return Vec::new();
        }
        let previous = &profile.interest_history[len - 2].interests;

        let shifts: Vec<InterestShift> = profile
            .interests
            .iter()
            .filter_map(|(category, current)| {
                let change = current - previous.get(category).copied().unwrap_or(0.0);
                (change.abs() > self.config.shift_threshold).then_some(InterestShift {
                    category: *category,
                    change,
                })
            })
            .collect();

        for shift in &shifts {
            tracing::info!(
                user_id = %profile.user_id,
                category = ?shift.category,
                change = shift.change,
                "interest shift detected"
            );
        }
        shifts
    }

    /// Share of videos, articles and games in the history. An empty history
    /// keeps the even split.
    pub fn infer_learning_style(&self, profile: &mut UserProfile) {
        let videos = profile.videos_watched.len() as f64;
        let articles = profile.articles_read.len() as f64;
        let games = profile.games_played.len() as f64;
        let total = videos + articles + games;
        if total == 0.0 {
            profile.learning_style = LearningStyle::default();
            return;
        }
        profile.learning_style = LearningStyle {
            visual: videos / total,
            auditory: articles / total,
            kinesthetic: games / total,
        };
    }

    pub fn calculate_optimal_difficulty(&self, profile: &mut UserProfile) {
        if profile.consumed().next().is_none() {
            return;
        }
        let avg_difficulty = profile.average_difficulty();
        let avg_completion = profile.average_completion();

        profile.optimal_difficulty = if avg_completion > 0.9 {
            (avg_difficulty + 10.0).min(100.0)
        } else if avg_completion < 0.6 {
            (avg_difficulty - 10.0).max(0.0)
        } else {
            avg_difficulty
        };
    }

    pub fn analyze_engagement(&self, profile: &mut UserProfile) {
        let mut hour_counts = [0u32; 24];
        for event in profile.consumed() {
            hour_counts[event.timestamp.hour() as usize] += 1;
        }
        // earliest hour wins ties
        let best_hour = hour_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .fold(None::<(usize, u32)>, |best, (hour, count)| match best {
                Some((_, top)) if top >= *count => best,
                _ => Some((hour, *count)),
            })
            .map(|(hour, _)| hour as u32);

        let videos = profile.videos_watched.len();
        let articles = profile.articles_read.len();
        let sessions = (videos + articles).div_ceil(ITEMS_PER_SESSION);

        let engagement = &mut profile.engagement;
        engagement.best_hour_of_day = best_hour;
        engagement.total_sessions = sessions as u32;
        if sessions > 0 {
            engagement.avg_videos_per_session = videos as f64 / sessions as f64;
            engagement.avg_articles_per_session = articles as f64 / sessions as f64;
            engagement.avg_items_per_session = (videos + articles) as f64 / sessions as f64;
        }
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, cap: usize) {
    queue.push_back(value);
    while queue.len() > cap {
        queue.pop_front();
    }
}
