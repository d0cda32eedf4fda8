//! Learning-value ranking for feed candidates.
//!
//! Each factor is an independent additive bonus; a comprehension band
//! penalty is applied afterwards and the total is floored at zero.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{RankerConfig, SchedulerConfig};
use crate::services::profile::UserProfile;
use crate::services::scheduler::{normalize_word, Vocabulary};
use crate::types::{CefrLevel, LengthPreference};

fn default_topic() -> String {
    "general".to_string()
}

fn default_duration() -> u32 {
    30
}

/// A video or article offered for ranking. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    pub id: String,
    /// Transcript lines or body paragraphs in the target language.
    #[serde(default)]
    pub transcript: Vec<String>,
    #[serde(default)]
    pub level: CefrLevel,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_duration")]
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, transcript: Vec<String>) -> Self {
        Self {
            id: id.into(),
            transcript,
            level: CefrLevel::default(),
            topic: default_topic(),
            duration_seconds: default_duration(),
            published_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub token_count: usize,
    pub weak: f64,
    pub target: f64,
    pub due: f64,
    pub density: f64,
    pub level: f64,
    pub freshness: f64,
    pub length: f64,
    pub penalty: f64,
    pub comprehension_rate: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        let raw = self.weak
            + self.target
            + self.due
            + self.density
            + self.level
            + self.freshness
            + self.length
            - self.penalty;
        raw.max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    pub item: CandidateItem,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Everything the ranker reads about one learner, captured at one instant.
#[derive(Debug, Clone, Default)]
pub struct RankingContext {
    pub weak_words: HashSet<String>,
    pub target_words: HashSet<String>,
    pub due_words: HashSet<String>,
    pub known_words: HashSet<String>,
    pub level: CefrLevel,
    pub recent_topics: HashSet<String>,
    pub length_preference: LengthPreference,
}

impl RankingContext {
    pub fn build(
        vocab: &Vocabulary,
        profile: &UserProfile,
        lexicon: &LevelLexicon,
        scheduler: &SchedulerConfig,
        ranker: &RankerConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let mut weak_words = HashSet::new();
        let mut due_words = HashSet::new();
        let mut known_words = HashSet::new();

        for record in vocab.words.values() {
            let scheduled = record.is_scheduled(now);
            if scheduled {
                due_words.insert(record.word.clone());
            }
            if scheduled || !record.is_known(scheduler) {
                weak_words.insert(record.word.clone());
            }
            if record.is_known(scheduler) {
                known_words.insert(record.word.clone());
            }
        }

        let target_words = lexicon
            .target_words(profile.cefr_level, |w| vocab.words.contains_key(w), ranker.daily_target * 3)
            .into_iter()
            .collect();

        Self {
            weak_words,
            target_words,
            due_words,
            known_words,
            level: profile.cefr_level,
            recent_topics: profile.recent_topics(ranker.recent_topic_window),
            length_preference: profile.content_preferences.preferred_length,
        }
    }
}

/// Lowercased tokens of at least `min_chars` characters. Punctuation is
/// dropped; letters of any script (á, ñ, ü ...) are kept.
pub fn tokenize(text: &str, min_chars: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() >= min_chars)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ContentRanker {
    config: RankerConfig,
}

impl ContentRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn breakdown(&self, item: &CandidateItem, ctx: &RankingContext) -> ScoreBreakdown {
        let tokens: Vec<String> = item
            .transcript
            .iter()
            .flat_map(|line| tokenize(line, self.config.min_token_chars))
            .collect();
        if tokens.is_empty() {
            return ScoreBreakdown::default();
        }

        let w = &self.config.weights;
        let total = tokens.len() as f64;
        let count_in = |set: &HashSet<String>| tokens.iter().filter(|t| set.contains(*t)).count() as f64;
        let unique = tokens.iter().collect::<HashSet<_>>().len() as f64;

        let level = if item.level == ctx.level {
            w.level_exact
        } else if item.level.distance(ctx.level) == 1 {
            w.level_adjacent
        } else {
            0.0
        };
        let freshness = if ctx.recent_topics.contains(&item.topic.to_lowercase()) {
            0.0
        } else {
            w.fresh_topic
        };
        let length = if ctx.length_preference.matches(item.duration_seconds) {
            w.length_match
        } else {
            0.0
        };

        let comprehension_rate = count_in(&ctx.known_words) / total;
        let penalty = if comprehension_rate < self.config.too_hard_below {
            w.too_hard_penalty
        } else if comprehension_rate > self.config.too_easy_above {
            w.too_easy_penalty
        } else {
            0.0
        };

        ScoreBreakdown {
            token_count: tokens.len(),
            weak: count_in(&ctx.weak_words) * w.weak,
            target: count_in(&ctx.target_words) * w.target,
            due: count_in(&ctx.due_words) * w.due,
            density: unique / total * w.density,
            level,
            freshness,
            length,
            penalty,
            comprehension_rate,
        }
    }

    pub fn score_item(&self, item: &CandidateItem, ctx: &RankingContext) -> f64 {
        self.breakdown(item, ctx).total()
    }

    /// Highest learning value first; ties go to the newer item, then by id.
    pub fn recommend(
        &self,
        candidates: Vec<CandidateItem>,
        ctx: &RankingContext,
        count: usize,
    ) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = candidates
            .into_iter()
            .map(|item| {
                let breakdown = self.breakdown(&item, ctx);
                ScoredItem {
                    score: breakdown.total(),
                    item,
                    breakdown,
                }
            })
            .collect();

        scored.sort_by(compare_scored);
        scored.truncate(count);

        tracing::debug!(
            returned = scored.len(),
            top_score = scored.first().map(|s| s.score).unwrap_or(0.0),
            "candidates ranked"
        );
        scored
    }
}

fn compare_scored(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| match (a.item.published_at, b.item.published_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.item.id.cmp(&b.item.id))
}

/// High-frequency words per CEFR level, used to pick new vocabulary targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLexicon {
    levels: BTreeMap<CefrLevel, Vec<String>>,
}

impl Default for LevelLexicon {
    fn default() -> Self {
        let table: [(CefrLevel, &[&str]); 6] = [
            (
                CefrLevel::A1,
                &["hola", "adiós", "gracias", "casa", "comida", "agua", "nombre", "bueno", "hoy", "mañana"],
            ),
            (
                CefrLevel::A2,
                &["trabajo", "familia", "amigo", "ciudad", "país", "tiempo", "día", "noche", "libro", "música"],
            ),
            (
                CefrLevel::B1,
                &["importante", "necesario", "posible", "difícil", "fácil", "conocer", "entender", "explicar"],
            ),
            (
                CefrLevel::B2,
                &["desarrollar", "sociedad", "cultura", "economía", "política", "investigar", "analizar"],
            ),
            (
                CefrLevel::C1,
                &["consecuencia", "hipótesis", "perspectiva", "contextualizar", "paradigma"],
            ),
            (
                CefrLevel::C2,
                &["epistemología", "hermenéutica", "dialéctica", "fenomenología"],
            ),
        ];

        let levels = table
            .into_iter()
            .map(|(level, words)| (level, words.iter().map(|w| w.to_string()).collect()))
            .collect();
        Self { levels }
    }
}

impl LevelLexicon {
    pub fn new(levels: BTreeMap<CefrLevel, Vec<String>>) -> Self {
        let levels = levels
            .into_iter()
            .map(|(level, words)| (level, words.iter().map(|w| normalize_word(w)).collect()))
            .collect();
        Self { levels }
    }

    /// Level words the learner has no record for, in list order. A level
    /// without a list falls back to A1.
    pub fn target_words(
        &self,
        level: CefrLevel,
        already_seen: impl Fn(&str) -> bool,
        limit: usize,
    ) -> Vec<String> {
        let words = self
            .levels
            .get(&level)
            .or_else(|| self.levels.get(&CefrLevel::A1))
            .map(Vec::as_slice)
            .unwrap_or_default();
        words
            .iter()
            .filter(|w| !already_seen(w.as_str()))
            .take(limit)
            .cloned()
            .collect()
    }
}
