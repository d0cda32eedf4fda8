//! SM-2 spaced repetition over a learner's vocabulary.
//!
//! Scheduling follows classic SM-2 (first success 1 day, second 6 days, then
//! `round(interval * ease)`, lapse back to 1 day). Mastery is tracked beside
//! it on a 0-5 scale and only climbs after three consecutive successful
//! recalls graded 4 or better.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::types::ReviewQuality;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("review quality must be within 0..=5, got {0}")]
    InvalidQuality(u8),
    #[error("word must not be empty")]
    EmptyWord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordContext {
    pub sentence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Where a word was seen, as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct EncounterContext {
    pub sentence: String,
    pub source_id: Option<String>,
}

impl EncounterContext {
    pub fn new(sentence: impl Into<String>, source_id: Option<String>) -> Self {
        Self {
            sentence: sentence.into(),
            source_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub word: String,
    pub mastery_level: u8,
    /// Consecutive successful recalls since the last lapse.
    pub repetitions: u32,
    pub encounters: u32,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub contexts: VecDeque<WordContext>,
    pub reviews: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

impl WordRecord {
    pub fn new(word: String, now: DateTime<Utc>, config: &SchedulerConfig) -> Self {
        Self {
            word,
            mastery_level: 0,
            repetitions: 0,
            encounters: 0,
            ease_factor: config.initial_ease,
            interval_days: 0,
            next_review_at: now,
            first_seen_at: now,
            last_seen_at: now,
            contexts: VecDeque::new(),
            reviews: 0,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    pub fn is_scheduled(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    pub fn is_known(&self, config: &SchedulerConfig) -> bool {
        self.mastery_level >= config.known_mastery
    }

    pub fn accuracy(&self) -> f64 {
        if self.reviews == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.reviews as f64
    }

    fn push_context(&mut self, context: WordContext, max_contexts: usize) {
        self.contexts.push_back(context);
        while self.contexts.len() > max_contexts {
            self.contexts.pop_front();
        }
    }
}

/// One SM-2 transition, independent of any record bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2Step {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
}

pub fn sm2_step(
    quality: ReviewQuality,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    min_ease: f64,
) -> Sm2Step {
    // Interval growth uses the ease factor in effect before this review.
    let (interval_days, repetitions) = if quality.is_success() {
        let interval = match repetitions {
            0 => 1,
            1 => 6,
            _ => (interval_days as f64 * ease_factor).round() as u32,
        };
        (interval, repetitions + 1)
    } else {
        (1, 0)
    };

    let q = quality.value() as f64;
    let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);

    Sm2Step {
        ease_factor: (ease_factor + ease_delta).max(min_ease),
        interval_days,
        repetitions,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterOutcome {
    pub is_new: bool,
    pub encounters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub word: String,
    pub next_review_at: DateTime<Utc>,
    pub mastery_level: u8,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    /// Mastery rose to the mastered tier on this review.
    pub newly_mastered: bool,
    /// The record did not exist and was created by this review.
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WordFilter {
    #[default]
    All,
    Due,
    Learning,
    Known,
    Mastered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    pub total_words: usize,
    pub mastered_words: usize,
    pub due_words: usize,
    pub words_learned_today: u32,
    pub daily_target: usize,
    /// Percentage of the vocabulary at the mastered tier.
    pub comprehension_rate: f64,
    pub total_words_encountered: u64,
    pub total_words_mastered: u64,
}

/// Per-user word store. Records are never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub words: BTreeMap<String, WordRecord>,
    pub total_encountered: u64,
    pub total_mastered: u64,
    pub words_learned_today: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learned_day: Option<NaiveDate>,
}

impl Vocabulary {
    pub fn get(&self, word: &str) -> Option<&WordRecord> {
        self.words.get(&normalize_word(word))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn roll_day(&mut self, today: NaiveDate) {
        if self.learned_day != Some(today) {
            self.learned_day = Some(today);
            self.words_learned_today = 0;
        }
    }
}

pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct SpacedRepetitionScheduler {
    config: SchedulerConfig,
}

impl SpacedRepetitionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn record_encounter(
        &self,
        vocab: &mut Vocabulary,
        word: &str,
        context: Option<EncounterContext>,
        now: DateTime<Utc>,
    ) -> EncounterOutcome {
        let key = normalize_word(word);
        let is_new = !vocab.words.contains_key(&key);
        if is_new {
            vocab.total_encountered += 1;
        }

        let record = vocab
            .words
            .entry(key.clone())
            .or_insert_with(|| WordRecord::new(key, now, &self.config));
        record.last_seen_at = now;
        record.encounters += 1;

        if let Some(ctx) = context.filter(|c| !c.sentence.trim().is_empty()) {
            record.push_context(
                WordContext {
                    sentence: ctx.sentence,
                    source_id: ctx.source_id,
                    timestamp: now,
                },
                self.config.max_contexts,
            );
        }

        EncounterOutcome {
            is_new,
            encounters: record.encounters,
        }
    }

    pub fn review_word(
        &self,
        vocab: &mut Vocabulary,
        word: &str,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> ReviewOutcome {
        let key = normalize_word(word);
        let created = !vocab.words.contains_key(&key);
        if created {
            self.record_encounter(vocab, &key, None, now);
        }
        vocab.roll_day(now.date_naive());

        let config = &self.config;
        let record = vocab
            .words
            .entry(key.clone())
            .or_insert_with(|| WordRecord::new(key, now, config));

        let step = sm2_step(
            quality,
            record.ease_factor,
            record.interval_days,
            record.repetitions,
            config.min_ease,
        );
        record.ease_factor = step.ease_factor;
        record.interval_days = step.interval_days.min(config.max_interval_days);
        record.repetitions = step.repetitions;
        record.next_review_at = now + Duration::days(record.interval_days as i64);
        record.last_seen_at = now;
        record.reviews += 1;
        if quality.is_success() {
            record.correct_count += 1;
        } else {
            record.incorrect_count += 1;
        }

        let mut newly_mastered = false;
        if quality.value() >= 4 && record.repetitions >= 3 {
            let before = record.mastery_level;
            record.mastery_level = (record.mastery_level + 1).min(config.max_mastery);
            if record.mastery_level >= config.mastered_mastery && record.mastery_level > before {
                vocab.total_mastered += 1;
                vocab.words_learned_today += 1;
                newly_mastered = before < config.mastered_mastery;
            }
        } else if !quality.is_success() {
            record.mastery_level = record.mastery_level.saturating_sub(1);
        }

        tracing::debug!(
            word = %record.word,
            quality = quality.value(),
            interval_days = record.interval_days,
            ease = record.ease_factor,
            mastery = record.mastery_level,
            "word reviewed"
        );

        ReviewOutcome {
            word: record.word.clone(),
            next_review_at: record.next_review_at,
            mastery_level: record.mastery_level,
            interval_days: record.interval_days,
            ease_factor: record.ease_factor,
            repetitions: record.repetitions,
            newly_mastered,
            created,
        }
    }

    /// Words whose review time has arrived, plus every word still below the
    /// known tier. Ordered by mastery, then schedule, then spelling.
    pub fn due_words<'a>(&self, vocab: &'a Vocabulary, now: DateTime<Utc>) -> Vec<&'a WordRecord> {
        let mut due: Vec<&WordRecord> = vocab
            .words
            .values()
            .filter(|r| r.is_scheduled(now) || !r.is_known(&self.config))
            .collect();
        due.sort_by(|a, b| compare_due(a, b));
        due
    }

    /// Only the words whose review time has arrived.
    pub fn scheduled_words<'a>(&self, vocab: &'a Vocabulary, now: DateTime<Utc>) -> Vec<&'a WordRecord> {
        let mut due: Vec<&WordRecord> = vocab.words.values().filter(|r| r.is_scheduled(now)).collect();
        due.sort_by(|a, b| compare_due(a, b));
        due
    }

    pub fn known_words<'a>(&self, vocab: &'a Vocabulary) -> impl Iterator<Item = &'a str> + 'a {
        let known = self.config.known_mastery;
        vocab
            .words
            .values()
            .filter(move |r| r.mastery_level >= known)
            .map(|r| r.word.as_str())
    }

    pub fn filter<'a>(
        &self,
        vocab: &'a Vocabulary,
        filter: WordFilter,
        now: DateTime<Utc>,
    ) -> Vec<&'a WordRecord> {
        let config = &self.config;
        vocab
            .words
            .values()
            .filter(|r| match filter {
                WordFilter::All => true,
                WordFilter::Due => r.is_scheduled(now),
                WordFilter::Learning => !r.is_known(config),
                WordFilter::Known => r.is_known(config),
                WordFilter::Mastered => r.mastery_level >= config.mastered_mastery,
            })
            .collect()
    }

    /// Case-insensitive substring match on the word or any stored sentence.
    pub fn search<'a>(&self, vocab: &'a Vocabulary, query: &str) -> Vec<&'a WordRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return vocab.words.values().collect();
        }
        vocab
            .words
            .values()
            .filter(|r| {
                r.word.contains(&needle)
                    || r
                        .contexts
                        .iter()
                        .any(|c| c.sentence.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn stats(&self, vocab: &Vocabulary, now: DateTime<Utc>, daily_target: usize) -> ScheduleStats {
        let total_words = vocab.words.len();
        let mastered_words = vocab
            .words
            .values()
            .filter(|r| r.mastery_level >= self.config.mastered_mastery)
            .count();
        let due_words = vocab.words.values().filter(|r| r.is_scheduled(now)).count();
        let words_learned_today = if vocab.learned_day == Some(now.date_naive()) {
            vocab.words_learned_today
        } else {
            0
        };
        let comprehension_rate = if total_words > 0 {
            (mastered_words as f64 / total_words as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        ScheduleStats {
            total_words,
            mastered_words,
            due_words,
            words_learned_today,
            daily_target,
            comprehension_rate,
            total_words_encountered: vocab.total_encountered,
            total_words_mastered: vocab.total_mastered,
        }
    }
}

fn compare_due(a: &WordRecord, b: &WordRecord) -> Ordering {
    a.mastery_level
        .cmp(&b.mastery_level)
        .then_with(|| a.next_review_at.cmp(&b.next_review_at))
        .then_with(|| a.word.cmp(&b.word))
}
