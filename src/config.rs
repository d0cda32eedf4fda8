use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub initial_ease: f64,
    pub min_ease: f64,
    pub max_contexts: usize,
    /// Upper bound on a single review interval.
    pub max_interval_days: u32,
    pub max_mastery: u8,
    /// Mastery at which a word counts as known.
    pub known_mastery: u8,
    /// Mastery at which a word counts as mastered for stats.
    pub mastered_mastery: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            min_ease: 1.3,
            max_contexts: 5,
            max_interval_days: 36_500,
            max_mastery: 5,
            known_mastery: 3,
            mastered_mastery: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerWeights {
    pub weak: f64,
    pub target: f64,
    pub due: f64,
    pub density: f64,
    pub level_exact: f64,
    pub level_adjacent: f64,
    pub fresh_topic: f64,
    pub length_match: f64,
    pub too_hard_penalty: f64,
    pub too_easy_penalty: f64,
}

impl Default for RankerWeights {
    fn default() -> Self {
        Self {
            weak: 10.0,
            target: 7.0,
            due: 12.0,
            density: 5.0,
            level_exact: 15.0,
            level_adjacent: 7.0,
            fresh_topic: 8.0,
            length_match: 5.0,
            too_hard_penalty: 20.0,
            too_easy_penalty: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    pub weights: RankerWeights,
    pub too_hard_below: f64,
    pub too_easy_above: f64,
    pub min_token_chars: usize,
    pub recent_topic_window: usize,
    pub daily_target: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            weights: RankerWeights::default(),
            too_hard_below: 0.5,
            too_easy_above: 0.95,
            min_token_chars: 3,
            recent_topic_window: 10,
            daily_target: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub history_cap: usize,
    pub interest_half_life_days: f64,
    pub snapshot_interval_days: i64,
    pub max_snapshots: usize,
    pub shift_threshold: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            history_cap: 100,
            interest_half_life_days: 7.0,
            snapshot_interval_days: 7,
            max_snapshots: 4,
            shift_threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    pub daily_word_goal: u32,
    pub meaningful_words_per_day: u32,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            daily_word_goal: 10,
            meaningful_words_per_day: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `langfeed_engine=debug`.
    pub level: String,
    pub file_enabled: bool,
    pub dir: PathBuf,
    /// Prefix of the daily rolling log files.
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            dir: PathBuf::from("./logs"),
            file_name: "langfeed.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub ranker: RankerConfig,
    pub profile: ProfileConfig,
    pub gamification: GamificationConfig,
    pub store_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            ranker: RankerConfig::default(),
            profile: ProfileConfig::default(),
            gamification: GamificationConfig::default(),
            store_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse::<usize>("LANGFEED_DAILY_TARGET") {
            config.ranker.daily_target = val;
        }
        if let Some(val) = env_parse::<u32>("LANGFEED_DAILY_WORD_GOAL") {
            config.gamification.daily_word_goal = val.max(1);
        }
        if let Some(val) = env_parse::<u32>("LANGFEED_MEANINGFUL_WORDS") {
            config.gamification.meaningful_words_per_day = val;
        }
        if let Ok(val) = std::env::var("LANGFEED_STORE_DIR") {
            if !val.trim().is_empty() {
                config.store_dir = Some(PathBuf::from(val));
            }
        }
        if let Ok(val) = std::env::var("LANGFEED_LOG") {
            config.logging.level = val;
        }
        if let Ok(val) = std::env::var("ENABLE_FILE_LOGS") {
            config.logging.file_enabled = val == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("LOG_DIR") {
            config.logging.dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("LANGFEED_LOG_FILE") {
            config.logging.file_name = val;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_ranking_table() {
        let weights = RankerWeights::default();
        assert!(weights.due > weights.weak);
        assert!(weights.weak > weights.target);
        assert_eq!(RankerConfig::default().recent_topic_window, 10);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("LANGFEED_TEST_GARBAGE", "ten");
        assert_eq!(env_parse::<usize>("LANGFEED_TEST_GARBAGE"), None);
        std::env::set_var("LANGFEED_TEST_NUMBER", " 12 ");
        assert_eq!(env_parse::<usize>("LANGFEED_TEST_NUMBER"), Some(12));
    }
}
