//! XP, achievements and daily goals.
//!
//! The ledger never feeds back into ranking or scheduling; it only reads the
//! learner's streak, vocabulary counts and estimated level.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::GamificationConfig;
use crate::services::streak::{streak_milestone, StreakState};
use crate::types::CefrLevel;

const LEVEL_UP_BONUS: u64 = 100;
const COURAGE_BONUS: f64 = 1.5;
const PERFECTION_BONUS: f64 = 1.3;
const STREAK_WEEK_BONUS: f64 = 1.2;
const STREAK_MONTH_BONUS: f64 = 1.5;
const FIRST_TIME_BONUS: f64 = 1.25;
const VOCABULARY_MILESTONES: [u32; 6] = [10, 50, 100, 500, 1000, 2000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    VideoWatch,
    VideoComplete,
    WordClick,
    WordSave,
    QuizAttempt,
    QuizPerfect,
    DailyLogin,
    StreakMaintain,
    LevelUp,
    ChallengeHardContent,
}

impl ActivityType {
    pub fn base_xp(self) -> u64 {
        match self {
            Self::VideoWatch => 10,
            Self::VideoComplete => 20,
            Self::WordClick => 5,
            Self::WordSave => 10,
            Self::QuizAttempt => 15,
            Self::QuizPerfect => 50,
            Self::DailyLogin => 5,
            Self::StreakMaintain => 20,
            Self::LevelUp => LEVEL_UP_BONUS,
            Self::ChallengeHardContent => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub kind: ActivityType,
    #[serde(default)]
    pub perfect: bool,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub first_time: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_level: Option<CefrLevel>,
}

impl Activity {
    pub fn new(kind: ActivityType) -> Self {
        Self {
            kind,
            perfect: false,
            current_streak: 0,
            first_time: false,
            content_level: None,
        }
    }

    pub fn with_content_level(mut self, level: CefrLevel) -> Self {
        self.content_level = Some(level);
        self
    }

    /// A perfect quiz, whether reported as its own kind or as a flagged attempt.
    pub fn is_perfect_quiz(&self) -> bool {
        match self.kind {
            ActivityType::QuizPerfect => true,
            ActivityType::QuizAttempt => self.perfect,
            _ => false,
        }
    }
}

/// Every multiplier applied to one award. Factors that did not apply are 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpBreakdown {
    pub base: u64,
    pub level_multiplier: f64,
    pub courage_bonus: f64,
    pub perfection_bonus: f64,
    pub streak_bonus: f64,
    pub first_time_bonus: f64,
}

impl XpBreakdown {
    pub fn product(&self) -> f64 {
        self.base as f64
            * self.level_multiplier
            * self.courage_bonus
            * self.perfection_bonus
            * self.streak_bonus
            * self.first_time_bonus
    }

    pub fn is_courageous(&self) -> bool {
        self.courage_bonus > 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: u32,
    pub current_xp: u64,
    pub next_level_xp: u64,
    /// Percent of the way from zero to `next_level_xp`.
    pub progress: u32,
}

/// Cumulative XP needed to reach `level`: `sum(k * 50)` for k in 2..=level.
fn level_threshold(level: u64) -> u128 {
    let n = u128::from(level);
    25 * n * n + 25 * n - 50
}

/// Level N needs `25N² + 25N - 50` cumulative XP. The float estimate is
/// corrected against the exact integer thresholds.
pub fn level_from_xp(xp: u64) -> LevelInfo {
    let target = u128::from(xp);
    let estimate = ((1.0 + 4.0 * (xp as f64 + 50.0) / 25.0).sqrt() - 1.0) / 2.0;
    let mut level = (estimate.floor() as u64).max(1);
    while level > 1 && level_threshold(level) > target {
        level -= 1;
    }
    while level_threshold(level + 1) <= target {
        level += 1;
    }

    let next_level_xp = u64::try_from(level_threshold(level + 1)).unwrap_or(u64::MAX);
    LevelInfo {
        level: u32::try_from(level).unwrap_or(u32::MAX),
        current_xp: xp,
        next_level_xp,
        progress: ((xp as f64 / next_level_xp as f64) * 100.0).round() as u32,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAward {
    /// XP granted by this call, level-up bonus included.
    pub xp: u64,
    pub breakdown: XpBreakdown,
    pub total_xp: u64,
    pub level: LevelInfo,
    pub leveled_up: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Requirement {
    VideosWatched(u32),
    WordsLearned(u32),
    Streak(u32),
    PerfectQuizzes(u32),
    Courage(u32),
    WordsInDay(u32),
    Level(CefrLevel),
    /// Activity strictly before this hour.
    HourBefore(u32),
    /// Activity at or after this hour.
    HourFrom(u32),
    Weekend,
    DailyGoalMet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub requirement: Requirement,
    pub xp: u64,
}

const fn def(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    requirement: Requirement,
    xp: u64,
) -> AchievementDef {
    AchievementDef {
        id,
        title,
        description,
        requirement,
        xp,
    }
}

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    def("first_word", "First Steps", "Learned your first word", Requirement::WordsLearned(1), 10),
    def("vocab_10", "Getting Started", "Learned 10 words", Requirement::WordsLearned(10), 50),
    def("vocab_50", "Word Collector", "Learned 50 words", Requirement::WordsLearned(50), 100),
    def("vocab_100", "Vocabulary Builder", "Learned 100 words", Requirement::WordsLearned(100), 200),
    def("vocab_500", "Polyglot Path", "Learned 500 words", Requirement::WordsLearned(500), 500),
    def("vocab_1000", "Word Master", "Learned 1000 words", Requirement::WordsLearned(1000), 1000),
    def("vocab_2000", "Language Ninja", "Learned 2000 words", Requirement::WordsLearned(2000), 2000),
    def("streak_3", "Committed", "3-day learning streak", Requirement::Streak(3), 30),
    def("streak_7", "Week Warrior", "7-day learning streak", Requirement::Streak(7), 70),
    def("streak_30", "Monthly Master", "30-day learning streak", Requirement::Streak(30), 300),
    def("streak_100", "Centurion", "100-day learning streak", Requirement::Streak(100), 1000),
    def("streak_365", "Year of Learning", "365-day learning streak", Requirement::Streak(365), 5000),
    def("video_1", "First Watch", "Completed first video", Requirement::VideosWatched(1), 10),
    def("video_10", "Binge Learner", "Completed 10 videos", Requirement::VideosWatched(10), 50),
    def("video_100", "Video Veteran", "Completed 100 videos", Requirement::VideosWatched(100), 500),
    def("quiz_perfect_first", "Perfect Score", "First perfect quiz", Requirement::PerfectQuizzes(1), 50),
    def("quiz_perfect_10", "Quiz Master", "10 perfect quizzes", Requirement::PerfectQuizzes(10), 200),
    def("courage_first", "Brave Learner", "Tried content above your level", Requirement::Courage(1), 25),
    def("courage_10", "Fear Conqueror", "Challenged yourself 10 times", Requirement::Courage(10), 100),
    def("fast_learner", "Quick Study", "Learned 20 words in one day", Requirement::WordsInDay(20), 100),
    def("level_a2", "Elementary", "Reached A2 level", Requirement::Level(CefrLevel::A2), 200),
    def("level_b1", "Intermediate", "Reached B1 level", Requirement::Level(CefrLevel::B1), 500),
    def("level_b2", "Upper Intermediate", "Reached B2 level", Requirement::Level(CefrLevel::B2), 1000),
    def("level_c1", "Advanced", "Reached C1 level", Requirement::Level(CefrLevel::C1), 2000),
    def("level_c2", "C2 Mastery", "Reached C2 level", Requirement::Level(CefrLevel::C2), 5000),
    def("early_bird", "Early Bird", "Studied before 8 AM", Requirement::HourBefore(8), 50),
    def("night_owl", "Night Owl", "Studied after 10 PM", Requirement::HourFrom(22), 50),
    def("weekend_warrior", "Weekend Warrior", "Studied on a weekend", Requirement::Weekend, 50),
    def("perfect_day", "Perfect Day", "Met the daily word goal", Requirement::DailyGoalMet, 25),
];

pub fn find_achievement(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Cumulative per-user ledger. Unlocks are one-way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub total_xp: u64,
    pub unlocked: BTreeMap<String, DateTime<Utc>>,
    pub videos_watched: u32,
    pub perfect_quizzes: u32,
    pub courage_challenges: u32,
}

impl LedgerState {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains_key(id)
    }
}

/// Point-in-time view of the learner the achievement predicates run against.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub words_learned: u32,
    pub words_today: u32,
    pub current_streak: u32,
    pub level: CefrLevel,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp: u64,
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedAchievement {
    fn from_def(def: &AchievementDef, unlocked_at: DateTime<Utc>) -> Self {
        Self {
            id: def.id.to_string(),
            title: def.title.to_string(),
            description: def.description.to_string(),
            xp: def.xp,
            unlocked_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGoalProgress {
    pub progress: u32,
    pub goal: u32,
    pub complete: bool,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub current: u32,
    pub target: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
    pub total_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularySummary {
    pub total: u32,
    pub today: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    pub earned: Vec<UnlockedAchievement>,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub xp: u64,
    pub level: LevelInfo,
    pub streak: StreakSummary,
    pub vocabulary: VocabularySummary,
    pub achievements: AchievementSummary,
    pub daily_goal: DailyGoalProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_milestone: Option<Milestone>,
}

#[derive(Debug, Clone, Default)]
pub struct GamificationLedger {
    config: GamificationConfig,
}

impl GamificationLedger {
    pub fn new(config: GamificationConfig) -> Self {
        Self { config }
    }

    /// Base XP scaled by the learner's level, then by each bonus that applies.
    pub fn calculate_xp(&self, activity: &Activity, user_level: CefrLevel) -> XpBreakdown {
        let courageous = activity.content_level.is_some_and(|content| content > user_level);
        let mut streak_bonus = 1.0;
        if activity.current_streak > 7 {
            streak_bonus *= STREAK_WEEK_BONUS;
        }
        if activity.current_streak > 30 {
            streak_bonus *= STREAK_MONTH_BONUS;
        }

        XpBreakdown {
            base: activity.kind.base_xp(),
            level_multiplier: user_level.xp_multiplier(),
            courage_bonus: if courageous { COURAGE_BONUS } else { 1.0 },
            perfection_bonus: if activity.perfect { PERFECTION_BONUS } else { 1.0 },
            streak_bonus,
            first_time_bonus: if activity.first_time { FIRST_TIME_BONUS } else { 1.0 },
        }
    }

    pub fn award_xp(
        &self,
        state: &mut LedgerState,
        activity: &Activity,
        user_level: CefrLevel,
    ) -> XpAward {
        let breakdown = self.calculate_xp(activity, user_level);
        let mut xp = breakdown.product().round() as u64;

        if activity.kind == ActivityType::VideoComplete {
            state.videos_watched = state.videos_watched.saturating_add(1);
        }
        if activity.is_perfect_quiz() {
            state.perfect_quizzes = state.perfect_quizzes.saturating_add(1);
        }
        if breakdown.is_courageous() {
            state.courage_challenges = state.courage_challenges.saturating_add(1);
        }

        let before = level_from_xp(state.total_xp);
        state.total_xp = state.total_xp.saturating_add(xp);
        let mut level = level_from_xp(state.total_xp);
        let leveled_up = level.level > before.level;
        if leveled_up {
            xp += LEVEL_UP_BONUS;
            state.total_xp = state.total_xp.saturating_add(LEVEL_UP_BONUS);
            level = level_from_xp(state.total_xp);
            tracing::info!(level = level.level, total_xp = state.total_xp, "level up");
        }

        XpAward {
            xp,
            breakdown,
            total_xp: state.total_xp,
            level,
            leveled_up,
        }
    }

    pub fn meets(&self, requirement: Requirement, state: &LedgerState, progress: &ProgressSnapshot) -> bool {
        match requirement {
            Requirement::VideosWatched(n) => state.videos_watched >= n,
            Requirement::WordsLearned(n) => progress.words_learned >= n,
            Requirement::Streak(n) => progress.current_streak >= n,
            Requirement::PerfectQuizzes(n) => state.perfect_quizzes >= n,
            Requirement::Courage(n) => state.courage_challenges >= n,
            Requirement::WordsInDay(n) => progress.words_today >= n,
            Requirement::Level(level) => progress.level >= level,
            Requirement::HourBefore(hour) => progress.at.hour() < hour,
            Requirement::HourFrom(hour) => progress.at.hour() >= hour,
            Requirement::Weekend => matches!(progress.at.weekday(), Weekday::Sat | Weekday::Sun),
            Requirement::DailyGoalMet => progress.words_today >= self.config.daily_word_goal,
        }
    }

    /// Unlocks every catalog entry whose predicate now holds, at most once
    /// each, crediting its XP.
    pub fn check_achievements(
        &self,
        state: &mut LedgerState,
        progress: &ProgressSnapshot,
    ) -> Vec<UnlockedAchievement> {
        let mut unlocked = Vec::new();
        for achievement in ACHIEVEMENTS {
            if state.is_unlocked(achievement.id) || !self.meets(achievement.requirement, state, progress) {
                continue;
            }
            state.unlocked.insert(achievement.id.to_string(), progress.at);
            state.total_xp = state.total_xp.saturating_add(achievement.xp);
            tracing::info!(achievement = achievement.id, xp = achievement.xp, "achievement unlocked");
            unlocked.push(UnlockedAchievement::from_def(achievement, progress.at));
        }
        unlocked
    }

    pub fn daily_goal(&self, words_today: u32) -> DailyGoalProgress {
        let goal = self.config.daily_word_goal.max(1);
        DailyGoalProgress {
            progress: words_today,
            goal,
            complete: words_today >= goal,
            percentage: ((words_today as f64 / goal as f64) * 100.0).round().min(100.0) as u32,
        }
    }

    pub fn next_milestone(&self, total_words: u32) -> Option<Milestone> {
        VOCABULARY_MILESTONES
            .into_iter()
            .find(|target| total_words < *target)
            .map(|target| Milestone {
                current: total_words,
                target,
                remaining: target - total_words,
            })
    }

    pub fn dashboard(
        &self,
        state: &LedgerState,
        streak: &StreakState,
        total_words: u32,
        words_today: u32,
        now: DateTime<Utc>,
    ) -> Dashboard {
        let current = streak.current_as_of(now.date_naive());
        let earned: Vec<UnlockedAchievement> = state
            .unlocked
            .iter()
            .filter_map(|(id, at)| find_achievement(id).map(|def| UnlockedAchievement::from_def(def, *at)))
            .collect();
        let percentage = ((earned.len() as f64 / ACHIEVEMENTS.len() as f64) * 100.0).round() as u32;

        Dashboard {
            xp: state.total_xp,
            level: level_from_xp(state.total_xp),
            streak: StreakSummary {
                current,
                longest: streak.longest_streak,
                total_days: streak.learning_days,
                milestone: streak_milestone(current).map(str::to_string),
            },
            vocabulary: VocabularySummary {
                total: total_words,
                today: words_today,
            },
            achievements: AchievementSummary {
                earned,
                total: ACHIEVEMENTS.len(),
                percentage,
            },
            daily_goal: self.daily_goal(words_today),
            next_milestone: self.next_milestone(total_words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        // 2024-01-10 is a Wednesday
        Utc.with_ymd_and_hms(2024, 1, 10, hour, 0, 0).unwrap()
    }

    fn snapshot(hour: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            words_learned: 0,
            words_today: 0,
            current_streak: 0,
            level: CefrLevel::A1,
            at: at(hour),
        }
    }

    #[test]
    fn test_level_from_xp_progression() {
        assert_eq!(level_from_xp(0).level, 1);
        assert_eq!(level_from_xp(0).next_level_xp, 100);
        assert_eq!(level_from_xp(99).level, 1);
        assert_eq!(level_from_xp(100).level, 2);
        assert_eq!(level_from_xp(100).next_level_xp, 250);
        assert_eq!(level_from_xp(250).level, 3);
        assert_eq!(level_from_xp(249).level, 2);
        // 25 * 100^2 + 25 * 100 - 50
        assert_eq!(level_from_xp(252_450).level, 100);
        assert_eq!(level_from_xp(252_449).level, 99);
    }

    #[test]
    fn test_level_from_xp_is_total_at_u64_max() {
        let info = level_from_xp(u64::MAX);
        assert!(info.level > 800_000_000);
        assert_eq!(info.current_xp, u64::MAX);
        assert!(info.next_level_xp >= info.current_xp);
        assert!(info.progress <= 100);

        let ledger = GamificationLedger::default();
        let mut state = LedgerState {
            total_xp: u64::MAX - 5,
            ..LedgerState::default()
        };
        let award = ledger.award_xp(&mut state, &Activity::new(ActivityType::QuizPerfect), CefrLevel::A1);
        assert_eq!(state.total_xp, u64::MAX);
        assert_eq!(award.total_xp, u64::MAX);
    }

    #[test]
    fn test_flagged_perfect_attempt_counts_as_perfect_quiz() {
        let ledger = GamificationLedger::default();
        let mut state = LedgerState::default();
        let attempt = Activity {
            perfect: true,
            ..Activity::new(ActivityType::QuizAttempt)
        };
        assert!(attempt.is_perfect_quiz());
        assert!(!Activity::new(ActivityType::QuizAttempt).is_perfect_quiz());

        let award = ledger.award_xp(&mut state, &attempt, CefrLevel::A1);
        assert!((award.breakdown.perfection_bonus - 1.3).abs() < 1e-9);
        assert_eq!(state.perfect_quizzes, 1);
    }

    #[test]
    fn test_bonuses_compound_multiplicatively() {
        let ledger = GamificationLedger::default();
        let activity = Activity {
            kind: ActivityType::QuizPerfect,
            perfect: true,
            current_streak: 31,
            first_time: true,
            content_level: Some(CefrLevel::B2),
        };
        let breakdown = ledger.calculate_xp(&activity, CefrLevel::B1);
        let expected = 50.0 * 1.5 * 1.5 * 1.3 * 1.2 * 1.5 * 1.25;
        assert!((breakdown.product() - expected).abs() < 1e-9);
        assert!((breakdown.streak_bonus - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_no_courage_for_content_at_level() {
        let ledger = GamificationLedger::default();
        let activity = Activity::new(ActivityType::VideoWatch).with_content_level(CefrLevel::A2);
        let breakdown = ledger.calculate_xp(&activity, CefrLevel::A2);
        assert_eq!(breakdown.courage_bonus, 1.0);
        assert!((breakdown.product() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_award_adds_level_up_bonus() {
        let ledger = GamificationLedger::default();
        let mut state = LedgerState {
            total_xp: 95,
            ..LedgerState::default()
        };
        let award = ledger.award_xp(&mut state, &Activity::new(ActivityType::VideoWatch), CefrLevel::A1);
        assert!(award.leveled_up);
        assert_eq!(award.xp, 110);
        assert_eq!(state.total_xp, 205);
        assert_eq!(award.level.level, 2);
    }

    #[test]
    fn test_counters_follow_activity_kind() {
        let ledger = GamificationLedger::default();
        let mut state = LedgerState::default();
        ledger.award_xp(&mut state, &Activity::new(ActivityType::VideoComplete), CefrLevel::A1);
        ledger.award_xp(
            &mut state,
            &Activity::new(ActivityType::QuizPerfect).with_content_level(CefrLevel::C1),
            CefrLevel::A1,
        );
        assert_eq!(state.videos_watched, 1);
        assert_eq!(state.perfect_quizzes, 1);
        assert_eq!(state.courage_challenges, 1);
    }

    #[test]
    fn test_achievements_unlock_once() {
        let ledger = GamificationLedger::default();
        let mut state = LedgerState::default();
        let mut progress = snapshot(12);
        progress.words_learned = 12;

        let first = ledger.check_achievements(&mut state, &progress);
        let ids: Vec<&str> = first.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_word", "vocab_10"]);
        assert_eq!(state.total_xp, 60);

        assert!(ledger.check_achievements(&mut state, &progress).is_empty());
        assert_eq!(state.total_xp, 60);
    }

    #[test]
    fn test_time_of_day_achievements() {
        let ledger = GamificationLedger::default();
        let state = LedgerState::default();
        assert!(ledger.meets(Requirement::HourBefore(8), &state, &snapshot(7)));
        assert!(!ledger.meets(Requirement::HourBefore(8), &state, &snapshot(8)));
        assert!(ledger.meets(Requirement::HourFrom(22), &state, &snapshot(22)));
        assert!(!ledger.meets(Requirement::Weekend, &state, &snapshot(12)));

        let mut saturday = snapshot(12);
        saturday.at = Utc.with_ymd_and_hms(2024, 1, 13, 12, 0, 0).unwrap();
        assert!(ledger.meets(Requirement::Weekend, &state, &saturday));
    }

    #[test]
    fn test_level_requirement_is_at_least() {
        let ledger = GamificationLedger::default();
        let state = LedgerState::default();
        let mut progress = snapshot(12);
        progress.level = CefrLevel::B2;
        assert!(ledger.meets(Requirement::Level(CefrLevel::B1), &state, &progress));
        assert!(!ledger.meets(Requirement::Level(CefrLevel::C1), &state, &progress));
    }

    #[test]
    fn test_daily_goal_and_milestone() {
        let ledger = GamificationLedger::default();
        let goal = ledger.daily_goal(15);
        assert!(goal.complete);
        assert_eq!(goal.percentage, 100);
        assert_eq!(ledger.daily_goal(3).percentage, 30);

        let milestone = ledger.next_milestone(42).unwrap();
        assert_eq!(milestone.target, 50);
        assert_eq!(milestone.remaining, 8);
        assert!(ledger.next_milestone(2000).is_none());
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
    }
}
