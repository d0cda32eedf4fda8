//! Day-granularity learning streaks shared by scheduling and gamification.
//!
//! A day only counts once it is meaningful: enough new words added that day,
//! or a perfect quiz.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
    pub learning_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_date: Option<NaiveDate>,
    pub new_words_today: u32,
    pub perfect_quiz_today: bool,
}

impl StreakState {
    /// The streak as seen on `today`: zero once a full day has been missed.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        match self.last_activity_date {
            Some(last) if last == today || last == today - Duration::days(1) => self.current_streak,
            _ => 0,
        }
    }

    pub fn new_words_on(&self, today: NaiveDate) -> u32 {
        if self.counter_date == Some(today) {
            self.new_words_today
        } else {
            0
        }
    }

    fn roll_day(&mut self, today: NaiveDate) {
        if self.counter_date != Some(today) {
            self.counter_date = Some(today);
            self.new_words_today = 0;
            self.perfect_quiz_today = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// The day did not qualify; nothing changed.
    NotMeaningful,
    /// Today was already counted.
    AlreadyCounted,
    /// Continued from yesterday.
    Extended,
    /// First qualifying day ever, or first after a gap.
    Restarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
    pub change: StreakChange,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub learning_days: u32,
}

impl StreakUpdate {
    fn from_state(change: StreakChange, state: &StreakState) -> Self {
        Self {
            change,
            current_streak: state.current_streak,
            longest_streak: state.longest_streak,
            learning_days: state.learning_days,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StreakTracker {
    meaningful_words_per_day: u32,
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new(5)
    }
}

impl StreakTracker {
    pub fn new(meaningful_words_per_day: u32) -> Self {
        Self {
            meaningful_words_per_day,
        }
    }

    pub fn note_new_word(&self, state: &mut StreakState, today: NaiveDate) {
        state.roll_day(today);
        state.new_words_today += 1;
    }

    pub fn note_perfect_quiz(&self, state: &mut StreakState, today: NaiveDate) {
        state.roll_day(today);
        state.perfect_quiz_today = true;
    }

    pub fn is_meaningful(&self, state: &StreakState, today: NaiveDate) -> bool {
        state.counter_date == Some(today)
            && (state.new_words_today >= self.meaningful_words_per_day || state.perfect_quiz_today)
    }

    /// Evaluates today's counters and advances the streak when they qualify.
    pub fn update(&self, state: &mut StreakState, today: NaiveDate) -> StreakUpdate {
        let meaningful = self.is_meaningful(state, today);
        self.record_activity_day(state, today, meaningful)
    }

    pub fn record_activity_day(
        &self,
        state: &mut StreakState,
        today: NaiveDate,
        meaningful: bool,
    ) -> StreakUpdate {
        if !meaningful {
            return StreakUpdate::from_state(StreakChange::NotMeaningful, state);
        }
        if state.last_activity_date == Some(today) {
            return StreakUpdate::from_state(StreakChange::AlreadyCounted, state);
        }

        let change = if state.last_activity_date == Some(today - Duration::days(1)) {
            state.current_streak += 1;
            StreakChange::Extended
        } else {
            state.current_streak = 1;
            StreakChange::Restarted
        };
        state.longest_streak = state.longest_streak.max(state.current_streak);
        state.last_activity_date = Some(today);
        state.learning_days += 1;

        tracing::info!(
            streak = state.current_streak,
            longest = state.longest_streak,
            change = ?change,
            "streak updated"
        );

        StreakUpdate::from_state(change, state)
    }
}

pub fn streak_milestone(streak: u32) -> Option<&'static str> {
    match streak {
        3 => Some("3 days! You're building a habit!"),
        7 => Some("One week! You're on fire!"),
        14 => Some("Two weeks! Impressive dedication!"),
        30 => Some("30 days! You're a learning machine!"),
        60 => Some("Two months! Unstoppable!"),
        100 => Some("100 days! You're a legend!"),
        365 => Some("One year! You're a language master!"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_first_meaningful_day_starts_at_one() {
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        let update = tracker.record_activity_day(&mut state, day(1), true);
        assert_eq!(update.change, StreakChange::Restarted);
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 1);
    }

    #[test]
    fn test_consecutive_day_extends() {
        // Monday then Tuesday
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        tracker.record_activity_day(&mut state, day(1), true);
        let update = tracker.record_activity_day(&mut state, day(2), true);
        assert_eq!(update.change, StreakChange::Extended);
        assert_eq!(update.current_streak, 2);
    }

    #[test]
    fn test_gap_restarts_at_one() {
        // Monday then Thursday
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        tracker.record_activity_day(&mut state, day(1), true);
        tracker.record_activity_day(&mut state, day(2), true);
        let update = tracker.record_activity_day(&mut state, day(5), true);
        assert_eq!(update.change, StreakChange::Restarted);
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 2);
    }

    #[test]
    fn test_same_day_is_noop() {
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        tracker.record_activity_day(&mut state, day(1), true);
        let update = tracker.record_activity_day(&mut state, day(1), true);
        assert_eq!(update.change, StreakChange::AlreadyCounted);
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.learning_days, 1);
    }

    #[test]
    fn test_trivial_activity_does_not_count() {
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        for _ in 0..4 {
            tracker.note_new_word(&mut state, day(1));
        }
        assert_eq!(tracker.update(&mut state, day(1)).change, StreakChange::NotMeaningful);

        tracker.note_new_word(&mut state, day(1));
        assert_eq!(tracker.update(&mut state, day(1)).change, StreakChange::Restarted);
    }

    #[test]
    fn test_perfect_quiz_qualifies() {
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        tracker.note_perfect_quiz(&mut state, day(3));
        assert!(tracker.is_meaningful(&state, day(3)));
        assert!(!tracker.is_meaningful(&state, day(4)));
    }

    #[test]
    fn test_counters_roll_over_at_midnight() {
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        for _ in 0..5 {
            tracker.note_new_word(&mut state, day(1));
        }
        tracker.note_new_word(&mut state, day(2));
        assert_eq!(state.new_words_on(day(2)), 1);
        assert_eq!(state.new_words_on(day(1)), 0);
    }

    #[test]
    fn test_current_as_of_decays_after_gap() {
        let tracker = StreakTracker::default();
        let mut state = StreakState::default();
        tracker.record_activity_day(&mut state, day(1), true);
        assert_eq!(state.current_as_of(day(2)), 1);
        assert_eq!(state.current_as_of(day(3)), 0);
    }

    #[test]
    fn test_milestones() {
        assert!(streak_milestone(7).is_some());
        assert!(streak_milestone(8).is_none());
    }
}
