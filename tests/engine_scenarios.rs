//! End-to-end scenarios against the public `LearningEngine` facade.

use chrono::{DateTime, Duration, TimeZone, Utc};

use langfeed_engine::services::gamification::{Activity, ActivityType};
use langfeed_engine::services::profile::{Signal, VideoWatched};
use langfeed_engine::services::ranker::CandidateItem;
use langfeed_engine::services::streak::StreakChange;
use langfeed_engine::{CefrLevel, EngineConfig, LearningEngine};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap()
}

fn engine() -> LearningEngine {
    LearningEngine::in_memory(EngineConfig::default())
}

fn item(id: &str, text: &str) -> CandidateItem {
    CandidateItem::new(id, vec![text.to_string()])
}

#[test]
fn hola_three_perfect_reviews() {
    let engine = engine();
    let encounter = engine.record_encounter_at("ana", "hola", None, t0()).unwrap();
    assert!(encounter.encounter.is_new);

    let first = engine.review_word_at("ana", "hola", 5, t0()).unwrap();
    let second = engine
        .review_word_at("ana", "hola", 5, first.review.next_review_at)
        .unwrap();
    let third = engine
        .review_word_at("ana", "hola", 5, second.review.next_review_at)
        .unwrap();

    let intervals = [
        first.review.interval_days,
        second.review.interval_days,
        third.review.interval_days,
    ];
    // ease is 2.7 going into the third review
    assert_eq!(intervals, [1, 6, (6.0_f64 * 2.7).round() as u32]);
    assert_eq!(third.review.repetitions, 3);
    assert_eq!(third.review.mastery_level, 1);
    assert!((third.review.ease_factor - 2.8).abs() < 1e-9);
    assert!(!third.review.created);
}

#[test]
fn lapse_brings_word_back_tomorrow() {
    let engine = engine();
    engine.review_word_at("ana", "perro", 5, t0()).unwrap();
    engine.review_word_at("ana", "perro", 5, t0() + Duration::days(1)).unwrap();
    let lapse = engine
        .review_word_at("ana", "perro", 1, t0() + Duration::days(7))
        .unwrap();

    assert_eq!(lapse.review.repetitions, 0);
    assert_eq!(lapse.review.interval_days, 1);
    assert_eq!(lapse.review.next_review_at, t0() + Duration::days(8));
}

#[test]
fn due_words_ordered_by_mastery_then_schedule() {
    let engine = engine();
    engine.record_encounter_at("ana", "zapato", None, t0()).unwrap();
    engine.record_encounter_at("ana", "agua", None, t0() + Duration::hours(1)).unwrap();

    let due = engine.get_due_words_at("ana", t0() + Duration::hours(2)).unwrap();
    assert_eq!(due, vec!["zapato", "agua"]);
}

#[test]
fn due_words_rank_above_unrelated_content() {
    let engine = engine();
    engine.review_word_at("ana", "gato", 1, t0()).unwrap();
    let later = t0() + Duration::days(2);

    let ranked = engine
        .recommend_at(
            "ana",
            vec![
                item("unrelated", "perro grande"),
                item("review", "el gato come"),
            ],
            10,
            later,
        )
        .unwrap();

    assert_eq!(ranked[0].item.id, "review");
    assert_eq!(ranked[0].breakdown.due, 12.0);
    assert_eq!(ranked[0].breakdown.weak, 10.0);
    assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn recommend_handles_empty_inputs() {
    let engine = engine();
    assert!(engine.recommend_at("ana", Vec::new(), 5, t0()).unwrap().is_empty());
    assert!(engine
        .recommend_at("ana", vec![item("a", "hola")], 0, t0())
        .unwrap()
        .is_empty());
    let ranked = engine
        .recommend_at("ana", vec![CandidateItem::new("blank", Vec::new())], 5, t0())
        .unwrap();
    assert_eq!(ranked[0].score, 0.0);
}

#[test]
fn recently_watched_topic_loses_freshness_bonus() {
    let engine = engine();
    engine
        .build_profile_at(
            "ana",
            vec![Signal::VideoWatched(VideoWatched {
                id: "v1".to_string(),
                completion_rate: Some(0.8),
                difficulty: Some(50.0),
                topics: vec!["Football".to_string()],
            })],
            t0(),
        )
        .unwrap();

    let mut seen = item("seen", "partido grande");
    seen.topic = "football".to_string();
    let mut fresh = item("fresh", "partido grande");
    fresh.topic = "cooking".to_string();

    let ranked = engine.recommend_at("ana", vec![seen, fresh], 2, t0()).unwrap();
    assert_eq!(ranked[0].item.id, "fresh");
    assert_eq!(ranked[1].breakdown.freshness, 0.0);
}

#[test]
fn streak_continues_across_consecutive_meaningful_days() {
    let engine = engine();
    let words = ["uno", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez"];

    for word in &words[..5] {
        engine.record_encounter_at("ana", word, None, t0()).unwrap();
    }
    let mut last = None;
    for word in &words[5..] {
        last = Some(
            engine
                .record_encounter_at("ana", word, None, t0() + Duration::days(1))
                .unwrap(),
        );
    }
    let streak = last.unwrap().streak;
    assert_eq!(streak.current_streak, 2);
    assert_eq!(streak.change, StreakChange::Extended);

    let dashboard = engine.dashboard_at("ana", t0() + Duration::days(1)).unwrap();
    assert_eq!(dashboard.streak.current, 2);
    assert_eq!(dashboard.vocabulary.total, 10);
    assert_eq!(dashboard.daily_goal.progress, 5);

    // a missed day shows as a broken streak without any new activity
    let later = engine.dashboard_at("ana", t0() + Duration::days(3)).unwrap();
    assert_eq!(later.streak.current, 0);
    assert_eq!(later.streak.longest, 2);
}

#[test]
fn courage_bonus_applies_above_profile_level() {
    let engine = engine();
    let activity = Activity::new(ActivityType::ChallengeHardContent).with_content_level(CefrLevel::C1);
    let result = engine.award_xp_at("ana", activity, t0()).unwrap();

    // default profile level is A2
    assert_eq!(result.award.breakdown.level_multiplier, 1.2);
    assert_eq!(result.award.breakdown.courage_bonus, 1.5);
    assert_eq!(result.award.xp, 54);
    assert!(result.achievements.iter().any(|a| a.id == "courage_first"));
}

#[test]
fn stats_track_mastery_progress() {
    let engine = engine();
    let mut now = t0();
    for _ in 0..5 {
        let result = engine.review_word_at("ana", "casa", 5, now).unwrap();
        now = result.review.next_review_at;
    }
    let stats = engine.stats_at("ana", now).unwrap();
    assert_eq!(stats.total_words, 1);
    assert_eq!(stats.mastered_words, 0);
    assert_eq!(stats.total_words_encountered, 1);

    let record = &engine.search_words("ana", "cas").unwrap()[0];
    assert_eq!(record.mastery_level, 3);
    assert_eq!(record.reviews, 5);
    assert_eq!(record.accuracy(), 1.0);
}
