//! Property-based tests for scheduler, ranker and ledger invariants.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use langfeed_engine::config::{RankerConfig, SchedulerConfig};
use langfeed_engine::services::gamification::level_from_xp;
use langfeed_engine::services::ranker::{CandidateItem, ContentRanker, RankingContext};
use langfeed_engine::services::scheduler::{sm2_step, SpacedRepetitionScheduler, Vocabulary};
use langfeed_engine::{CefrLevel, LengthPreference, ReviewQuality};

// ============================================================================
// Generators
// ============================================================================

fn arb_quality() -> impl Strategy<Value = ReviewQuality> {
    (0u8..=5).prop_map(|q| ReviewQuality::try_from(q).unwrap())
}

fn arb_level() -> impl Strategy<Value = CefrLevel> {
    (0usize..6).prop_map(CefrLevel::from_index)
}

const WORDS: [&str; 8] = ["hola", "gato", "perro", "casa", "agua", "libro", "noche", "tiempo"];

fn arb_transcript() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 0..20).prop_map(|words| vec![words.join(" ")])
}

fn arb_item() -> impl Strategy<Value = CandidateItem> {
    (
        "[a-z]{1,6}",
        arb_transcript(),
        arb_level(),
        prop::sample::select(vec!["news", "sports", "food"]),
        0u32..300,
        proptest::option::of(0i64..1_000_000),
    )
        .prop_map(|(id, transcript, level, topic, duration, published)| {
            let mut item = CandidateItem::new(id, transcript);
            item.level = level;
            item.topic = topic.to_string();
            item.duration_seconds = duration;
            item.published_at = published.map(|s| Utc.timestamp_opt(s, 0).unwrap());
            item
        })
}

fn arb_context() -> impl Strategy<Value = RankingContext> {
    let subset = || prop::collection::hash_set(prop::sample::select(WORDS.to_vec()).prop_map(String::from), 0..5);
    (subset(), subset(), subset(), subset(), arb_level()).prop_map(|(weak, target, due, known, level)| {
        RankingContext {
            weak_words: weak,
            target_words: target,
            due_words: due,
            known_words: known,
            level,
            recent_topics: ["news".to_string()].into_iter().collect(),
            length_preference: LengthPreference::Short,
        }
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn ease_factor_never_drops_below_floor(qualities in prop::collection::vec(arb_quality(), 1..40)) {
        let scheduler = SpacedRepetitionScheduler::new(SchedulerConfig::default());
        let mut vocab = Vocabulary::default();
        let mut now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for quality in qualities {
            let outcome = scheduler.review_word(&mut vocab, "palabra", quality, now);
            prop_assert!(outcome.ease_factor >= 1.3 - 1e-12);
            prop_assert!(outcome.interval_days >= 1);
            prop_assert!(outcome.mastery_level <= 5);
            prop_assert!(outcome.next_review_at > now);
            if !quality.is_success() {
                prop_assert_eq!(outcome.repetitions, 0);
                prop_assert_eq!(outcome.interval_days, 1);
            }
            now += Duration::days(outcome.interval_days as i64);
        }
    }

    #[test]
    fn good_recall_never_lowers_ease_and_third_interval_grows(
        start_ease in 1.3f64..3.0,
        grades in prop::collection::vec(4u8..=5, 3),
    ) {
        let mut ease = start_ease;
        let mut interval = 0;
        let mut reps = 0;
        let mut intervals = Vec::new();

        for grade in grades {
            let step = sm2_step(ReviewQuality::try_from(grade).unwrap(), ease, interval, reps, 1.3);
            prop_assert!(step.ease_factor >= ease);
            ease = step.ease_factor;
            interval = step.interval_days;
            reps = step.repetitions;
            intervals.push(interval);
        }

        prop_assert_eq!(intervals[0], 1);
        prop_assert_eq!(intervals[1], 6);
        prop_assert!(intervals[2] > intervals[1]);
    }

    #[test]
    fn scoring_is_deterministic(item in arb_item(), ctx in arb_context()) {
        let ranker = ContentRanker::new(RankerConfig::default());
        prop_assert_eq!(ranker.score_item(&item, &ctx), ranker.score_item(&item, &ctx));
        prop_assert_eq!(ranker.breakdown(&item, &ctx), ranker.breakdown(&item, &ctx));
    }

    #[test]
    fn scores_are_never_negative(item in arb_item(), ctx in arb_context()) {
        let ranker = ContentRanker::new(RankerConfig::default());
        prop_assert!(ranker.score_item(&item, &ctx) >= 0.0);
    }

    #[test]
    fn recommendations_are_sorted_and_bounded(
        items in prop::collection::vec(arb_item(), 0..15),
        ctx in arb_context(),
        count in 0usize..20,
    ) {
        let ranker = ContentRanker::new(RankerConfig::default());
        let expected_len = items.len().min(count);
        let ranked = ranker.recommend(items, &ctx, count);

        prop_assert_eq!(ranked.len(), expected_len);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn level_is_monotonic_in_xp(a in 0u64..200_000, b in 0u64..200_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_from_xp(lo).level <= level_from_xp(hi).level);
        prop_assert!(level_from_xp(hi).next_level_xp > hi);
    }
}
