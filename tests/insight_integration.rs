// SPDX-License-Identifier: MIT

//! End-to-end insight aggregation tests against the Firestore emulator.

use chrono::{DateTime, TimeZone, Utc};
use goalympian_insights::config::ArgmaxMode;
use goalympian_insights::db::FirestoreDb;
use goalympian_insights::models::{
    activity::ResistanceSet, ActivitySet, SetType, Workout, WorkoutActivity, WorkoutInsight,
};
use goalympian_insights::period::month_bounds;

mod common;
use common::{test_db, test_service};

fn workout_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 15, 18, 30, 0).unwrap()
}

fn make_activity(exercise_id: &str) -> WorkoutActivity {
    WorkoutActivity {
        exercise_id: exercise_id.to_string(),
        set_type: SetType::Resistance,
        workout_index: 0,
        activity_sets: vec![ActivitySet::Resistance(ResistanceSet {
            id: "set-0".to_string(),
            set_index: 0,
            weight: 80.0,
            repetitions: 5,
        })],
    }
}

/// Seed a workout, one activity under it, and an empty insight document
/// covering the workout's month.
async fn seed(
    db: &FirestoreDb,
    user_id: &str,
    workout_id: &str,
    activity_id: &str,
    exercise_id: &str,
    insight_id: &str,
) {
    let workout = Workout {
        user_id: user_id.to_string(),
        date: workout_date(),
    };
    db.set_workout(workout_id, &workout)
        .await
        .expect("seed workout");

    db.set_activity(workout_id, activity_id, &make_activity(exercise_id))
        .await
        .expect("seed activity");

    let (period_start, _) = month_bounds(workout_date());
    db.set_insight(user_id, insight_id, &WorkoutInsight::new(period_start))
        .await
        .expect("seed insight");
}

#[tokio::test]
async fn test_event_updates_matching_insight() {
    require_emulator!();
    let db = test_db().await;
    let service = test_service(&db, ArgmaxMode::Incremental);
    let user = "user-single";

    seed(&db, user, "w-single", "a-single", "squat", "2026-02").await;

    let report = service
        .handle_activity_created("w-single", "a-single")
        .await
        .expect("event handling failed");
    assert_eq!(report.updated.len(), 1);
    assert!(report.failed.is_empty());

    let insight = db
        .get_insight(user, "2026-02")
        .await
        .expect("fetch insight")
        .expect("insight document exists");

    assert_eq!(insight.total_sets, 1);
    assert_eq!(insight.exercise_occurrence_counts.get("squat"), Some(&1));
    assert_eq!(insight.exercise_set_counts.get("squat"), Some(&1));
    assert_eq!(insight.exercise_id_most_activities, "squat");
    assert_eq!(insight.exercise_id_most_sets, "squat");
}

#[tokio::test]
async fn test_tie_keeps_incumbent_then_overtakes() {
    require_emulator!();
    let db = test_db().await;
    let service = test_service(&db, ArgmaxMode::Incremental);
    let user = "user-tie";

    seed(&db, user, "w-tie", "a-tie-1", "B", "2026-02").await;

    // Pre-load the aggregate: A leads with 3 occurrences over B's 2.
    let (period_start, _) = month_bounds(workout_date());
    let mut insight = WorkoutInsight::new(period_start);
    insight
        .exercise_occurrence_counts
        .extend([("A".to_string(), 3), ("B".to_string(), 2)]);
    insight
        .exercise_set_counts
        .extend([("A".to_string(), 3), ("B".to_string(), 2)]);
    insight.total_sets = 5;
    insight.exercise_id_most_activities = "A".to_string();
    insight.exercise_id_most_sets = "A".to_string();
    db.set_insight(user, "2026-02", &insight)
        .await
        .expect("seed insight");

    // B reaches 3: tie, incumbent A keeps the pointer.
    service
        .handle_activity_created("w-tie", "a-tie-1")
        .await
        .expect("event handling failed");

    let after_tie = db
        .get_insight(user, "2026-02")
        .await
        .expect("fetch insight")
        .expect("insight document exists");
    assert_eq!(after_tie.exercise_occurrence_counts.get("B"), Some(&3));
    assert_eq!(after_tie.exercise_id_most_activities, "A");
    assert_eq!(after_tie.exercise_id_most_sets, "A");

    // B reaches 4 > 3: pointer moves.
    db.set_activity("w-tie", "a-tie-2", &make_activity("B"))
        .await
        .expect("seed second activity");
    service
        .handle_activity_created("w-tie", "a-tie-2")
        .await
        .expect("event handling failed");

    let after_overtake = db
        .get_insight(user, "2026-02")
        .await
        .expect("fetch insight")
        .expect("insight document exists");
    assert_eq!(
        after_overtake.exercise_occurrence_counts.get("B"),
        Some(&4)
    );
    assert_eq!(after_overtake.exercise_id_most_activities, "B");
    assert_eq!(after_overtake.exercise_id_most_sets, "B");
    assert_eq!(after_overtake.total_sets, 7);
}

#[tokio::test]
async fn test_zero_matching_insights_is_noop() {
    require_emulator!();
    let db = test_db().await;
    let service = test_service(&db, ArgmaxMode::Incremental);

    // Workout and activity exist, but no insight document for the period.
    let workout = Workout {
        user_id: "user-noop".to_string(),
        date: workout_date(),
    };
    db.set_workout("w-noop", &workout).await.expect("seed workout");
    db.set_activity("w-noop", "a-noop", &make_activity("squat"))
        .await
        .expect("seed activity");

    let report = service
        .handle_activity_created("w-noop", "a-noop")
        .await
        .expect("no-op must not be an error");

    assert_eq!(report.matched(), 0);
}

#[tokio::test]
async fn test_missing_workout_is_noop() {
    require_emulator!();
    let db = test_db().await;
    let service = test_service(&db, ArgmaxMode::Incremental);

    let report = service
        .handle_activity_created("w-ghost", "a-ghost")
        .await
        .expect("missing documents must not be an error");

    assert_eq!(report.matched(), 0);
}

#[tokio::test]
async fn test_two_matching_insights_both_updated() {
    require_emulator!();
    let db = test_db().await;
    let service = test_service(&db, ArgmaxMode::Incremental);
    let user = "user-dup-period";

    seed(&db, user, "w-dup", "a-dup", "squat", "2026-02-a").await;
    let (period_start, _) = month_bounds(workout_date());
    db.set_insight(user, "2026-02-b", &WorkoutInsight::new(period_start))
        .await
        .expect("seed second insight");

    let report = service
        .handle_activity_created("w-dup", "a-dup")
        .await
        .expect("event handling failed");

    assert_eq!(report.updated.len(), 2);
    for insight_id in ["2026-02-a", "2026-02-b"] {
        let insight = db
            .get_insight(user, insight_id)
            .await
            .expect("fetch insight")
            .expect("insight document exists");
        assert_eq!(insight.total_sets, 1);
        assert_eq!(insight.exercise_id_most_activities, "squat");
    }
}

const NUM_CONCURRENT_EVENTS: usize = 10;

#[tokio::test]
async fn test_concurrent_events_transactional_counts_are_exact() {
    require_emulator!();
    let db = test_db().await;
    let user = "user-race";

    seed(&db, user, "w-race", "a-race-0", "squat", "2026-02").await;
    for i in 1..NUM_CONCURRENT_EVENTS {
        db.set_activity("w-race", &format!("a-race-{}", i), &make_activity("squat"))
            .await
            .expect("seed activity");
    }

    let mut handles = vec![];
    for i in 0..NUM_CONCURRENT_EVENTS {
        let db_clone = db.clone();
        handles.push(tokio::spawn(async move {
            let service = test_service(&db_clone, ArgmaxMode::Transactional);
            service
                .handle_activity_created("w-race", &format!("a-race-{}", i))
                .await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("Task join failed")
            .expect("Event processing failed");
    }

    let insight = db
        .get_insight(user, "2026-02")
        .await
        .expect("fetch insight")
        .expect("insight document exists");

    assert_eq!(
        insight.total_sets, NUM_CONCURRENT_EVENTS as u32,
        "Lost increments under concurrent transactional commits"
    );
    assert_eq!(
        insight.exercise_occurrence_counts.get("squat"),
        Some(&(NUM_CONCURRENT_EVENTS as u32))
    );
    assert_eq!(insight.exercise_id_most_activities, "squat");
}

#[tokio::test]
async fn test_concurrent_redelivery_applies_once() {
    require_emulator!();
    let db = test_db().await;
    let user = "user-race-redelivery";

    seed(&db, user, "w-cre", "a-cre", "squat", "2026-02").await;

    // The same event delivered several times at once: the transactional
    // duplicate check must hold even when the deliveries interleave.
    let mut handles = vec![];
    for _ in 0..4 {
        let db_clone = db.clone();
        handles.push(tokio::spawn(async move {
            let service = test_service(&db_clone, ArgmaxMode::Transactional);
            service.handle_activity_created("w-cre", "a-cre").await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("Task join failed")
            .expect("Event processing failed");
    }

    let insight = db
        .get_insight(user, "2026-02")
        .await
        .expect("fetch insight")
        .expect("insight document exists");
    assert_eq!(
        insight.total_sets, 1,
        "Concurrent redelivery must apply exactly once"
    );
    assert_eq!(insight.exercise_occurrence_counts.get("squat"), Some(&1));
}

#[tokio::test]
async fn test_redelivered_event_skipped_in_transactional_mode() {
    require_emulator!();
    let db = test_db().await;
    let service = test_service(&db, ArgmaxMode::Transactional);
    let user = "user-redelivery";

    seed(&db, user, "w-re", "a-re", "squat", "2026-02").await;

    let first = service
        .handle_activity_created("w-re", "a-re")
        .await
        .expect("event handling failed");
    assert_eq!(first.updated.len(), 1);

    let second = service
        .handle_activity_created("w-re", "a-re")
        .await
        .expect("redelivery must not be an error");
    assert_eq!(second.skipped.len(), 1);
    assert!(second.updated.is_empty());

    let insight = db
        .get_insight(user, "2026-02")
        .await
        .expect("fetch insight")
        .expect("insight document exists");
    assert_eq!(insight.total_sets, 1, "Redelivery double-counted");
}
