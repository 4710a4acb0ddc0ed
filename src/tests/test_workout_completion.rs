#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use crate::auth::identity::Identity;
    use crate::models::session::{NewExercise, SetUpdate};
    use crate::models::workout::WeightUnit;
    use crate::store::ContentStore;
    use crate::store::memory::MemoryStore;
    use crate::tracker::clock::{Clock, ManualClock};
    use crate::tracker::completion::{CompletionError, complete_workout};
    use crate::tracker::session::SessionTracker;

    fn identity() -> Identity {
        Identity {
            user_id: "user_1".to_string(),
            display_name: Some("Sam".to_string()),
        }
    }

    fn bench_press_session(clock: &ManualClock) -> SessionTracker<ManualClock> {
        let mut tracker = SessionTracker::with_clock(clock.clone());
        tracker.start_workout().unwrap();
        let ex = tracker.add_exercise(NewExercise::new("Bench Press", "ex1"));
        let set = tracker.add_set(ex).unwrap();
        tracker
            .update_set(ex, set, SetUpdate::default().reps("8").weight("60").completed(true))
            .unwrap();
        tracker
    }

    /// Start, Bench Press with one completed and one open set, complete:
    /// one stored workout holding only the completed set
    #[tokio::test]
    async fn test_bench_press_scenario() {
        let clock = ManualClock::at("2025-09-10T08:00:00Z");
        let store = MemoryStore::default();
        let mut tracker = bench_press_session(&clock);
        let ex = tracker.exercises()[0].id;
        let open_set = tracker.add_set(ex).unwrap();
        tracker
            .update_set(ex, open_set, SetUpdate::default().reps("8").weight("60").completed(false))
            .unwrap();
        assert_eq!(tracker.set_count(), 2);
        clock.advance_secs(95);

        let id = complete_workout(&mut tracker, &store, Some(&identity())).await.unwrap();
        assert_eq!(id, "workout-1");

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        let doc = &saved[0];
        assert_eq!(doc.user_id, "user_1");
        assert_eq!(doc.duration, 95);
        assert_eq!(doc.date, clock.now());
        assert_eq!(doc.exercises.len(), 1);
        assert_eq!(doc.exercises[0].exercise.target, "ex1");
        assert_eq!(doc.exercises[0].sets.len(), 1);
        let set = &doc.exercises[0].sets[0];
        assert_eq!((set.reps, set.weight, set.weight_unit), (8, 60, WeightUnit::Kg));

        // Session is back to its initial state
        assert!(!tracker.is_active());
        assert!(tracker.exercises().is_empty());
        assert_eq!(tracker.state().total_elapsed, 0);

        // Shows up in history; this store has no catalog so the name falls back
        let history = store.list_workouts("user_1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].exercises[0].name(), "Exercise");
        assert_eq!(history[0].total_volume(), 480.0);
    }

    #[tokio::test]
    async fn test_missing_identity_never_reaches_store() {
        let clock = ManualClock::at("2025-09-10T08:00:00Z");
        let store = MemoryStore::default();
        let mut tracker = bench_press_session(&clock);

        let err = complete_workout(&mut tracker, &store, None).await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingIdentity));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert!(tracker.is_active());
        assert_eq!(tracker.completed_set_count(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_session_for_retry() {
        let clock = ManualClock::at("2025-09-10T08:00:00Z");
        let store = MemoryStore::default();
        let mut tracker = bench_press_session(&clock);
        let before = tracker.state().clone();

        store.set_failing(true);
        let err = complete_workout(&mut tracker, &store, Some(&identity())).await.unwrap_err();
        assert!(matches!(err, CompletionError::Store(_)));
        assert_eq!(tracker.state(), &before);
        assert!(store.saved().is_empty());

        // Retrying once the store is back succeeds
        store.set_failing(false);
        complete_workout(&mut tracker, &store, Some(&identity())).await.unwrap();
        assert_eq!(store.saved().len(), 1);
        assert!(!tracker.is_active());
    }

    #[tokio::test]
    async fn test_paused_time_is_not_billed() {
        let clock = ManualClock::at("2025-09-10T08:00:00Z");
        let store = MemoryStore::default();
        let mut tracker = bench_press_session(&clock);

        clock.advance_secs(60);
        tracker.pause_workout().unwrap();
        clock.advance_secs(600);
        tracker.resume_workout().unwrap();
        clock.advance_secs(30);

        complete_workout(&mut tracker, &store, Some(&identity())).await.unwrap();
        assert_eq!(store.saved()[0].duration, 90);
    }

    #[tokio::test]
    async fn test_deleted_workout_leaves_history() {
        let clock = ManualClock::at("2025-09-10T08:00:00Z");
        let store = MemoryStore::default();
        let mut tracker = bench_press_session(&clock);
        let id = complete_workout(&mut tracker, &store, Some(&identity())).await.unwrap();

        store.delete_workout(&id).await.unwrap();
        assert!(store.list_workouts("user_1").await.unwrap().is_empty());
        assert!(store.delete_workout(&id).await.is_err());
    }
}
