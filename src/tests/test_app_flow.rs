#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;

    use crate::auth::identity::Identity;
    use crate::models::exercise::{CatalogExercise, Difficulty};
    use crate::models::session::NumericInput;
    use crate::store::memory::MemoryStore;
    use crate::ui::app::{App, AppState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn press(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(key(*code)).await.unwrap();
        }
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    fn catalog() -> Vec<CatalogExercise> {
        let make = |id: &str, name: &str, active: bool| CatalogExercise {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            difficulty: Difficulty::Intermediate,
            image_url: None,
            video_url: None,
            is_active: active,
        };
        vec![
            make("ex1", "Bench Press", true),
            make("ex2", "Retired Bench", false),
            make("ex3", "Squat", true),
        ]
    }

    fn signed_in() -> Option<Identity> {
        Some(Identity {
            user_id: "user_1".to_string(),
            display_name: Some("Sam".to_string()),
        })
    }

    /// Log one Bench Press set with the keyboard, then complete
    async fn log_bench_press(app: &mut App) {
        press(app, &[KeyCode::Char('s'), KeyCode::Char('a')]).await;
        type_text(app, "bench").await;
        press(app, &[KeyCode::Enter, KeyCode::Char('n'), KeyCode::Char('r')]).await;
        type_text(app, "8").await;
        press(app, &[KeyCode::Enter, KeyCode::Char('w')]).await;
        type_text(app, "60").await;
        press(app, &[KeyCode::Enter, KeyCode::Char(' ')]).await;
    }

    #[tokio::test]
    async fn test_keyboard_workout_is_saved() {
        let store = Arc::new(MemoryStore::with_exercises(catalog()));
        let mut app = App::new(store.clone(), signed_in());
        app.refresh().await;
        assert_eq!(app.exercises.len(), 3);

        log_bench_press(&mut app).await;

        let exercise = &app.tracker.exercises()[0];
        assert_eq!(exercise.name, "Bench Press");
        assert_eq!(exercise.catalog_ref.as_deref(), Some("ex1"));
        assert_eq!(exercise.sets[0].reps, NumericInput::from("8"));
        assert_eq!(exercise.sets[0].weight, NumericInput::from("60"));
        assert!(exercise.sets[0].completed);

        press(&mut app, &[KeyCode::Char('c')]).await;
        assert_eq!(app.state, AppState::History { selected: 0 });
        assert!(!app.tracker.is_active());

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].exercises[0].sets[0].reps, 8);
        assert_eq!(saved[0].exercises[0].sets[0].weight, 60);

        // History and stats were refreshed after the save
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history[0].exercises[0].name(), "Bench Press");
        assert_eq!(app.summary.stats.total_workouts, 1);
    }

    #[tokio::test]
    async fn test_picker_hides_inactive_exercises() {
        let store = Arc::new(MemoryStore::with_exercises(catalog()));
        let mut app = App::new(store, signed_in());
        app.refresh().await;

        press(&mut app, &[KeyCode::Char('s'), KeyCode::Char('a')]).await;
        type_text(&mut app, "bench").await;
        let names: Vec<String> = app.visible_exercises("bench", true).iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["Bench Press".to_string()]);

        // The library screen still shows everything
        assert_eq!(app.visible_exercises("bench", false).len(), 2);
    }

    #[tokio::test]
    async fn test_save_without_sign_in_shows_message_and_keeps_workout() {
        let store = Arc::new(MemoryStore::with_exercises(catalog()));
        let mut app = App::new(store.clone(), None);
        app.refresh().await;

        log_bench_press(&mut app).await;
        press(&mut app, &[KeyCode::Char('c')]).await;

        match &app.state {
            AppState::Message { notice, return_to } => {
                assert_eq!(notice.title, "Not signed in");
                assert_eq!(**return_to, AppState::ActiveWorkout);
            }
            other => panic!("expected a message, got {:?}", other),
        }
        assert!(store.saved().is_empty());
        assert!(app.tracker.is_active());
        assert_eq!(app.tracker.completed_set_count(), 1);

        // Any key dismisses the message and returns to the workout
        press(&mut app, &[KeyCode::Char('z')]).await;
        assert_eq!(app.state, AppState::ActiveWorkout);
    }

    #[tokio::test]
    async fn test_store_outage_keeps_workout() {
        let store = Arc::new(MemoryStore::with_exercises(catalog()));
        let mut app = App::new(store.clone(), signed_in());
        app.refresh().await;
        log_bench_press(&mut app).await;

        store.set_failing(true);
        press(&mut app, &[KeyCode::Char('c')]).await;
        assert!(matches!(app.state, AppState::Message { .. }));
        assert!(app.tracker.is_active());

        store.set_failing(false);
        press(&mut app, &[KeyCode::Esc, KeyCode::Char('c')]).await;
        assert_eq!(store.saved().len(), 1);
        assert!(!app.tracker.is_active());
    }

    #[tokio::test]
    async fn test_delete_exercise_after_confirm() {
        let store = Arc::new(MemoryStore::with_exercises(catalog()));
        let mut app = App::new(store, signed_in());
        app.refresh().await;
        log_bench_press(&mut app).await;

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('n')]).await;
        assert_eq!(app.tracker.exercises().len(), 1);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]).await;
        assert!(app.tracker.exercises().is_empty());
        assert_eq!(app.state, AppState::ActiveWorkout);
        assert_eq!(app.workout_cursor, 0);
    }

    #[tokio::test]
    async fn test_pause_toggle() {
        let store = Arc::new(MemoryStore::default());
        let mut app = App::new(store, None);

        press(&mut app, &[KeyCode::Char('s'), KeyCode::Char('p')]).await;
        assert!(app.tracker.is_paused());
        press(&mut app, &[KeyCode::Char('p')]).await;
        assert!(!app.tracker.is_paused());
        assert!(app.tracker.is_active());
    }

    #[tokio::test]
    async fn test_delete_saved_workout_from_history() {
        let store = Arc::new(MemoryStore::with_exercises(catalog()));
        let mut app = App::new(store.clone(), signed_in());
        app.refresh().await;
        log_bench_press(&mut app).await;
        press(&mut app, &[KeyCode::Char('c')]).await;
        assert_eq!(app.history.len(), 1);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]).await;
        assert!(app.history.is_empty());
        assert!(store.saved().is_empty());
        assert_eq!(app.state, AppState::History { selected: 0 });
    }
}
