use thiserror::Error;

use crate::models::session::{
    ExerciseEntry, ExerciseId, NewExercise, SetEntry, SetId, SetUpdate, WorkoutSession,
};
use crate::tracker::clock::{Clock, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("a workout is already in progress")]
    AlreadyActive,
    #[error("no workout is in progress")]
    NotActive,
    #[error("the workout is already paused")]
    AlreadyPaused,
    #[error("the workout is not paused")]
    NotPaused,
    #[error("no exercise with id {0} in this workout")]
    UnknownExercise(ExerciseId),
    #[error("no set with id {1} on exercise {0}")]
    UnknownSet(ExerciseId, SetId),
}

/// Owns the one workout in progress.
///
/// Constructed once at startup and handed to every screen by reference.
/// Elapsed time is derived from timestamps on demand; the tracker runs no
/// timer of its own.
pub struct SessionTracker<C: Clock = SystemClock> {
    state: WorkoutSession,
    clock: C,
    // Shared by exercises and sets, never reset, so ids stay unique for the
    // lifetime of the tracker.
    next_id: u64,
}

impl SessionTracker<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SessionTracker<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionTracker<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: WorkoutSession::default(),
            clock,
            next_id: 1,
        }
    }

    pub fn state(&self) -> &WorkoutSession {
        &self.state
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn exercises(&self) -> &[ExerciseEntry] {
        &self.state.exercises
    }

    pub fn exercise(&self, id: ExerciseId) -> Option<&ExerciseEntry> {
        self.state.exercises.iter().find(|e| e.id == id)
    }

    pub fn set_count(&self) -> usize {
        self.state.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_set_count(&self) -> usize {
        self.state.exercises.iter().map(ExerciseEntry::completed_count).sum()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Start a fresh workout. Refuses to restart one that is already running
    /// so elapsed progress can't be thrown away by a double tap.
    pub fn start_workout(&mut self) -> Result<(), TrackerError> {
        if self.state.is_active {
            log::debug!("start_workout ignored: workout already active");
            return Err(TrackerError::AlreadyActive);
        }

        self.state.is_active = true;
        self.state.is_paused = false;
        self.state.start_time = Some(self.clock.now());
        self.state.paused_time = None;
        log::debug!("Workout started at {:?}", self.state.start_time);
        Ok(())
    }

    pub fn pause_workout(&mut self) -> Result<(), TrackerError> {
        if !self.state.is_active {
            return Err(TrackerError::NotActive);
        }
        if self.state.is_paused {
            // Overwriting paused_time would shift the clock
            return Err(TrackerError::AlreadyPaused);
        }

        self.state.is_paused = true;
        self.state.paused_time = Some(self.clock.now());
        log::debug!("Workout paused at {}s", self.elapsed_seconds());
        Ok(())
    }

    /// Shift the start forward by however long we were paused, so elapsed
    /// time stays "now minus start".
    pub fn resume_workout(&mut self) -> Result<(), TrackerError> {
        let (Some(start), Some(paused)) = (self.state.start_time, self.state.paused_time) else {
            return Err(TrackerError::NotPaused);
        };

        let pause_duration = self.clock.now().signed_duration_since(paused);
        self.state.start_time = Some(start + pause_duration);
        self.state.paused_time = None;
        self.state.is_paused = false;
        log::debug!("Workout resumed after {}s pause", pause_duration.num_seconds());
        Ok(())
    }

    /// Discard the workout without saving
    pub fn end_workout(&mut self) {
        log::debug!("Workout ended, discarding {} exercises", self.state.exercises.len());
        self.reset();
    }

    /// Reset after a successful save
    pub fn clear_workout(&mut self) {
        log::debug!("Workout cleared");
        self.reset();
    }

    fn reset(&mut self) {
        self.state = WorkoutSession::default();
    }

    /// Append an exercise. The same catalog exercise may be added more than
    /// once; each call creates a separate entry.
    pub fn add_exercise(&mut self, exercise: NewExercise) -> ExerciseId {
        let id = ExerciseId(self.next_id());
        log::debug!("Adding exercise {} ({})", exercise.name, id);
        self.state.exercises.push(ExerciseEntry {
            id,
            catalog_ref: exercise.catalog_ref,
            name: exercise.name,
            sets: Vec::new(),
        });
        id
    }

    pub fn delete_exercise(&mut self, exercise_id: ExerciseId) -> Result<(), TrackerError> {
        let index = self
            .state
            .exercises
            .iter()
            .position(|e| e.id == exercise_id)
            .ok_or(TrackerError::UnknownExercise(exercise_id))?;
        let removed = self.state.exercises.remove(index);
        log::debug!("Deleted exercise {} ({})", removed.name, exercise_id);
        Ok(())
    }

    pub fn add_set(&mut self, exercise_id: ExerciseId) -> Result<SetId, TrackerError> {
        if self.exercise(exercise_id).is_none() {
            return Err(TrackerError::UnknownExercise(exercise_id));
        }

        let set_id = SetId(self.next_id());
        let exercise = self.exercise_mut(exercise_id)?;
        exercise.sets.push(SetEntry::new(set_id));
        Ok(set_id)
    }

    /// Merge a partial update into one set. Called on every keystroke while
    /// editing reps/weight and when toggling completion.
    pub fn update_set(
        &mut self,
        exercise_id: ExerciseId,
        set_id: SetId,
        update: SetUpdate,
    ) -> Result<(), TrackerError> {
        let exercise = self.exercise_mut(exercise_id)?;
        let set = exercise
            .sets
            .iter_mut()
            .find(|s| s.id == set_id)
            .ok_or(TrackerError::UnknownSet(exercise_id, set_id))?;
        update.apply(set);
        Ok(())
    }

    fn exercise_mut(&mut self, exercise_id: ExerciseId) -> Result<&mut ExerciseEntry, TrackerError> {
        self.state
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or(TrackerError::UnknownExercise(exercise_id))
    }

    /// Whole seconds of workout so far, frozen while paused
    pub fn elapsed_seconds(&self) -> i64 {
        let state = &self.state;
        if !state.is_active {
            return state.total_elapsed;
        }

        let end = match (state.is_paused, state.paused_time) {
            (true, Some(paused)) => paused,
            (true, None) => return state.total_elapsed,
            (false, _) => self.clock.now(),
        };

        match state.start_time {
            Some(start) => end
                .signed_duration_since(start)
                .num_milliseconds()
                .div_euclid(1000)
                .max(0),
            None => state.total_elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::NumericInput;
    use crate::tracker::clock::ManualClock;

    fn tracker() -> (SessionTracker<ManualClock>, ManualClock) {
        let clock = ManualClock::at("2025-09-10T08:00:00Z");
        (SessionTracker::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_elapsed_zero_right_after_start() {
        let (mut t, clock) = tracker();
        t.start_workout().unwrap();
        assert_eq!(t.elapsed_seconds(), 0);

        clock.advance_millis(999);
        assert_eq!(t.elapsed_seconds(), 0);
        clock.advance_millis(1);
        assert_eq!(t.elapsed_seconds(), 1);
    }

    #[test]
    fn test_pause_pins_elapsed_and_resume_continues() {
        let (mut t, clock) = tracker();
        t.start_workout().unwrap();
        clock.advance_secs(90);

        t.pause_workout().unwrap();
        assert!(t.is_paused());
        clock.advance_secs(300);
        assert_eq!(t.elapsed_seconds(), 90, "elapsed must not move while paused");

        t.resume_workout().unwrap();
        assert!(!t.is_paused());
        assert!(t.state().paused_time.is_none());
        assert_eq!(t.elapsed_seconds(), 90);

        clock.advance_secs(45);
        assert_eq!(t.elapsed_seconds(), 135);
    }

    #[test]
    fn test_multiple_pauses_accumulate_correctly() {
        let (mut t, clock) = tracker();
        t.start_workout().unwrap();
        for _ in 0..3 {
            clock.advance_secs(10);
            t.pause_workout().unwrap();
            clock.advance_secs(100);
            t.resume_workout().unwrap();
        }
        assert_eq!(t.elapsed_seconds(), 30);
    }

    #[test]
    fn test_inactive_reports_total_elapsed() {
        let (t, clock) = tracker();
        clock.advance_secs(500);
        assert_eq!(t.elapsed_seconds(), 0);
    }

    #[test]
    fn test_restart_while_active_is_rejected() {
        let (mut t, clock) = tracker();
        t.start_workout().unwrap();
        clock.advance_secs(60);

        assert_eq!(t.start_workout(), Err(TrackerError::AlreadyActive));
        assert_eq!(t.elapsed_seconds(), 60, "progress must survive a second start");
    }

    #[test]
    fn test_double_pause_is_rejected_without_shifting_clock() {
        let (mut t, clock) = tracker();
        t.start_workout().unwrap();
        clock.advance_secs(20);
        t.pause_workout().unwrap();
        let paused_at = t.state().paused_time;

        clock.advance_secs(20);
        assert_eq!(t.pause_workout(), Err(TrackerError::AlreadyPaused));
        assert_eq!(t.state().paused_time, paused_at);
        assert_eq!(t.elapsed_seconds(), 20);
    }

    #[test]
    fn test_pause_and_resume_need_matching_state() {
        let (mut t, _clock) = tracker();
        assert_eq!(t.pause_workout(), Err(TrackerError::NotActive));
        assert_eq!(t.resume_workout(), Err(TrackerError::NotPaused));

        t.start_workout().unwrap();
        let before = t.state().clone();
        assert_eq!(t.resume_workout(), Err(TrackerError::NotPaused));
        assert_eq!(t.state(), &before);
    }

    #[test]
    fn test_add_and_delete_keep_insertion_order() {
        let (mut t, _clock) = tracker();
        t.start_workout().unwrap();

        let a = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        let b = t.add_exercise(NewExercise::new("Bench Press", "ex-bench"));
        let c = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        let d = t.add_exercise(NewExercise::new("Row", "ex-row"));

        t.delete_exercise(b).unwrap();
        t.delete_exercise(d).unwrap();

        let ids: Vec<ExerciseId> = t.exercises().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_ne!(a, c, "duplicate catalog exercises get separate entries");
    }

    #[test]
    fn test_delete_unknown_exercise_reports_not_found() {
        let (mut t, _clock) = tracker();
        let a = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        t.delete_exercise(a).unwrap();

        assert_eq!(t.delete_exercise(a), Err(TrackerError::UnknownExercise(a)));
        assert!(t.exercises().is_empty());
    }

    #[test]
    fn test_add_set_defaults() {
        let (mut t, _clock) = tracker();
        let ex = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        let set = t.add_set(ex).unwrap();

        let entry = &t.exercise(ex).unwrap().sets[0];
        assert_eq!(entry.id, set);
        assert!(entry.reps.is_empty());
        assert!(entry.weight.is_empty());
        assert!(!entry.completed);

        assert_eq!(
            t.add_set(ExerciseId(999)),
            Err(TrackerError::UnknownExercise(ExerciseId(999)))
        );
    }

    #[test]
    fn test_update_set_with_unknown_set_leaves_sets_unchanged() {
        let (mut t, _clock) = tracker();
        let ex = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        let set = t.add_set(ex).unwrap();
        t.update_set(ex, set, SetUpdate::default().reps("5")).unwrap();
        let before = t.exercise(ex).unwrap().sets.clone();

        let result = t.update_set(ex, SetId(12345), SetUpdate::default().reps("99").completed(true));
        assert_eq!(result, Err(TrackerError::UnknownSet(ex, SetId(12345))));
        assert_eq!(t.exercise(ex).unwrap().sets, before);
    }

    #[test]
    fn test_update_set_merges_partial_updates() {
        let (mut t, _clock) = tracker();
        let ex = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        let set = t.add_set(ex).unwrap();

        // Keystroke by keystroke
        t.update_set(ex, set, SetUpdate::default().weight("1")).unwrap();
        t.update_set(ex, set, SetUpdate::default().weight("10")).unwrap();
        t.update_set(ex, set, SetUpdate::default().weight("100")).unwrap();
        t.update_set(ex, set, SetUpdate::default().completed(true)).unwrap();

        let entry = &t.exercise(ex).unwrap().sets[0];
        assert_eq!(entry.weight, NumericInput::from("100"));
        assert!(entry.reps.is_empty());
        assert!(entry.completed);
        assert_eq!(t.completed_set_count(), 1);
        assert_eq!(t.set_count(), 1);
    }

    #[test]
    fn test_ids_never_repeat_across_clears() {
        let (mut t, _clock) = tracker();
        let first = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        t.clear_workout();
        let second = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_clear_always_returns_initial_state() {
        let (mut t, clock) = tracker();
        t.start_workout().unwrap();
        let ex = t.add_exercise(NewExercise::new("Squat", "ex-squat"));
        t.add_set(ex).unwrap();
        clock.advance_secs(30);
        t.pause_workout().unwrap();

        t.clear_workout();
        assert_eq!(t.state(), &WorkoutSession::default());
        assert!(!t.is_active());
        assert!(!t.is_paused());
        assert!(t.state().start_time.is_none());
        assert!(t.state().paused_time.is_none());
        assert_eq!(t.state().total_elapsed, 0);

        t.start_workout().unwrap();
        t.end_workout();
        assert_eq!(t.state(), &WorkoutSession::default());
    }
}
