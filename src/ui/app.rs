use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::auth::identity::Identity;
use crate::models::exercise::{self, CatalogExercise};
use crate::models::session::{ExerciseId, SetId, SetUpdate};
use crate::models::workout::WorkoutRecord;
use crate::store::ContentStore;
use crate::tracker::session::SessionTracker;
use crate::ui::commands::{self, CommandContext, CommandResult, Notice, push_log};
use crate::ui::refresh::{self, HistorySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Reps,
    Weight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    EditSet { exercise_id: ExerciseId, set_id: SetId, field: SetField },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    EndWorkout,
    DeleteExercise(ExerciseId),
    DeleteWorkout { workout_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Dashboard,
    ViewingLogs,
    Exercises { query: String, selected: usize },
    ActiveWorkout,
    ExercisePicker { query: String, selected: usize },
    Input { prompt: String, buffer: String, action: InputAction },
    Confirm { prompt: String, action: ConfirmAction },
    History { selected: usize },
    WorkoutDetail { selected: usize, scroll: usize },
    Message { notice: Notice, return_to: Box<AppState> },
}

/// One selectable line on the active workout screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutRow {
    Exercise(ExerciseId),
    Set { exercise_id: ExerciseId, set_id: SetId, number: usize },
}

impl WorkoutRow {
    pub fn exercise_id(&self) -> ExerciseId {
        match self {
            WorkoutRow::Exercise(id) => *id,
            WorkoutRow::Set { exercise_id, .. } => *exercise_id,
        }
    }
}

/// Flatten exercises and their sets into screen rows
pub fn workout_rows(tracker: &SessionTracker) -> Vec<WorkoutRow> {
    let mut rows = Vec::new();
    for exercise in tracker.exercises() {
        rows.push(WorkoutRow::Exercise(exercise.id));
        for (i, set) in exercise.sets.iter().enumerate() {
            rows.push(WorkoutRow::Set {
                exercise_id: exercise.id,
                set_id: set.id,
                number: i + 1,
            });
        }
    }
    rows
}

pub struct App {
    pub state: AppState,
    store: Arc<dyn ContentStore>,
    pub tracker: SessionTracker,
    pub identity: Option<Identity>,
    pub exercises: Vec<CatalogExercise>,
    pub history: Vec<WorkoutRecord>,
    pub summary: HistorySummary,
    pub logs: Vec<String>,
    pub workout_cursor: usize,
}

impl App {
    pub fn new(store: Arc<dyn ContentStore>, identity: Option<Identity>) -> Self {
        Self {
            state: AppState::Dashboard,
            store,
            tracker: SessionTracker::new(),
            identity,
            exercises: vec![],
            history: vec![],
            summary: HistorySummary::default(),
            logs: vec![],
            workout_cursor: 0,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        log::info!("Starting UI...");

        // Set up signal handlers for graceful shutdown on SIGTERM/SIGINT
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown_flag))?;
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown_flag))?;

        self.refresh().await;

        if let Err(e) = enable_raw_mode() {
            eprintln!("Failed to enable raw mode: {}. A real terminal is required.", e);
            return Err(anyhow::anyhow!("Terminal raw mode not supported: {}", e));
        }
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(anyhow::anyhow!("Failed to setup terminal: {}", e));
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, &shutdown_flag).await;

        // Always hand the terminal back, even when the loop failed
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        if self.tracker.is_active() {
            log::warn!(
                "Exiting with an unsaved workout ({} exercises, {}s)",
                self.tracker.exercises().len(),
                self.tracker.elapsed_seconds()
            );
        }
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        shutdown_flag: &AtomicBool,
    ) -> Result<()> {
        loop {
            // Redrawing on every poll timeout keeps the workout clock ticking
            terminal.draw(|f| self.draw(f))?;

            if shutdown_flag.load(Ordering::Relaxed) {
                log::info!("Received shutdown signal, exiting...");
                return Ok(());
            }

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    log::debug!("Key pressed: {:?} in state: {:?}", key.code, self.state);
                    if self.handle_key(key).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn draw(&self, f: &mut Frame) {
        crate::ui::render::draw(self, f);
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub async fn refresh(&mut self) {
        let data = refresh::refresh_all_data(self.store.as_ref(), self.identity.as_ref()).await;
        for error in &data.errors {
            push_log(&mut self.logs, error);
        }
        if let Some(exercises) = data.exercises {
            push_log(&mut self.logs, format!("Loaded {} exercises", exercises.len()));
            self.exercises = exercises;
        }
        if let Some(history) = data.history {
            self.summary = HistorySummary::from_records(&history);
            self.history = history;
        }
    }

    /// Catalog items matching a search, optionally only the active ones
    pub fn visible_exercises(&self, query: &str, active_only: bool) -> Vec<&CatalogExercise> {
        exercise::search(&self.exercises, query)
            .into_iter()
            .filter(|e| !active_only || e.is_active)
            .collect()
    }

    pub fn selected_row(&self) -> Option<WorkoutRow> {
        workout_rows(&self.tracker).get(self.workout_cursor).copied()
    }

    fn command_context(&mut self) -> CommandContext<'_> {
        CommandContext {
            store: self.store.as_ref(),
            tracker: &mut self.tracker,
            identity: self.identity.as_ref(),
            logs: &mut self.logs,
        }
    }

    fn apply_result(&mut self, result: &CommandResult, return_to: AppState) -> bool {
        match &result.notice {
            Some(notice) => {
                self.state = AppState::Message {
                    notice: notice.clone(),
                    return_to: Box::new(return_to),
                };
                false
            }
            None => true,
        }
    }

    /// Handle one key press. Returns `true` when the app should quit.
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.state.clone() {
            AppState::Dashboard => match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('s') => self.open_workout(),
                KeyCode::Char('e') => {
                    self.state = AppState::Exercises { query: String::new(), selected: 0 };
                }
                KeyCode::Char('h') => self.state = AppState::History { selected: 0 },
                KeyCode::Char('l') => self.state = AppState::ViewingLogs,
                KeyCode::Char('r') => self.refresh().await,
                _ => {}
            },

            AppState::ViewingLogs => self.state = AppState::Dashboard,

            AppState::Exercises { mut query, mut selected } => {
                let count = self.visible_exercises(&query, false).len();
                match key.code {
                    KeyCode::Esc => {
                        self.state = AppState::Dashboard;
                        return Ok(false);
                    }
                    KeyCode::Up => selected = selected.saturating_sub(1),
                    KeyCode::Down => {
                        if selected + 1 < count {
                            selected += 1;
                        }
                    }
                    KeyCode::Backspace => {
                        query.pop();
                        selected = 0;
                    }
                    KeyCode::Char(c) => {
                        query.push(c);
                        selected = 0;
                    }
                    _ => {}
                }
                self.state = AppState::Exercises { query, selected };
            }

            AppState::ActiveWorkout => self.handle_workout_key(key).await,

            AppState::ExercisePicker { mut query, mut selected } => {
                let count = self.visible_exercises(&query, true).len();
                match key.code {
                    KeyCode::Esc => {
                        self.state = AppState::ActiveWorkout;
                        return Ok(false);
                    }
                    KeyCode::Enter => {
                        let picked = self.visible_exercises(&query, true).get(selected).map(|e| (*e).clone());
                        if let Some(picked) = picked {
                            let id = commands::execute_add_exercise(&mut self.command_context(), &picked);
                            if let Some(pos) = workout_rows(&self.tracker).iter().position(|r| *r == WorkoutRow::Exercise(id)) {
                                self.workout_cursor = pos;
                            }
                            self.state = AppState::ActiveWorkout;
                        }
                        return Ok(false);
                    }
                    KeyCode::Up => selected = selected.saturating_sub(1),
                    KeyCode::Down => {
                        if selected + 1 < count {
                            selected += 1;
                        }
                    }
                    KeyCode::Backspace => {
                        query.pop();
                        selected = 0;
                    }
                    KeyCode::Char(c) => {
                        query.push(c);
                        selected = 0;
                    }
                    _ => {}
                }
                self.state = AppState::ExercisePicker { query, selected };
            }

            AppState::Input { prompt, mut buffer, action } => {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => {
                        self.state = AppState::ActiveWorkout;
                        return Ok(false);
                    }
                    KeyCode::Backspace => {
                        buffer.pop();
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => buffer.push(c),
                    _ => return Ok(false),
                }

                // Every keystroke goes straight into the session
                let InputAction::EditSet { exercise_id, set_id, field } = &action;
                let update = match field {
                    SetField::Reps => SetUpdate::default().reps(buffer.as_str()),
                    SetField::Weight => SetUpdate::default().weight(buffer.as_str()),
                };
                if let Err(e) = self.tracker.update_set(*exercise_id, *set_id, update) {
                    push_log(&mut self.logs, format!("Edit ignored: {}", e));
                    self.state = AppState::ActiveWorkout;
                    return Ok(false);
                }
                self.state = AppState::Input { prompt, buffer, action };
            }

            AppState::Confirm { action, .. } => {
                let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Enter);
                let cancelled = matches!(key.code, KeyCode::Char('n') | KeyCode::Esc);
                if confirmed {
                    self.run_confirmed(action).await;
                } else if cancelled {
                    self.state = match action {
                        ConfirmAction::DeleteWorkout { .. } => AppState::History { selected: 0 },
                        _ => AppState::ActiveWorkout,
                    };
                }
            }

            AppState::History { mut selected } => {
                match key.code {
                    KeyCode::Esc => {
                        self.state = AppState::Dashboard;
                        return Ok(false);
                    }
                    KeyCode::Up => selected = selected.saturating_sub(1),
                    KeyCode::Down => {
                        if selected + 1 < self.history.len() {
                            selected += 1;
                        }
                    }
                    KeyCode::Enter if selected < self.history.len() => {
                        self.state = AppState::WorkoutDetail { selected, scroll: 0 };
                        return Ok(false);
                    }
                    KeyCode::Char('d') => {
                        self.confirm_delete_workout(selected);
                        return Ok(false);
                    }
                    KeyCode::Char('r') => {
                        self.refresh().await;
                        selected = selected.min(self.history.len().saturating_sub(1));
                    }
                    _ => {}
                }
                self.state = AppState::History { selected };
            }

            AppState::WorkoutDetail { selected, mut scroll } => {
                match key.code {
                    KeyCode::Esc => {
                        self.state = AppState::History { selected };
                        return Ok(false);
                    }
                    KeyCode::Up => scroll = scroll.saturating_sub(1),
                    KeyCode::Down => scroll += 1,
                    KeyCode::Char('d') => {
                        self.confirm_delete_workout(selected);
                        return Ok(false);
                    }
                    _ => {}
                }
                self.state = AppState::WorkoutDetail { selected, scroll };
            }

            AppState::Message { return_to, .. } => self.state = *return_to,
        }
        Ok(false)
    }

    /// Start a workout, or continue the one already running
    fn open_workout(&mut self) {
        if self.tracker.is_active() {
            push_log(&mut self.logs, "Continuing workout");
        } else if let Err(e) = self.tracker.start_workout() {
            push_log(&mut self.logs, format!("Could not start workout: {}", e));
            return;
        } else {
            push_log(&mut self.logs, "Workout started");
            self.workout_cursor = 0;
        }
        self.state = AppState::ActiveWorkout;
    }

    async fn handle_workout_key(&mut self, key: KeyEvent) {
        let rows = workout_rows(&self.tracker);
        let selected = rows.get(self.workout_cursor).copied();

        match key.code {
            KeyCode::Esc => self.state = AppState::Dashboard,
            KeyCode::Up => self.workout_cursor = self.workout_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.workout_cursor + 1 < rows.len() {
                    self.workout_cursor += 1;
                }
            }
            KeyCode::Char('a') => {
                if self.exercises.is_empty() {
                    self.refresh().await;
                }
                self.state = AppState::ExercisePicker { query: String::new(), selected: 0 };
            }
            KeyCode::Char('n') => {
                let Some(row) = selected else { return };
                match self.tracker.add_set(row.exercise_id()) {
                    Ok(set_id) => {
                        let rows = workout_rows(&self.tracker);
                        if let Some(pos) = rows.iter().position(|r| matches!(r, WorkoutRow::Set { set_id: s, .. } if *s == set_id)) {
                            self.workout_cursor = pos;
                        }
                    }
                    Err(e) => push_log(&mut self.logs, format!("Could not add set: {}", e)),
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(WorkoutRow::Set { exercise_id, set_id, .. }) = selected {
                    let completed = self
                        .tracker
                        .exercise(exercise_id)
                        .and_then(|e| e.sets.iter().find(|s| s.id == set_id))
                        .map(|s| s.completed)
                        .unwrap_or(false);
                    if let Err(e) = self
                        .tracker
                        .update_set(exercise_id, set_id, SetUpdate::default().completed(!completed))
                    {
                        push_log(&mut self.logs, format!("Could not update set: {}", e));
                    }
                }
            }
            KeyCode::Char('r') => self.start_set_edit(selected, SetField::Reps),
            KeyCode::Char('w') => self.start_set_edit(selected, SetField::Weight),
            KeyCode::Char('d') => {
                if let Some(row) = selected {
                    let name = self
                        .tracker
                        .exercise(row.exercise_id())
                        .map(|e| e.name.clone())
                        .unwrap_or_default();
                    self.state = AppState::Confirm {
                        prompt: format!("Remove {} and all its sets from this workout?", name),
                        action: ConfirmAction::DeleteExercise(row.exercise_id()),
                    };
                }
            }
            KeyCode::Char('p') => {
                let result = if self.tracker.is_paused() {
                    self.tracker.resume_workout()
                } else {
                    self.tracker.pause_workout()
                };
                if let Err(e) = result {
                    push_log(&mut self.logs, format!("Pause/resume ignored: {}", e));
                }
            }
            KeyCode::Char('c') => self.complete_workout().await,
            KeyCode::Char('x') => {
                self.state = AppState::Confirm {
                    prompt: "End this workout? All progress will be lost.".to_string(),
                    action: ConfirmAction::EndWorkout,
                };
            }
            _ => {}
        }
    }

    fn start_set_edit(&mut self, row: Option<WorkoutRow>, field: SetField) {
        let Some(WorkoutRow::Set { exercise_id, set_id, number }) = row else {
            return;
        };
        let Some(exercise) = self.tracker.exercise(exercise_id) else {
            return;
        };
        let Some(set) = exercise.sets.iter().find(|s| s.id == set_id) else {
            return;
        };

        let (label, current) = match field {
            SetField::Reps => ("Reps", set.reps.as_text()),
            SetField::Weight => ("Weight (kg)", set.weight.as_text()),
        };
        self.state = AppState::Input {
            prompt: format!("{} for set {} of {}", label, number, exercise.name),
            buffer: current,
            action: InputAction::EditSet { exercise_id, set_id, field },
        };
    }

    async fn complete_workout(&mut self) {
        let result = commands::execute_complete_workout(&mut self.command_context()).await;
        if self.apply_result(&result, AppState::ActiveWorkout) {
            self.workout_cursor = 0;
            if result.should_refresh {
                self.refresh().await;
            }
            self.state = AppState::History { selected: 0 };
        }
    }

    fn confirm_delete_workout(&mut self, selected: usize) {
        if let Some(record) = self.history.get(selected) {
            self.state = AppState::Confirm {
                prompt: format!("Delete the workout from {}?", record.date.format("%Y-%m-%d %H:%M")),
                action: ConfirmAction::DeleteWorkout { workout_id: record.id.clone() },
            };
        }
    }

    async fn run_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::EndWorkout => {
                commands::execute_end_workout(&mut self.command_context());
                self.workout_cursor = 0;
                self.state = AppState::Dashboard;
            }
            ConfirmAction::DeleteExercise(id) => {
                match self.tracker.delete_exercise(id) {
                    Ok(()) => push_log(&mut self.logs, format!("Removed exercise {}", id)),
                    Err(e) => push_log(&mut self.logs, format!("Could not remove exercise: {}", e)),
                }
                let rows = workout_rows(&self.tracker).len();
                self.workout_cursor = self.workout_cursor.min(rows.saturating_sub(1));
                self.state = AppState::ActiveWorkout;
            }
            ConfirmAction::DeleteWorkout { workout_id } => {
                let result = commands::execute_delete_workout(&mut self.command_context(), &workout_id).await;
                if self.apply_result(&result, AppState::History { selected: 0 }) {
                    if result.should_refresh {
                        self.refresh().await;
                    }
                    self.state = AppState::History { selected: 0 };
                }
            }
        }
    }
}
