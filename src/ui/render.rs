use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use crate::history::format::{date_label, format_clock, format_duration, format_volume};
use crate::models::exercise::CatalogExercise;
use crate::models::workout::WorkoutRecord;
use crate::ui::app::{App, AppState, ConfirmAction, InputAction, SetField, WorkoutRow, workout_rows};

pub fn draw(app: &App, f: &mut Frame) {
    let size = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)].as_ref())
        .split(size);

    let status = Paragraph::new(status_line(app))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[0]);

    draw_screen(app, &app.state, f, chunks[1]);
}

fn status_line(app: &App) -> String {
    match &app.state {
        AppState::Dashboard => {
            let who = app
                .identity
                .as_ref()
                .map(|i| i.greeting_name().to_string())
                .unwrap_or_else(|| "not signed in".to_string());
            if app.tracker.is_active() {
                format!(
                    "{} | Workout running {} | [s] Continue | [e] Exercises | [h] History | [l] Logs | [q] Quit",
                    who,
                    format_clock(app.tracker.elapsed_seconds())
                )
            } else {
                format!("{} | [s] Start workout | [e] Exercises | [h] History | [l] Logs | [r] Refresh | [q] Quit", who)
            }
        }
        AppState::ViewingLogs => "Viewing Logs - Press any key to return".to_string(),
        AppState::Exercises { .. } => "Exercise Library - Type to search | [↑/↓] Move | [Esc] Back".to_string(),
        AppState::ActiveWorkout => {
            "[a] Add exercise | [n] New set | [r/w] Reps/Weight | [Space] Done | [d] Remove | [p] Pause | [c] Complete | [x] End | [Esc] Back".to_string()
        }
        AppState::ExercisePicker { .. } => "Add Exercise - Type to search | [Enter] Add | [Esc] Cancel".to_string(),
        AppState::Input { action, .. } => {
            let InputAction::EditSet { field, .. } = action;
            match field {
                SetField::Reps => "Editing reps - Digits only | [Enter/Esc] Done".to_string(),
                SetField::Weight => "Editing weight - Digits only | [Enter/Esc] Done".to_string(),
            }
        }
        AppState::Confirm { .. } => "Confirm - [y] Yes | [n] No".to_string(),
        AppState::History { .. } => "Workout History - [↑/↓] Move | [Enter] Details | [d] Delete | [r] Refresh | [Esc] Back".to_string(),
        AppState::WorkoutDetail { .. } => "Workout Details - [↑/↓] Scroll | [d] Delete | [Esc] Back".to_string(),
        AppState::Message { .. } => "Press any key to continue".to_string(),
    }
}

fn draw_screen(app: &App, state: &AppState, f: &mut Frame, area: Rect) {
    match state {
        AppState::Dashboard => draw_dashboard(app, f, area),

        AppState::ViewingLogs => {
            let visible = area.height.saturating_sub(2) as usize;
            let start = app.logs.len().saturating_sub(visible);
            let items: Vec<ListItem> = app.logs[start..]
                .iter()
                .map(|l| ListItem::new(Line::from(l.as_str())))
                .collect();
            let logs = List::new(items).block(Block::default().borders(Borders::ALL).title("Logs"));
            f.render_widget(logs, area);
        }

        AppState::Exercises { query, selected } => draw_exercise_list(app, f, area, query, *selected, false),

        AppState::ActiveWorkout => draw_workout(app, f, area),

        AppState::ExercisePicker { query, selected } => {
            draw_workout(app, f, area);
            let popup_area = centered_rect(70, 70, area);
            f.render_widget(Clear, popup_area);
            draw_exercise_list(app, f, popup_area, query, *selected, true);
        }

        AppState::Input { prompt, buffer, .. } => {
            draw_workout(app, f, area);

            let input_area = centered_rect(50, 30, area);
            f.render_widget(Clear, input_area);

            let input_text = vec![
                Line::from(""),
                Line::from(prompt.clone()).style(Style::default().fg(Color::Cyan)),
                Line::from(""),
                Line::from(vec![
                    Span::styled("  ", Style::default()),
                    Span::styled(buffer.clone(), Style::default().fg(Color::White)),
                    Span::styled("█", Style::default().fg(Color::Yellow)),
                ]),
                Line::from(""),
                Line::from("  Changes apply as you type").style(Style::default().fg(Color::Gray)),
            ];

            let input_widget = Paragraph::new(input_text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("✏️  Edit Set")
                    .style(Style::default().bg(Color::Black)),
            );
            f.render_widget(input_widget, input_area);
        }

        AppState::Confirm { prompt, action } => {
            match action {
                ConfirmAction::DeleteWorkout { .. } => draw_history(app, f, area, 0),
                _ => draw_workout(app, f, area),
            }
            let popup_area = centered_rect(50, 25, area);
            f.render_widget(Clear, popup_area);
            let text = vec![
                Line::from(""),
                Line::from(format!("  {}", prompt)),
                Line::from(""),
                Line::from("  [y] Yes    [n] No").style(Style::default().fg(Color::Gray)),
            ];
            let popup = Paragraph::new(text).wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("⚠️  Confirm")
                    .style(Style::default().bg(Color::Black)),
            );
            f.render_widget(popup, popup_area);
        }

        AppState::History { selected } => draw_history(app, f, area, *selected),

        AppState::WorkoutDetail { selected, scroll } => {
            if let Some(record) = app.history.get(*selected) {
                draw_workout_detail(f, area, record, *scroll);
            }
        }

        AppState::Message { notice, return_to } => {
            draw_screen(app, return_to, f, area);
            let popup_area = centered_rect(60, 40, area);
            f.render_widget(Clear, popup_area);
            let mut text = vec![Line::from("")];
            text.extend(notice.body.lines().map(|l| Line::from(format!("  {}", l))));
            text.push(Line::from(""));
            text.push(Line::from("  Press any key to continue").style(Style::default().fg(Color::Gray)));
            let popup = Paragraph::new(text).wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(notice.title.clone())
                    .style(Style::default().bg(Color::Black).fg(Color::Red)),
            );
            f.render_widget(popup, popup_area);
        }
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_dashboard(app: &App, f: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(8), Constraint::Min(3)].as_ref())
        .split(area);

    let greeting = match &app.identity {
        Some(identity) => format!("Welcome back, {}!", identity.greeting_name()),
        None => "Not signed in. Run `neura_fit_tracker login --user-id <id>` to save workouts.".to_string(),
    };
    let workout_line = if app.tracker.is_active() {
        let paused = if app.tracker.is_paused() { " (paused)" } else { "" };
        format!(
            "Workout in progress: {}{} | {} exercises, {}/{} sets done",
            format_clock(app.tracker.elapsed_seconds()),
            paused,
            app.tracker.exercises().len(),
            app.tracker.completed_set_count(),
            app.tracker.set_count()
        )
    } else {
        "Ready to train? Press [s] to start a workout.".to_string()
    };
    let header = Paragraph::new(vec![
        Line::from(greeting).style(Style::default().fg(Color::Cyan)),
        Line::from(""),
        Line::from(workout_line).style(Style::default().fg(Color::Yellow)),
    ])
    .block(Block::default().borders(Borders::ALL).title(format!("💪 Neura Fit ({})", app.store_name())));
    f.render_widget(header, rows[0]);

    let stats = &app.summary.stats;
    let stats_text = vec![
        Line::from(format!("Total workouts:   {}", stats.total_workouts)),
        Line::from(format!("Total time:       {}", format_duration(stats.total_time))),
        Line::from(format!("Average duration: {}", format_duration(stats.average_duration))),
        Line::from(format!("Days active:      {}", stats.days_active)),
        Line::from(format!("Total sets:       {}", stats.total_sets)),
        Line::from(format!("Total volume:     {}", format_volume(stats.total_volume))),
    ];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(rows[1]);
    f.render_widget(
        Paragraph::new(stats_text).block(Block::default().borders(Borders::ALL).title("📈 Stats")),
        cols[0],
    );

    let last_text = match &app.summary.last_workout {
        Some(last) => {
            let today = Local::now().date_naive();
            vec![
                Line::from(format!(
                    "{} at {}",
                    date_label(last.date.with_timezone(&Local).date_naive(), today),
                    last.date.with_timezone(&Local).format("%H:%M")
                )),
                Line::from(format!("Duration:  {}", format_duration(last.duration))),
                Line::from(format!("Exercises: {}", last.exercise_count)),
                Line::from(format!("Sets:      {}", last.set_count)),
            ]
        }
        None => vec![Line::from("No workouts yet")],
    };
    f.render_widget(
        Paragraph::new(last_text).block(Block::default().borders(Borders::ALL).title("🕒 Last Workout")),
        cols[1],
    );

    let recent: Vec<ListItem> = app.history.iter().take(5).map(history_item).collect();
    let recent_list = List::new(recent).block(Block::default().borders(Borders::ALL).title("📜 Recent Workouts"));
    f.render_widget(recent_list, rows[2]);
}

fn history_item(record: &WorkoutRecord) -> ListItem<'static> {
    let today = Local::now().date_naive();
    let local = record.date.with_timezone(&Local);
    ListItem::new(Line::from(format!(
        "{:<12} {}  {:>8}  {} exercises, {} sets",
        date_label(local.date_naive(), today),
        local.format("%H:%M"),
        format_duration(record.duration),
        record.exercise_count(),
        record.set_count()
    )))
}

fn draw_exercise_list(app: &App, f: &mut Frame, area: Rect, query: &str, selected: usize, picking: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(7)].as_ref())
        .split(area);

    let search = Paragraph::new(Line::from(vec![
        Span::raw("🔍 "),
        Span::styled(query.to_string(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Search").style(Style::default().bg(Color::Black)));
    f.render_widget(search, chunks[0]);

    let visible = app.visible_exercises(query, picking);
    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(idx, exercise)| {
            let marker = if exercise.is_active { "" } else { " (inactive)" };
            let style = if idx == selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if exercise.is_active {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(Line::from(format!("{:<30} {}{}", exercise.name, exercise.difficulty, marker))).style(style)
        })
        .collect();

    let title = if picking { "➕ Add Exercise" } else { "📚 Exercise Library" };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({} shown)", title, visible.len()))
            .style(Style::default().bg(Color::Black)),
    );
    f.render_widget(list, chunks[1]);

    let detail = match visible.get(selected) {
        Some(exercise) => exercise_details(exercise),
        None if app.exercises.is_empty() => {
            vec![Line::from("No exercises loaded. Press [r] on the dashboard to refresh.")]
        }
        None => vec![Line::from("No exercises match your search")],
    };
    let detail_widget = Paragraph::new(detail)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Details").style(Style::default().bg(Color::Black)));
    f.render_widget(detail_widget, chunks[2]);
}

pub fn exercise_details(exercise: &CatalogExercise) -> Vec<Line<'static>> {
    let description = if exercise.description.is_empty() {
        "No description".to_string()
    } else {
        exercise.description.clone()
    };
    let mut lines = vec![
        Line::from(description),
        Line::from(format!("Difficulty: {}", exercise.difficulty)).style(Style::default().fg(Color::Cyan)),
    ];
    if let Some(url) = &exercise.video_url {
        lines.push(Line::from(format!("🎥 Watch video tutorial: {}", url)).style(Style::default().fg(Color::Red)));
    }
    if let Some(url) = &exercise.image_url {
        lines.push(Line::from(format!("🖼  Image: {}", url)).style(Style::default().fg(Color::Gray)));
    }
    lines
}

fn draw_workout(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)].as_ref())
        .split(area);

    let tracker = &app.tracker;
    let (clock_label, clock_color) = if tracker.is_paused() {
        ("⏸  PAUSED", Color::Yellow)
    } else {
        ("⏱  RUNNING", Color::Green)
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!("{}  ", clock_label), Style::default().fg(clock_color)),
        Span::styled(
            format_clock(tracker.elapsed_seconds()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "   {} exercises | {}/{} sets done",
            tracker.exercises().len(),
            tracker.completed_set_count(),
            tracker.set_count()
        )),
    ]))
    .block(Block::default().borders(Borders::ALL).title("🏋️ Active Workout"));
    f.render_widget(header, chunks[0]);

    let rows = workout_rows(tracker);
    if rows.is_empty() {
        let empty = Paragraph::new("No exercises yet. Press [a] to add one.")
            .block(Block::default().borders(Borders::ALL).title("Exercises"));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let style = if idx == app.workout_cursor {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let line = match row {
                WorkoutRow::Exercise(id) => {
                    let exercise = tracker.exercise(*id)?;
                    format!(
                        "{}  ({}/{} sets)",
                        exercise.name,
                        exercise.completed_count(),
                        exercise.sets.len()
                    )
                }
                WorkoutRow::Set { exercise_id, set_id, number } => {
                    let set = tracker.exercise(*exercise_id)?.sets.iter().find(|s| s.id == *set_id)?;
                    let reps = if set.reps.is_empty() { "-".to_string() } else { set.reps.as_text() };
                    let weight = if set.weight.is_empty() { "-".to_string() } else { set.weight.as_text() };
                    let check = if set.completed { "[x]" } else { "[ ]" };
                    format!("    {} Set {}: {} reps x {} kg", check, number, reps, weight)
                }
            };
            Some(ListItem::new(Line::from(line)).style(style))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Exercises"));
    f.render_widget(list, chunks[1]);
}

fn draw_history(app: &App, f: &mut Frame, area: Rect, selected: usize) {
    if app.identity.is_none() {
        let msg = Paragraph::new("Sign in to see your workout history.")
            .block(Block::default().borders(Borders::ALL).title("📜 Workout History"));
        f.render_widget(msg, area);
        return;
    }

    // Keep the selection on screen
    let max_visible_items = (area.height.saturating_sub(2) as usize).max(1);
    let start_idx = selected.saturating_sub(max_visible_items - 1);
    let end_idx = (start_idx + max_visible_items).min(app.history.len());

    let items: Vec<ListItem> = app.history[start_idx.min(end_idx)..end_idx]
        .iter()
        .enumerate()
        .map(|(offset, record)| {
            let item = history_item(record);
            if start_idx + offset == selected {
                item.style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                item
            }
        })
        .collect();

    let title = if app.history.is_empty() {
        "📜 Workout History (no workouts yet)".to_string()
    } else {
        format!("📜 Workout History ({} workouts)", app.history.len())
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_workout_detail(f: &mut Frame, area: Rect, record: &WorkoutRecord, scroll: usize) {
    let local = record.date.with_timezone(&Local);
    let mut lines = vec![
        Line::from(format!("Date:     {}", local.format("%A, %B %-d %Y at %H:%M"))),
        Line::from(format!("Duration: {}", format_duration(record.duration))),
        Line::from(format!("Volume:   {}", format_volume(record.total_volume()))),
        Line::from(""),
    ];

    for exercise in &record.exercises {
        lines.push(Line::from(exercise.name().to_string()).style(Style::default().fg(Color::Cyan)));
        for (i, set) in exercise.sets.iter().enumerate() {
            lines.push(Line::from(format!(
                "    Set {}: {} reps x {} {}",
                i + 1,
                set.reps,
                set.weight,
                set.weight_unit.as_str()
            )));
        }
        lines.push(Line::from(""));
    }

    let scroll = scroll.min(lines.len().saturating_sub(1)) as u16;
    let detail = Paragraph::new(lines)
        .scroll((scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("🏋️ Workout Details"));
    f.render_widget(detail, area);
}
