use chrono::{Datelike, NaiveDate};

/// `MM:SS` for the running workout clock. Minutes keep counting past 59.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Compact duration: "1h 5m", "5m 3s", "3s", "0s"
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "0s".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// "Today", "Yesterday", or something like "Mon, Jan 6"
pub fn date_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        return "Today".to_string();
    }
    if today.pred_opt() == Some(day) {
        return "Yesterday".to_string();
    }
    format!("{}, {} {}", day.format("%a"), day.format("%b"), day.day())
}

pub fn format_volume(volume: f64) -> String {
    if volume.fract() == 0.0 {
        format!("{:.0} kg", volume)
    } else {
        format!("{:.1} kg", volume)
    }
}
