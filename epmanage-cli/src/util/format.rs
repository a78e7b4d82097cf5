use chrono::{DateTime, Utc};

pub const RESET: &str = "\x1b[0m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BOLD: &str = "\x1b[1m";

pub fn paint(text: &str, color: &str, ansi: bool) -> String {
    if !ansi {
        return text.to_string();
    }
    format!("{color}{text}{reset}", reset = RESET)
}

/// `<command> failed: <msg>`
pub fn format_failure(command: &str, message: &str, ansi: bool) -> String {
    format!("{}{}", paint(&format!("{} failed: ", command), RED, ansi), message)
}

/// `<command> error: <msg>`
pub fn format_warning(command: &str, message: &str, ansi: bool) -> String {
    format!("{}{}", paint(&format!("{} error: ", command), YELLOW, ansi), message)
}

/// `name = value` line of an attribute listing.
pub fn format_attribute(name: &str, value: &str, ansi: bool) -> String {
    format!("{} = {}", paint(name, BOLD, ansi), value)
}

/// "in 3 hours", "5 min ago", ...
pub fn format_relative_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = time.signed_duration_since(now);
    let future = duration.num_seconds() > 0;
    let secs = duration.num_seconds().abs();

    let span = if secs < 60 {
        if secs == 0 {
            return "just now".to_string();
        }
        format!("{} sec", secs)
    } else if secs < 3600 {
        format!("{} min", secs / 60)
    } else if secs < 86_400 {
        plural(secs / 3600, "hour")
    } else if secs < 30 * 86_400 {
        plural(secs / 86_400, "day")
    } else if secs < 365 * 86_400 {
        plural(secs / (30 * 86_400), "month")
    } else {
        plural(secs / (365 * 86_400), "year")
    };

    if future {
        format!("in {}", span)
    } else {
        format!("{} ago", span)
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
}
