use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

const STATUS_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy)]
enum StatusKind {
    Pending,
    Success,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn supports_color(stream: Stream) -> bool {
    let tty = match stream {
        Stream::Stdout => io::stdout().is_terminal(),
        Stream::Stderr => io::stderr().is_terminal(),
    };
    tty && std::env::var_os("NO_COLOR").is_none()
}

fn style_for(kind: StatusKind) -> Style {
    let style = Style::new().bold();
    match kind {
        StatusKind::Pending => style.fg_color(Some(AnsiColor::Cyan.into())),
        StatusKind::Success => style.fg_color(Some(AnsiColor::Green.into())),
        StatusKind::Info => style.fg_color(Some(AnsiColor::Blue.into())),
        StatusKind::Warn => style.fg_color(Some(AnsiColor::Yellow.into())),
        StatusKind::Error => style.fg_color(Some(AnsiColor::Red.into())),
    }
}

fn write_status(kind: StatusKind, label: &str, message: &str) {
    let stream = match kind {
        StatusKind::Warn | StatusKind::Error => Stream::Stderr,
        _ => Stream::Stdout,
    };

    let use_color = supports_color(stream);
    let mut handle: Box<dyn Write> = match stream {
        Stream::Stdout => Box::new(io::stdout().lock()),
        Stream::Stderr => Box::new(io::stderr().lock()),
    };

    let padded_label = if label.is_empty() {
        " ".repeat(STATUS_WIDTH)
    } else {
        format!("{:>width$}", label, width = STATUS_WIDTH)
    };

    let (prefix, suffix) = if use_color {
        let style = style_for(kind);
        (style.render().to_string(), style.render_reset().to_string())
    } else {
        (String::new(), String::new())
    };

    let lines: Vec<&str> = message.split('\n').collect();
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            let _ = writeln!(handle, "{prefix}{padded_label}{suffix} {line}");
        } else {
            let _ = writeln!(handle, "{:>width$} {line}", "", width = STATUS_WIDTH);
        }
    }
    let _ = handle.flush();
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 60 {
        let minutes = duration.as_secs() / 60;
        let seconds = duration.as_secs() % 60;
        if seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {seconds}s")
        }
    } else if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if duration.as_millis() >= 1 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{}µs", duration.as_micros())
    }
}

pub fn status(label: &str, message: impl Display) {
    write_status(StatusKind::Pending, label, &message.to_string());
}

pub fn info(message: impl Display) {
    write_status(StatusKind::Info, "Info", &message.to_string());
}

pub fn warn(message: impl Display) {
    write_status(StatusKind::Warn, "Warning", &message.to_string());
}

pub fn error(message: impl Display) {
    write_status(StatusKind::Error, "Error", &message.to_string());
}

pub fn success(label: &str, message: impl Display) {
    write_status(StatusKind::Success, label, &message.to_string());
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` is a no.
pub fn confirm(question: impl Display) -> Result<bool> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{question} [y/N] ").context("Failed to write prompt")?;
    stderr.flush().context("Failed to write prompt")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print text that belongs to the user unchanged, such as a package
/// manager's own output.
pub fn passthrough(text: &str, to_stderr: bool) {
    if text.is_empty() {
        return;
    }
    let newline = if text.ends_with('\n') { "" } else { "\n" };
    if to_stderr {
        let _ = write!(io::stderr().lock(), "{text}{newline}");
    } else {
        let _ = write!(io::stdout().lock(), "{text}{newline}");
    }
}

/// A long-running step: announced when created, closed with a success or
/// failure line. Dropping it unfinished reports the step as interrupted.
pub struct Progress {
    message: String,
    started: Instant,
    complete: bool,
}

impl Progress {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        let label = label.into();
        let message = message.into();
        write_status(StatusKind::Pending, &label, &message);

        Self {
            message,
            started: Instant::now(),
            complete: false,
        }
    }

    /// Finish with the elapsed time appended.
    pub fn success(mut self, label: &str) {
        self.complete = true;
        let line = finished_line(&self.message, self.started.elapsed());
        write_status(StatusKind::Success, label, &line);
    }

    pub fn fail(mut self, label: &str, error: impl Display) {
        self.complete = true;
        let line = failed_line(&self.message, self.started.elapsed(), error);
        write_status(StatusKind::Error, label, &line);
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if !self.complete {
            self.complete = true;
            write_status(StatusKind::Warn, "Interrupted", &self.message);
        }
    }
}

fn finished_line(message: &str, elapsed: Duration) -> String {
    format!("{message} ({})", format_duration(elapsed))
}

fn failed_line(message: &str, elapsed: Duration, error: impl Display) -> String {
    format!("{message}: {error} ({})", format_duration(elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
    }

    #[test]
    fn progress_lines_carry_elapsed_time() {
        assert_eq!(
            finished_line("apt install -y htop", Duration::from_millis(250)),
            "apt install -y htop (250ms)"
        );
        assert_eq!(
            failed_line("brew list", Duration::from_secs(61), "exit code 1"),
            "brew list: exit code 1 (1m 1s)"
        );
    }

    #[test]
    fn progress_finishes_exactly_once() {
        let progress = Progress::new("Installing", "apt install -y htop");
        assert!(!progress.complete);
        progress.success("Done");

        // Dropped without finishing: reported as interrupted, no panic.
        drop(Progress::new("Removing", "apt remove -y htop"));
    }

    #[test]
    fn only_yes_confirms() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer(" YES "));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("no"));
        assert!(!parse_answer("yep"));
    }
}
