//! Output formatting utilities

use std::io::Write;

use console::{style, Style};

use assetline_tasks::{Notification, NotificationSink, TaskEvent, TaskReporter};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Console reporter with live task progress
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { task } => {
                println!("  {} {}", style("▸").dim(), style(task).bold());
            }
            TaskEvent::Completed {
                task,
                duration,
                outputs,
            } => {
                let files = if self.verbose {
                    style(format!("({} files)", outputs)).dim().to_string()
                } else {
                    String::new()
                };
                println!(
                    "  {} {} {} {}",
                    style("✓").green(),
                    style(task).green(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim(),
                    files
                );
            }
            TaskEvent::Failed {
                task,
                duration,
                kind,
                ..
            } => {
                // The message itself goes through the notification sink
                println!(
                    "  {} {} {} {}",
                    style("✗").red(),
                    style(task).red(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim(),
                    style(kind).red().dim()
                );
            }
            TaskEvent::Skipped { task, reason } => {
                println!(
                    "  {} {} {}",
                    style("○").yellow(),
                    style(task).yellow(),
                    style(format!("({})", reason)).dim()
                );
            }
            TaskEvent::Warning { task, message } => {
                println!(
                    "  {} {} {}",
                    style("!").yellow(),
                    style(task).yellow(),
                    style(message).dim()
                );
            }
            TaskEvent::WaveStarted { wave, task_count } => {
                if self.verbose {
                    println!(
                        "  {} Wave {} ({} tasks)",
                        style("─").dim(),
                        wave,
                        task_count
                    );
                }
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                failed,
                skipped,
                duration,
            } => {
                println!();
                println!(
                    "  {} {}/{} succeeded, {} failed, {} skipped ({:.1}s)",
                    if *failed == 0 {
                        style("✓").green().bold()
                    } else {
                        style("✗").red().bold()
                    },
                    succeeded,
                    total,
                    failed,
                    skipped,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Notification sink printing failures to stderr, with a terminal bell when
/// the notification asks for sound
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn render(notification: &Notification) -> String {
        let mut out = format!(
            "{} {}\n",
            style(&notification.title).red().bold(),
            style(&notification.subtitle).red()
        );
        for line in notification.message.lines() {
            out.push_str(&format!("    {}\n", line));
        }
        out
    }
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(Self::render(notification).as_bytes());
        if notification.sound {
            let _ = stderr.write_all(b"\x07");
        }
        let _ = stderr.flush();
    }
}
