//! Terminal rendering of the directory view.

use std::fmt::Display;

use console::{Term, style};
use cumeets_business::{DirectoryView, UserRecord};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;

pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Output writing to stdout.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Print an error line with a red cross.
    pub fn error(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    /// Print an informational line.
    pub fn info(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("ℹ").blue().bold(), message)),
        );
    }

    /// Print a plain line.
    pub fn print(&self, message: impl Display) {
        drop(self.term.write_line(&message.to_string()));
    }

    /// Print a bold cyan header.
    pub fn header(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&style(message).bold().cyan().to_string()),
        );
    }

    /// Print dimmed text.
    pub fn dim(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).dim().to_string()));
    }

    /// Render the current directory view.
    pub fn view(&self, view: &DirectoryView<'_>, format: OutputFormat) {
        match format {
            OutputFormat::Table => self.view_table(view),
            OutputFormat::Json => self.print(render_json(view)),
        }
    }

    fn view_table(&self, view: &DirectoryView<'_>) {
        match view {
            DirectoryView::Idle => {}
            DirectoryView::Loading { .. } | DirectoryView::Empty { .. } => {
                if let Some(message) = view.message() {
                    self.info(message);
                }
            }
            DirectoryView::Error(message) => self.error(message),
            DirectoryView::Results(users) => {
                self.print(render_table(users));
                self.dim(format!("{} result(s)", users.len()));
            }
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Work")]
    work: String,
    #[tabled(rename = "Graduation")]
    graduation: String,
    #[tabled(rename = "Major")]
    major: String,
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or("N/A").to_owned()
}

impl From<&UserRecord> for UserRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            name: user.display_name().to_owned(),
            work: or_na(user.work.as_deref()),
            graduation: or_na(user.graduation.as_deref()),
            major: or_na(user.major.as_deref()),
        }
    }
}

/// Rounded table of name, work, graduation and major.
pub fn render_table(users: &[&UserRecord]) -> String {
    let rows: Vec<UserRow> = users.iter().map(|user| UserRow::from(*user)).collect();
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.to_string()
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum JsonView<'a> {
    Idle,
    Loading { message: String },
    Error { message: &'a str },
    Empty { message: String },
    Results { users: &'a [&'a UserRecord] },
}

/// The view as pretty JSON tagged with a `status` field.
pub fn render_json(view: &DirectoryView<'_>) -> String {
    let json = match view {
        DirectoryView::Idle => JsonView::Idle,
        DirectoryView::Loading { .. } => JsonView::Loading {
            message: view.message().unwrap_or_default(),
        },
        DirectoryView::Error(message) => JsonView::Error { message: *message },
        DirectoryView::Empty { .. } => JsonView::Empty {
            message: view.message().unwrap_or_default(),
        },
        DirectoryView::Results(users) => JsonView::Results { users },
    };
    serde_json::to_string_pretty(&json)
        .unwrap_or_else(|e| format!(r#"{{"status":"error","message":"{e}"}}"#))
}
