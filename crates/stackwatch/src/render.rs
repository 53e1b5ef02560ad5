//! Terminal rendering of watch progress

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use stackwatch_core::{
    ChangeAction, DisplayRow, Renderer, Replacement, ResourceStatus, RowMap, StatusClass,
    WatchOutcome, WatchView, ordered_rows,
};
use std::collections::HashMap;

/// Identity of what has already been printed for a row
type Printed = (Option<ResourceStatus>, Option<DateTime<Utc>>);

/// Prints each row once per status change, followed by a summary line
#[derive(Default)]
pub struct TerminalRenderer {
    printed: HashMap<String, Printed>,
    rollback_shown: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows with a status that has not been printed yet, in display order
    fn fresh_rows<'r>(&mut self, rows: &'r RowMap) -> Vec<&'r DisplayRow> {
        let mut fresh = Vec::new();
        for row in ordered_rows(rows) {
            if row.status.is_none() {
                continue;
            }
            let key = (row.status.clone(), row.timestamp);
            if self.printed.get(&row.logical_resource_id) != Some(&key) {
                self.printed.insert(row.logical_resource_id.clone(), key);
                fresh.push(row);
            }
        }
        fresh
    }

    fn print_fresh(&mut self, view: &WatchView<'_>) {
        if view.rolling_back && !self.rollback_shown {
            self.rollback_shown = true;
            println!(
                "{}",
                format!("⚠ {} is rolling back", view.stack.stack_name)
                    .red()
                    .bold()
            );
        }
        for row in self.fresh_rows(view.rows) {
            println!("{}", event_line(row));
        }
    }
}

impl Renderer for TerminalRenderer {
    fn update(&mut self, view: &WatchView<'_>) {
        self.print_fresh(view);
    }

    fn finish(&mut self, view: &WatchView<'_>, outcome: &WatchOutcome) {
        self.print_fresh(view);
        println!();

        match outcome {
            WatchOutcome::Succeeded { status } => {
                println!(
                    "{}",
                    format!("✓ {} {}", view.stack.stack_name, status).green().bold()
                );
            }
            WatchOutcome::Failed { status, reason } => {
                println!(
                    "{}",
                    format!("✗ {} {}", view.stack.stack_name, status).red().bold()
                );
                if let Some(reason) = reason {
                    println!("  {}", reason.red());
                }
            }
            WatchOutcome::Cancelled { .. } => {}
        }
    }
}

fn paint(text: &str, class: StatusClass) -> ColoredString {
    match class {
        StatusClass::Positive => text.green(),
        StatusClass::Negative => text.red(),
        StatusClass::Pending => text.yellow(),
    }
}

fn event_line(row: &DisplayRow) -> String {
    let time = row
        .timestamp
        .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let status = row
        .status
        .as_ref()
        .map(|s| s.as_str())
        .unwrap_or_default();

    let mut line = format!(
        "{}  {}  {} {}",
        time.dimmed(),
        paint(&format!("{:<28}", status), row.class()),
        row.logical_resource_id.bold(),
        format!("({})", row.resource_type).dimmed()
    );
    if let Some(reason) = &row.status_reason {
        line.push_str(&format!("  {}", reason.dimmed()));
    }
    line
}

fn action_label(action: Option<&ChangeAction>) -> ColoredString {
    let label = action.map(|a| a.as_str()).unwrap_or("-");
    let padded = format!("{:<8}", label);
    match action {
        Some(ChangeAction::Add) => padded.green(),
        Some(ChangeAction::Remove) => padded.red(),
        Some(ChangeAction::Modify) => padded.yellow(),
        _ => padded.cyan(),
    }
}

/// Prints the planned changes before they are executed
pub fn print_plan(rows: &RowMap) {
    println!("{}", format!("Planned changes ({}):", rows.len()).bold());
    for row in ordered_rows(rows) {
        let replacement = match &row.replacement {
            None | Some(Replacement::False) => String::new(),
            Some(r) => format!("  replacement: {}", r).red().to_string(),
        };
        println!(
            "  {} {} {}{}",
            action_label(row.action.as_ref()),
            row.logical_resource_id.cyan(),
            format!("({})", row.resource_type).dimmed(),
            replacement
        );
    }
}
