//! Colored terminal rendering for hemcal-core types.

use hemcal_core::classify::ApprovalState;
use hemcal_core::event::CanonicalEvent;
use hemcal_core::fetch::{FetchOutcome, SourceReport};
use hemcal_core::sync::{SyncAction, SyncReport};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ApprovalState {
    fn render(&self) -> String {
        match self {
            ApprovalState::Pending => "pending".yellow().to_string(),
            ApprovalState::Approved => "approved".green().to_string(),
            ApprovalState::Synced => "synced".cyan().to_string(),
            ApprovalState::Rejected => "rejected".red().to_string(),
        }
    }
}

impl Render for CanonicalEvent {
    fn render(&self) -> String {
        let time = match self.end {
            Some(end) if end.date_naive() != self.start.date_naive() => format!(
                "{} – {}",
                self.start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
            Some(end) => format!(
                "{} {}–{}",
                self.start.format("%Y-%m-%d"),
                self.start.format("%H:%M"),
                end.format("%H:%M")
            ),
            None => self.start.format("%Y-%m-%d %H:%M").to_string(),
        };

        format!(
            "{} {} {}",
            self.summary,
            time.dimmed(),
            format!("[{}]", self.source).dimmed()
        )
    }
}

impl Render for SourceReport {
    fn render(&self) -> String {
        match &self.outcome {
            FetchOutcome::Fetched { events, skipped } => {
                let mut line = format!("{} {}: {} events", "✓".green(), self.source_name, events);
                if *skipped > 0 {
                    line.push_str(&format!(" {}", format!("({skipped} skipped)").yellow()));
                }
                line
            }
            FetchOutcome::Failed { error } => {
                format!("{} {}: {}", "✗".red(), self.source_name, error.red())
            }
        }
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        match (&self.action, &self.error) {
            (_, Some(error)) => format!("{} {} {}", "✗".red(), self.uid, error.red()),
            (Some(action), None) => {
                let verb = match action {
                    SyncAction::Created => "created".green().to_string(),
                    SyncAction::Updated => "updated".yellow().to_string(),
                    SyncAction::Deleted => "deleted".red().to_string(),
                    SyncAction::Skipped => "skipped".dimmed().to_string(),
                };
                format!("{} {} {}", "✓".green(), self.uid, verb)
            }
            (None, None) => self.uid.clone(),
        }
    }
}
