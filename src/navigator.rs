//! The explorer loop: render the author table for the current date filter,
//! hand it to the selector, and move through the filter stack according to
//! the key that ended the round.

use crate::selector::{Action, Selector, SelectorOutcome, CONFIRM_KEY};
use crate::shortlog::Shortlog;

/// Supplies the formatted author table for a date filter ("" = all history).
pub trait HistorySource {
    fn table(&self, since: &str) -> String;
}

impl HistorySource for Shortlog<'_> {
    fn table(&self, since: &str) -> String {
        Shortlog::table(self, since)
    }
}

/// Current filter plus the filters to return to. Empty on both counts is the
/// unfiltered root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub stack: Vec<String>,
    pub filter: String,
}

impl Position {
    fn push(&mut self, filter: String) {
        let previous = std::mem::replace(&mut self.filter, filter);
        self.stack.push(previous);
    }

    /// Returns false when already at the root.
    fn pop(&mut self) -> bool {
        match self.stack.pop() {
            Some(previous) => {
                self.filter = previous;
                true
            }
            None => false,
        }
    }
}

/// Result of a single round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Leave, printing these rows (possibly none).
    Exit(Vec<String>),
}

/// Applies one selector outcome to the position.
pub fn step(pos: &mut Position, outcome: SelectorOutcome) -> Step {
    match outcome.action {
        Action::ApplyFilter => {
            if !outcome.query.is_empty() {
                pos.push(outcome.query);
            } else if outcome.key == CONFIRM_KEY {
                pos.push(String::new());
            }
            Step::Continue
        }
        Action::Back => {
            if pos.pop() {
                Step::Continue
            } else {
                Step::Exit(Vec::new())
            }
        }
        Action::Quit => {
            if pos.pop() {
                Step::Continue
            } else {
                Step::Exit(outcome.selections)
            }
        }
        Action::Accept => Step::Exit(Vec::new()),
    }
}

/// Runs rounds until the user leaves; returns the rows to print.
pub fn run<H, S>(history: &H, selector: &mut S) -> Vec<String>
where
    H: HistorySource,
    S: Selector,
{
    let mut pos = Position::default();

    loop {
        let table = history.table(&pos.filter);
        let outcome = match selector.select(&table, &pos.filter) {
            Ok(outcome) => outcome,
            Err(e) => {
                // Same as backing out of the root: no output.
                tracing::debug!(error = %e, "selector round failed");
                return Vec::new();
            }
        };

        match step(&mut pos, outcome) {
            Step::Continue => {
                tracing::debug!(filter = %pos.filter, depth = pos.stack.len(), "filter changed");
            }
            Step::Exit(rows) => return rows,
        }
    }
}
