//! Preview pane, diff view and help overlay. fzf runs these as separate
//! `gh-shortlog _preview|_diffs|_help` processes; the session comes from
//! the handoff environment.

use crate::config::Config;
use crate::session::Session;
use colored::Colorize;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COMMIT_LINE: Regex = Regex::new(r"(commit )([0-9a-f]{10})([0-9a-f]{30})").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    /// Commit metadata only.
    Preview,
    /// Full patches with stat.
    Diffs,
}

pub fn log_args(kind: DetailKind, authors: &[String], since: &str, git_args: &[String]) -> Vec<String> {
    let head: &[&str] = match kind {
        DetailKind::Preview => &["log", "--no-patch", "--format=fuller", "--notes", "--color"],
        DetailKind::Diffs => &["log", "-w", "--patch-with-stat", "--format=fuller", "--notes", "--color"],
    };

    let mut args: Vec<String> = head.iter().map(|s| s.to_string()).collect();
    args.extend(authors.iter().map(|a| format!("--author={}", a)));
    if !since.is_empty() {
        args.push(format!("--since={}", since));
    }
    args.extend(git_args.iter().cloned());
    args
}

/// Turns each `commit <sha>` into a terminal hyperlink to the hosted commit,
/// labelled with the abbreviated sha.
pub fn link_commits(log: &str, base_url: &str) -> String {
    COMMIT_LINE
        .replace_all(log, |caps: &regex::Captures| {
            format!(
                "{}\x1b]8;;{}/{}{}\x1b\\{}\x1b]8;;\x1b\\",
                &caps[1],
                base_url,
                &caps[2],
                &caps[3],
                &caps[2]
            )
        })
        .to_string()
}

pub fn run_preview(authors: &[String], config: &Config) {
    if authors.is_empty() {
        return;
    }
    let session = Session::from_env();
    let since = session.read_date_filter();
    let args = log_args(DetailKind::Preview, authors, &since, &session.git_args);

    let log = match session.git(config).output(&args) {
        Ok(log) => log,
        Err(e) => {
            tracing::debug!(error = %format!("{:#}", e), "preview log failed");
            return;
        }
    };

    match &session.base_url {
        Some(base) => print!("{}", link_commits(&log, base)),
        None => print!("{}", log),
    }
}

pub fn run_diffs(authors: &[String], config: &Config) {
    if authors.is_empty() {
        return;
    }
    let session = Session::from_env();
    let since = session.read_date_filter();
    let args = log_args(DetailKind::Diffs, authors, &since, &session.git_args);

    if let Err(e) = session.git(config).stream(&args) {
        tracing::debug!(error = %format!("{:#}", e), "diff log failed");
    }
}

/// Help overlay shown in the preview pane while `?` is toggled on.
pub fn help_text() -> String {
    let title = |s: &str| s.cyan().bold().to_string();
    let section = |s: &str| s.yellow().bold().to_string();

    format!(
        "
{}

{}
  ↑/↓, ^J/^K, ^N/^P Move cursor up/down
  ^F/^B             Scroll preview page down/up
  ^T                Toggle multi-select for current item

{}
  Tab               Show commits with diffs for selected author(s)
  Enter             Filter by date (type a date first, then Enter)
  ^W                Open author's commits in GitHub browser

{}
  ?                 Toggle this help
  ^Q                Exit and output selected items
  ^C/Esc            Exit

{}
  • Type to filter authors by name or email
  • Use ^T to select multiple authors, then Tab to view their diffs
  • Type a date (e.g., \"2024-01-01\" or \"3 months ago\") then Enter to filter

{}

This is an fzf-based application. If you like it, consider
sponsoring fzf's creator, {}:

    {}
",
        title("KEYBINDINGS"),
        section("Navigation"),
        section("Actions"),
        section("Other"),
        section("Tips"),
        "Press ? again to return to commit preview".cyan(),
        section("Junegunn Choi"),
        "https://github.com/sponsors/junegunn".cyan(),
    )
}
