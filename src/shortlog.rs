//! `git shortlog -nse` adapter: builds the argument list, runs it, and turns
//! the output into the ranked, colored table fed to the selector.

use crate::git::Git;
use crate::resolve::SEPARATOR;
use colored::Colorize;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_EMAIL: Regex = Regex::new(r"<[^>]+>$").unwrap();
}

/// One author row as reported by `git shortlog -nse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortlogEntry {
    pub rank: usize,
    pub count: u64,
    pub name: String,
    pub email: String,
}

/// Argument list for `git shortlog`, with the default revision injected
/// when the pass-through args name none.
pub fn shortlog_args(git_args: &[String], since: &str, default_revision: &str) -> Vec<String> {
    let mut args: Vec<String> = ["shortlog", "-n", "-s", "-e"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if !since.is_empty() {
        args.push(format!("--since={}", since));
    }
    args.extend(with_default_revision(git_args, default_revision));
    args
}

/// Shortlog reads stdin when no revision is given, so one is always passed.
/// Anything before `--` that is not a flag counts as a revision; the injected
/// one goes right before `--` because everything after it is a path.
pub fn with_default_revision(git_args: &[String], default_revision: &str) -> Vec<String> {
    let separator = git_args.iter().position(|a| a == SEPARATOR);
    let before = &git_args[..separator.unwrap_or(git_args.len())];

    if before.iter().any(|a| !a.starts_with('-')) {
        return git_args.to_vec();
    }

    let mut out = before.to_vec();
    out.push(default_revision.to_string());
    if let Some(idx) = separator {
        out.extend(git_args[idx..].iter().cloned());
    }
    out
}

pub fn parse_shortlog(output: &str) -> Vec<ShortlogEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // "  123\tName <email>"
        let Some((count, rest)) = line.split_once('\t') else {
            continue;
        };
        let count = count.trim().parse().unwrap_or(0);
        let rest = rest.trim();

        let email = TRAILING_EMAIL
            .find(rest)
            .map(|m| m.as_str())
            .unwrap_or("");
        let name = rest[..rest.len() - email.len()].trim();

        entries.push(ShortlogEntry {
            rank: entries.len() + 1,
            count,
            name: name.to_string(),
            email: email.to_string(),
        });
    }

    entries
}

/// Renders entries as `rank  count  name  email`, one row per line.
pub fn format_entries(entries: &[ShortlogEntry]) -> String {
    let count_width = entries
        .iter()
        .map(|e| e.count.to_string().len())
        .max()
        .unwrap_or(0);
    let name_width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut result = String::new();
    for e in entries {
        // Pad before coloring so escape codes don't count toward the width.
        let count = format!("{:>w$}", e.count, w = count_width);
        let name = format!("{:<w$}", e.name, w = name_width);
        result.push_str(&format!(
            "{:>4}  {}  {}  {}\n",
            e.rank,
            count.green().bold(),
            name.white().bold(),
            e.email.cyan()
        ));
    }
    result
}

pub fn format_shortlog_output(output: &str) -> String {
    format_entries(&parse_shortlog(output))
}

/// Produces the author table for one date filter.
pub struct Shortlog<'a> {
    git: &'a Git,
    git_args: &'a [String],
    default_revision: &'a str,
}

impl<'a> Shortlog<'a> {
    pub fn new(git: &'a Git, git_args: &'a [String], default_revision: &'a str) -> Self {
        Self {
            git,
            git_args,
            default_revision,
        }
    }

    /// Empty string on any git failure; the selector then shows an empty list.
    pub fn table(&self, since: &str) -> String {
        let args = shortlog_args(self.git_args, since, self.default_revision);
        match self.git.output(&args) {
            Ok(out) => format_shortlog_output(&out),
            Err(e) => {
                tracing::debug!(error = %format!("{:#}", e), "shortlog failed");
                String::new()
            }
        }
    }
}
