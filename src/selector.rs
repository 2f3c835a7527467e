//! fzf session: builds the argument list and key bindings for one round,
//! runs fzf against the author table and decodes what it printed.

use crate::error::SelectorError;
use crate::session::Session;
use colored::Colorize;
use std::io::Write;
use std::process::{Command, Stdio};

/// Keys fzf reports through `--expect`.
pub const EXPECT_KEYS: &str = "ctrl-o,ctrl-c,ctrl-q,esc,enter";
pub const CONFIRM_KEY: &str = "enter";

/// What the navigator should do with a finished selector round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Use the typed query as the new date filter.
    ApplyFilter,
    /// Pop one date filter, or leave silently at the root.
    Back,
    /// Pop one date filter, or print the selection and leave at the root.
    Quit,
    /// Anything else: leave without output.
    Accept,
}

const KEY_ACTIONS: &[(&str, Action)] = &[
    ("ctrl-o", Action::ApplyFilter),
    (CONFIRM_KEY, Action::ApplyFilter),
    ("ctrl-c", Action::Back),
    ("esc", Action::Back),
    ("ctrl-q", Action::Quit),
];

impl Action {
    pub fn from_key(key: &str) -> Self {
        KEY_ACTIONS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, action)| *action)
            .unwrap_or(Action::Accept)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOutcome {
    pub query: String,
    pub key: String,
    pub action: Action,
    /// Selected rows; the row under the cursor when nothing was marked.
    pub selections: Vec<String>,
}

/// One blocking round of "show the table, wait for a decision".
pub trait Selector {
    fn select(&mut self, table: &str, filter: &str) -> Result<SelectorOutcome, SelectorError>;
}

/// Decodes `--print-query --expect` output: query, key, then selected rows.
pub fn parse_output(output: &str) -> Result<SelectorOutcome, SelectorError> {
    let lines: Vec<&str> = output.split('\n').collect();
    if lines.len() < 2 {
        return Err(SelectorError::Malformed { lines: lines.len() });
    }

    let query = lines[0].to_string();
    let key = lines[1].to_string();
    let selections = lines[2..]
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect();

    Ok(SelectorOutcome {
        action: Action::from_key(&key),
        query,
        key,
        selections,
    })
}

/// Quotes `s` for `sh -c` unless it only holds characters the shell
/// leaves alone.
pub fn escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    let safe = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_./:=@%+,-".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    }
}

pub fn header(filter: &str) -> String {
    if filter.is_empty() {
        "Showing full history".yellow().bold().to_string()
    } else {
        format!(
            "{}{}",
            "Showing commits since ".yellow().bold(),
            filter.white().bold()
        )
    }
}

pub struct FzfSelector<'a> {
    session: &'a Session,
    binary: String,
}

impl<'a> FzfSelector<'a> {
    pub fn new(session: &'a Session, binary: &str) -> Self {
        Self {
            session,
            binary: binary.to_string(),
        }
    }

    pub fn args(&self, filter: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "--ansi",
            "--delimiter",
            " {2,}",
            "--border",
            "horizontal",
            "--border=rounded",
            "--layout=reverse",
            "--pointer",
            "▶",
            "--no-scrollbar",
            "--preview-window=border-line",
            "--multi",
            "--print-query",
            "--expect",
            EXPECT_KEYS,
            "--color",
            "fg:15,bg:-1,hl:1",
            "--color",
            "header:green:italic",
            "--color",
            "prompt:80,info:40",
            "--color",
            "border:dim",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if self.session.no_mouse {
            args.push("--no-mouse".to_string());
        }

        args.push("--header".to_string());
        args.push(header(filter));
        args.push("--prompt".to_string());
        args.push("Filter by name/email or date > ".to_string());
        args.push("--info".to_string());
        args.push("inline: │ ? for help │ ".to_string());

        let me = escape(&self.session.self_path.to_string_lossy());
        let help = self
            .session
            .help_file
            .as_ref()
            .map(|p| escape(&p.to_string_lossy()))
            .unwrap_or_else(|| "/dev/null".to_string());

        // The email column is the last field; {-1} stays right for 4-digit ranks.
        args.push("--preview".to_string());
        args.push(format!(
            "if [ -s {help} ]; then {me} _help; else printf '\\n\\n'; {me} _preview {{+-1}}; fi"
        ));

        args.push("--bind".to_string());
        args.push("ctrl-b:preview-page-up,ctrl-f:preview-page-down".to_string());

        args.push("--bind".to_string());
        args.push(format!(
            "?:execute-silent(if [ -s {help} ]; then : > {help}; else echo 1 > {help}; fi)+refresh-preview"
        ));

        args.push("--bind".to_string());
        args.push(format!(
            "tab:execute(clear; {me} _diffs {{+-1}}; printf \"\\nPress any key to go back...\"; read -n 1 -r)"
        ));

        args.push("--bind".to_string());
        args.push("ctrl-t:toggle".to_string());

        args.push("--bind".to_string());
        args.push(format!("ctrl-w:execute({me} _browser {{-1}})"));

        args
    }
}

impl Selector for FzfSelector<'_> {
    fn select(&mut self, table: &str, filter: &str) -> Result<SelectorOutcome, SelectorError> {
        if let Err(e) = self.session.write_date_filter(filter) {
            tracing::warn!(error = %format!("{:#}", e), "could not share date filter");
        }

        let args = self.args(filter);
        tracing::debug!(binary = %self.binary, filter, "launching selector");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .envs(self.session.handoff_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SelectorError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // fzf may quit before reading everything; a broken pipe is fine.
            if let Err(e) = stdin.write_all(table.as_bytes()) {
                tracing::debug!(error = %e, "selector stopped reading input");
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| SelectorError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        // --expect exits 1 when nothing matched; the printed lines still count.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let outcome = parse_output(&stdout)?;
        tracing::debug!(key = %outcome.key, action = ?outcome.action, "selector finished");
        Ok(outcome)
    }
}
