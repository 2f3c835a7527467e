//! `_browser`: open the hosted "commits by author" page for one row.
//! Every step is best effort; a failed lookup degrades the URL, and a
//! failed opener does nothing.

use crate::config::Config;
use crate::session::Session;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::process::Command;

lazy_static! {
    // 12345+handle@users.noreply.github.com
    static ref MASKED_EMAIL: Regex = Regex::new(r"^[^+]+\+([^@]+)@.*$").unwrap();
}

const DATE_FORMAT: &str = "+%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct CommitItem {
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    login: String,
}

pub fn run(email: &str, config: &Config) {
    let session = Session::from_env();
    let Some(org_repo) = session.org_repo.as_deref() else {
        tracing::debug!("no hosting remote; nothing to open");
        return;
    };

    let author = author_from_email(email);
    let looked_up = if config.browser.lookup_login {
        lookup_login(&config.browser.gh_binary, org_repo, &author)
    } else {
        None
    };
    let login = looked_up.unwrap_or(author);

    let since = session.read_date_filter();
    let since = if since.is_empty() {
        None
    } else {
        normalize_date(&since)
    };

    open_url(&commits_url(org_repo, &login, since.as_deref()));
}

/// `<12345+handle@users.noreply.github.com>` → `handle`,
/// `<jane@example.com>` → `jane`.
pub fn author_from_email(email: &str) -> String {
    let bare = email.trim().trim_matches(|c| c == '<' || c == '>');
    if let Some(caps) = MASKED_EMAIL.captures(bare) {
        return caps[1].to_string();
    }
    match bare.split_once('@') {
        Some((local, _)) => local.to_string(),
        None => bare.to_string(),
    }
}

pub fn commits_url(org_repo: &str, login: &str, since: Option<&str>) -> String {
    let mut url = format!(
        "https://github.com/{}/commits?author={}",
        org_repo,
        encode_query_value(login)
    );
    if let Some(since) = since {
        url.push_str("&since=");
        url.push_str(&encode_query_value(since));
    }
    url
}

/// Percent-encodes a query value. Unreserved characters and `:` stay as is.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// First commit author login from a `gh api .../commits` response.
pub fn parse_login(json: &str) -> Option<String> {
    let items: Vec<CommitItem> = serde_json::from_str(json).ok()?;
    items
        .into_iter()
        .find_map(|item| item.author)
        .map(|a| a.login)
        .filter(|login| !login.is_empty())
}

fn lookup_login(gh: &str, org_repo: &str, author: &str) -> Option<String> {
    let endpoint = format!(
        "/repos/{}/commits?author={}&per_page=1",
        org_repo,
        encode_query_value(author)
    );
    let output = Command::new(gh).args(["api", &endpoint]).output();
    match output {
        Ok(out) if out.status.success() => parse_login(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::debug!(status = %out.status, "gh api lookup failed");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "gh not available");
            None
        }
    }
}

/// ISO-8601 form GitHub accepts for `since`. Plain dates are handled here,
/// anything else ("3 months ago") goes to GNU date.
pub fn normalize_date(date: &str) -> Option<String> {
    if let Ok(day) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        return Some(day.format("%Y-%m-%dT00:00:00Z").to_string());
    }

    // macOS ships BSD date; coreutils installs GNU date as gdate.
    let date_bin = if command_exists("gdate") { "gdate" } else { "date" };
    let output = Command::new(date_bin)
        .arg(DATE_FORMAT)
        .arg(format!("--date={}", date))
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(date_bin, date, "date could not parse filter");
        return None;
    }
    let formatted = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!formatted.is_empty()).then_some(formatted)
}

fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Platform opener command, if this platform has one.
pub fn opener(url: &str) -> Option<Command> {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "linux") {
        Command::new("xdg-open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/c", "start"]);
        cmd
    } else {
        return None;
    };
    cmd.arg(url);
    Some(cmd)
}

fn open_url(url: &str) {
    tracing::debug!(url, "opening browser");
    match opener(url) {
        Some(mut cmd) => {
            if let Err(e) = cmd.status() {
                tracing::debug!(error = %e, "browser opener failed");
            }
        }
        None => eprintln!("Cannot open browser on {}", std::env::consts::OS),
    }
}
