//! Session context: everything one explorer run needs, built once and then
//! only read. Detail subcommands run as separate processes, so the context
//! is handed to them through environment variables and rebuilt there.

use crate::config::Config;
use crate::git::Git;
use crate::resolve;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const ENV_ARGS: &str = "GH_SHORTLOG_ARGS";
pub const ENV_DIR: &str = "GH_SHORTLOG_DIR";
pub const ENV_DATE_FILE: &str = "GH_SHORTLOG_DATE_FILE";
pub const ENV_BASE_URL: &str = "GH_SHORTLOG_BASE_URL";
pub const ENV_ORG_REPO: &str = "GH_SHORTLOG_ORG_REPO";
pub const ENV_HELP_STATE: &str = "GH_SHORTLOG_HELP_STATE";

/// Joins pass-through args; git args may contain spaces, commas, colons.
pub const UNIT_SEPARATOR: char = '\x1f';

lazy_static! {
    static ref REMOTE_URL: Regex =
        Regex::new(r"(?:@|//)([^/:]+)[:/]([^/]+)/([^/]+?)(?:\.git)?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub repo_root: Option<PathBuf>,
    pub git_args: Vec<String>,
    pub no_mouse: bool,
    /// Holds the active date filter for preview/diff processes.
    pub date_file: Option<PathBuf>,
    /// Non-empty while the help overlay is toggled on.
    pub help_file: Option<PathBuf>,
    /// `https://<host>/<org>/<repo>/commit`
    pub base_url: Option<String>,
    /// `<org>/<repo>`
    pub org_repo: Option<String>,
    pub self_path: PathBuf,
}

/// Host, org and repo of a remote URL (ssh or https form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    pub host: String,
    pub org: String,
    pub repo: String,
}

impl RemoteInfo {
    pub fn parse(url: &str) -> Option<Self> {
        let caps = REMOTE_URL.captures(url.trim())?;
        Some(Self {
            host: caps[1].to_string(),
            org: caps[2].to_string(),
            repo: caps[3].to_string(),
        })
    }

    pub fn org_repo(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }

    pub fn commit_base_url(&self) -> String {
        format!("https://{}/{}/commit", self.host, self.org_repo())
    }
}

impl Session {
    /// Interactive entry: resolve the CLI tokens, create the transient files
    /// and look up the hosting remote.
    pub fn interactive(tokens: &[String], config: &Config) -> Result<Self> {
        let resolved = resolve::resolve(tokens);
        // A parent explorer may already have set these for us.
        let inherited = Self::from_env();

        let date_file = match inherited.date_file {
            Some(path) => path,
            None => transient_file("gh-shortlog-date-")?,
        };
        let help_file = transient_file("gh-shortlog-help-")?;

        let mut session = Self {
            repo_root: resolved.repo_root,
            git_args: resolved.git_args,
            no_mouse: resolved.no_mouse || config.selector.no_mouse,
            date_file: Some(date_file),
            help_file: Some(help_file),
            base_url: inherited.base_url,
            org_repo: inherited.org_repo,
            self_path: self_path(),
        };

        if session.base_url.is_none() || session.org_repo.is_none() {
            let git = Git::new(&config.git.binary, session.repo_root.as_deref());
            if let Some(remote) = git
                .remote_url(&config.git.remotes)
                .as_deref()
                .and_then(RemoteInfo::parse)
            {
                session.base_url = Some(remote.commit_base_url());
                session.org_repo = Some(remote.org_repo());
            }
        }

        tracing::debug!(
            repo_root = ?session.repo_root,
            git_args = ?session.git_args,
            org_repo = ?session.org_repo,
            "session ready"
        );
        Ok(session)
    }

    /// Rebuilds the context inside a detail subcommand.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            repo_root: get(ENV_DIR).map(PathBuf::from),
            git_args: get(ENV_ARGS)
                .map(|joined| decode_args(&joined))
                .unwrap_or_default(),
            no_mouse: false,
            date_file: get(ENV_DATE_FILE).map(PathBuf::from),
            help_file: get(ENV_HELP_STATE).map(PathBuf::from),
            base_url: get(ENV_BASE_URL),
            org_repo: get(ENV_ORG_REPO),
            self_path: self_path(),
        }
    }

    /// Variables handed to every process the selector spawns.
    pub fn handoff_env(&self) -> Vec<(&'static str, String)> {
        let path = |p: &Option<PathBuf>| {
            p.as_deref()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default()
        };
        vec![
            (ENV_ARGS, encode_args(&self.git_args)),
            (ENV_DIR, path(&self.repo_root)),
            (ENV_DATE_FILE, path(&self.date_file)),
            (ENV_BASE_URL, self.base_url.clone().unwrap_or_default()),
            (ENV_ORG_REPO, self.org_repo.clone().unwrap_or_default()),
            (ENV_HELP_STATE, path(&self.help_file)),
        ]
    }

    pub fn git(&self, config: &Config) -> Git {
        Git::new(&config.git.binary, self.repo_root.as_deref())
    }

    pub fn write_date_filter(&self, filter: &str) -> Result<()> {
        let Some(path) = &self.date_file else {
            return Ok(());
        };
        std::fs::write(path, filter)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Active date filter, or "" when unset or unreadable.
    pub fn read_date_filter(&self) -> String {
        self.date_file
            .as_deref()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

pub fn encode_args(args: &[String]) -> String {
    args.join(&UNIT_SEPARATOR.to_string())
}

pub fn decode_args(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(UNIT_SEPARATOR).map(|s| s.to_string()).collect()
}

/// Creates an empty temp file that outlives this process.
fn transient_file(prefix: &str) -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .tempfile()
        .context("Failed to create temp file")?;
    let (_, path) = file.keep().context("Failed to persist temp file")?;
    Ok(path)
}

fn self_path() -> PathBuf {
    std::env::current_exe().unwrap_or_else(|_| {
        std::env::args()
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new("gh-shortlog").to_path_buf())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_remote_urls() {
        let cases = [
            ("git@github.com:sideshowbarker/gh-shortlog.git", "github.com", "sideshowbarker", "gh-shortlog"),
            ("git@github.com:user/repo", "github.com", "user", "repo"),
            ("https://github.com/cli/cli.git", "github.com", "cli", "cli"),
            ("https://github.com/org/repo", "github.com", "org", "repo"),
            ("git@github.mycompany.com:team/project.git", "github.mycompany.com", "team", "project"),
        ];
        for (url, host, org, repo) in cases {
            let info = RemoteInfo::parse(url).unwrap_or_else(|| panic!("no match for {}", url));
            assert_eq!(info.host, host, "{}", url);
            assert_eq!(info.org, org, "{}", url);
            assert_eq!(info.repo, repo, "{}", url);
        }
        assert_eq!(RemoteInfo::parse("not-a-url"), None);
    }

    #[test]
    fn remote_info_urls() {
        let info = RemoteInfo::parse("git@github.com:cli/cli.git").unwrap();
        assert_eq!(info.org_repo(), "cli/cli");
        assert_eq!(info.commit_base_url(), "https://github.com/cli/cli/commit");
    }

    #[test]
    fn args_survive_unit_separator_encoding() {
        let args: Vec<String> = vec!["--since=1 week ago".into(), "a,b:c".into(), "--".into(), "src dir".into()];
        assert_eq!(decode_args(&encode_args(&args)), args);
        assert!(decode_args("").is_empty());
    }

    #[test]
    fn handoff_round_trips_through_env() {
        let session = Session {
            repo_root: Some(PathBuf::from("/work/repo")),
            git_args: vec!["--since=2024-01-01".into(), "--".into(), "src".into()],
            no_mouse: true,
            date_file: Some(PathBuf::from("/tmp/date")),
            help_file: Some(PathBuf::from("/tmp/help")),
            base_url: Some("https://github.com/o/r/commit".into()),
            org_repo: Some("o/r".into()),
            self_path: PathBuf::from("/bin/gh-shortlog"),
        };

        let env: HashMap<&str, String> = session.handoff_env().into_iter().collect();
        assert_eq!(env[ENV_ARGS], "--since=2024-01-01\x1f--\x1fsrc");

        let rebuilt = Session::from_lookup(|k| env.get(k).cloned());
        assert_eq!(rebuilt.repo_root, session.repo_root);
        assert_eq!(rebuilt.git_args, session.git_args);
        assert_eq!(rebuilt.date_file, session.date_file);
        assert_eq!(rebuilt.help_file, session.help_file);
        assert_eq!(rebuilt.base_url, session.base_url);
        assert_eq!(rebuilt.org_repo, session.org_repo);
    }

    #[test]
    fn empty_env_means_unset() {
        let s = Session::from_lookup(|_| Some(String::new()));
        assert_eq!(s.repo_root, None);
        assert!(s.git_args.is_empty());
        assert_eq!(s.date_file, None);
        assert_eq!(s.base_url, None);
        assert_eq!(s.read_date_filter(), "");
    }

    #[test]
    fn date_filter_is_shared_through_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = Session::from_lookup(|_| None);
        s.date_file = Some(tmp.path().join("date"));

        s.write_date_filter("3 months ago").unwrap();
        assert_eq!(s.read_date_filter(), "3 months ago");
        s.write_date_filter("").unwrap();
        assert_eq!(s.read_date_filter(), "");
    }

    #[test]
    fn transient_files_persist() {
        let path = transient_file("gh-shortlog-test-").unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        std::fs::remove_file(path).unwrap();
    }
}
