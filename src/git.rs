use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Builds `git` invocations pinned to one repository with `-C <root>`.
#[derive(Debug, Clone)]
pub struct Git {
    binary: String,
    repo_root: Option<PathBuf>,
}

impl Git {
    pub fn new(binary: &str, repo_root: Option<&Path>) -> Self {
        Self {
            binary: binary.to_string(),
            repo_root: repo_root.map(Path::to_path_buf),
        }
    }

    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.binary);
        if let Some(root) = &self.repo_root {
            cmd.arg("-C").arg(root);
        }
        cmd.args(args);
        cmd
    }

    /// Runs git and returns stdout; a non-zero exit is an error.
    pub fn output(&self, args: &[String]) -> Result<String> {
        tracing::debug!(git = %self.binary, ?args, root = ?self.repo_root, "running git");
        let output = self
            .command(args)
            .output()
            .with_context(|| format!("Failed to run {} {}", self.binary, first_word(args)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} {} exited with {}: {}",
                self.binary,
                first_word(args),
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Runs git with the terminal attached (stdout/stderr inherited).
    pub fn stream(&self, args: &[String]) -> Result<()> {
        tracing::debug!(git = %self.binary, ?args, root = ?self.repo_root, "streaming git");
        let status = self
            .command(args)
            .status()
            .with_context(|| format!("Failed to run {} {}", self.binary, first_word(args)))?;
        if !status.success() {
            tracing::debug!(%status, "git exited non-zero");
        }
        Ok(())
    }

    /// First configured remote URL among `remotes`, in order.
    pub fn remote_url(&self, remotes: &[String]) -> Option<String> {
        remotes.iter().find_map(|remote| {
            let key = format!("remote.{}.url", remote);
            let args = ["config".to_string(), "--get".to_string(), key];
            self.output(&args)
                .ok()
                .map(|out| out.trim().to_string())
                .filter(|url| !url.is_empty())
        })
    }
}

fn first_word(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("")
}
