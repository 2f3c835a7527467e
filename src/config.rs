use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overrides the config file location (mostly for tests and packaging).
pub const CONFIG_ENV: &str = "GH_SHORTLOG_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selector binary (default: fzf from PATH)
    #[serde(default = "SelectorConfig::default_binary")]
    pub binary: String,
    /// Disable mouse input even without `--no-mouse`
    #[serde(default)]
    pub no_mouse: bool,
}

impl SelectorConfig {
    fn default_binary() -> String {
        "fzf".to_string()
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            no_mouse: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "GitConfig::default_binary")]
    pub binary: String,
    /// Remotes probed, in order, for the hosting URL.
    #[serde(default = "GitConfig::default_remotes")]
    pub remotes: Vec<String>,
    /// Revision injected when the pass-through args name none.
    #[serde(default = "GitConfig::default_revision")]
    pub default_revision: String,
}

impl GitConfig {
    fn default_binary() -> String {
        "git".to_string()
    }
    fn default_remotes() -> Vec<String> {
        vec!["upstream".to_string(), "origin".to_string()]
    }
    fn default_revision() -> String {
        "HEAD".to_string()
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            remotes: Self::default_remotes(),
            default_revision: Self::default_revision(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Ask the GitHub API for the author's login before opening the page.
    #[serde(default = "bool_true")]
    pub lookup_login: bool,
    #[serde(default = "BrowserConfig::default_gh_binary")]
    pub gh_binary: String,
}

fn bool_true() -> bool {
    true
}

impl BrowserConfig {
    fn default_gh_binary() -> String {
        "gh".to_string()
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            lookup_login: true,
            gh_binary: Self::default_gh_binary(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = get_config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config in {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Like `load`, but a broken config file never stops the explorer.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "falling back to default config");
                Config::default()
            }
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(config_dir.join("gh-shortlog").join("config.toml"))
}

pub fn show_config() -> Result<()> {
    let path = get_config_path()?;
    println!("Config: {}", path.display());
    println!();

    if path.exists() {
        let config = Config::load()?;
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        println!("(default config, file not created)");
        println!();
        let config = Config::default();
        println!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_tools() {
        let cfg = Config::default();
        assert_eq!(cfg.selector.binary, "fzf");
        assert!(!cfg.selector.no_mouse);
        assert_eq!(cfg.git.binary, "git");
        assert_eq!(cfg.git.remotes, vec!["upstream", "origin"]);
        assert_eq!(cfg.git.default_revision, "HEAD");
        assert!(cfg.browser.lookup_login);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[selector]
no_mouse = true

[git]
remotes = ["origin"]
"#,
        )
        .unwrap();
        assert!(cfg.selector.no_mouse);
        assert_eq!(cfg.selector.binary, "fzf");
        assert_eq!(cfg.git.remotes, vec!["origin"]);
        assert_eq!(cfg.git.default_revision, "HEAD");
        assert_eq!(cfg.browser, BrowserConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn config_serializes_back_to_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("[selector]"));
        assert!(text.contains("default_revision = \"HEAD\""));
    }
}
