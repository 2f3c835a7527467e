mod browser;
mod config;
mod detail;
mod error;
mod git;
mod navigator;
mod resolve;
mod selector;
mod session;
mod shortlog;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use selector::FzfSelector;
use session::Session;
use shortlog::Shortlog;
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `GH_SHORTLOG_LOG=debug`.
const LOG_ENV: &str = "GH_SHORTLOG_LOG";

const AFTER_HELP: &str = "\
Explorer options:
  --no-mouse    Disable mouse support in fzf

All other options are passed directly to git shortlog/log.
See 'git shortlog --help' for available options.

Examples:
  gh shortlog                           # Full history
  gh shortlog ~/other-repo              # Different repository
  gh shortlog --since=\"1 month ago\"     # Recent commits
  gh shortlog origin..HEAD              # Commits not yet pushed
  gh shortlog -- src/                   # Only changes in src/

Interactive keys (press ? in the UI for full help):
  ?          Show/hide keybindings help in preview
  Tab        View commits with diffs for selected author(s)
  Enter      Filter by date (type date first, then Enter)
  Ctrl-T     Toggle multi-select for current author
  Ctrl-W     Open author's commits in GitHub
  Ctrl-Q     Exit and output selected items
  Ctrl-C     Exit";

#[derive(Parser)]
#[command(
    name = "gh-shortlog",
    version,
    about = "gh-shortlog - Interactive git shortlog explorer",
    override_usage = "gh-shortlog [options] [<revision-range>] [[--] <path>...]",
    after_help = AFTER_HELP,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", short_alias = 'V', action = clap::ArgAction::Version)]
    version: (),

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Verbs fzf calls back into; not meant to be typed.
#[derive(Subcommand)]
enum Commands {
    /// Commit list for the given author(s)
    #[command(name = "_preview", hide = true)]
    Preview {
        #[arg(allow_hyphen_values = true)]
        authors: Vec<String>,
    },

    /// Commits with patches for the given author(s)
    #[command(name = "_diffs", hide = true)]
    Diffs {
        #[arg(allow_hyphen_values = true)]
        authors: Vec<String>,
    },

    /// Open the author's commits on GitHub
    #[command(name = "_browser", hide = true)]
    Browser {
        #[arg(allow_hyphen_values = true)]
        email: Option<String>,
    },

    /// Key binding overlay for the preview pane
    #[command(name = "_help", hide = true)]
    Help,

    /// Show the effective configuration
    #[command(name = "_config", hide = true)]
    Config,
}

const INTERNAL_VERBS: &[&str] = &["_preview", "_diffs", "_browser", "_help", "_config"];

/// Only these first tokens go through clap; everything else, `--` included,
/// must reach the resolver untouched.
fn is_cli_token(first: Option<&String>) -> bool {
    match first.map(String::as_str) {
        Some("-h" | "--help" | "-v" | "-V" | "--version") => true,
        Some(verb) => INTERNAL_VERBS.contains(&verb),
        None => false,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Output goes to fzf (table, preview pane), never straight to a terminal
/// check, so colors are forced unless NO_COLOR asks otherwise.
fn force_color() {
    if std::env::var_os("NO_COLOR").is_none() {
        colored::control::set_override(true);
    }
}

fn explore(tokens: &[String]) -> Result<()> {
    let config = Config::load_or_default();
    force_color();

    let session = Session::interactive(tokens, &config)?;
    let git = session.git(&config);
    let history = Shortlog::new(&git, &session.git_args, &config.git.default_revision);
    let mut selector = FzfSelector::new(&session, &config.selector.binary);

    for row in navigator::run(&history, &mut selector) {
        println!("{}", row);
    }

    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    let tokens: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().to_string())
        .collect();

    if !is_cli_token(tokens.first()) {
        return explore(&tokens);
    }

    let cli = Cli::parse();

    match cli.command {
        // clap exits on its own for --help/--version.
        None => {}

        Some(Commands::Preview { authors }) => {
            detail::run_preview(&authors, &Config::load_or_default());
        }

        Some(Commands::Diffs { authors }) => {
            detail::run_diffs(&authors, &Config::load_or_default());
        }

        Some(Commands::Browser { email }) => {
            if let Some(email) = email {
                browser::run(&email, &Config::load_or_default());
            }
        }

        Some(Commands::Help) => {
            force_color();
            print!("{}", detail::help_text());
        }

        Some(Commands::Config) => {
            config::show_config()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn tokens(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn only_help_version_and_verbs_reach_clap() {
        for t in ["-h", "--help", "-v", "-V", "--version", "_preview", "_diffs", "_browser", "_help", "_config"] {
            assert!(is_cli_token(tokens(&[t]).first()), "{}", t);
        }
        for t in ["--", "--no-mouse", "--since=1 week ago", "HEAD~3..HEAD", "_unknown", "src/"] {
            assert!(!is_cli_token(tokens(&[t]).first()), "{}", t);
        }
        assert!(!is_cli_token(None));
    }

    #[test]
    fn preview_takes_many_authors() {
        let cli = Cli::try_parse_from(["gh-shortlog", "_preview", "<a@x>", "<b@x>"]).unwrap();
        match cli.command {
            Some(Commands::Preview { authors }) => assert_eq!(authors, tokens(&["<a@x>", "<b@x>"])),
            _ => panic!("expected _preview"),
        }
    }

    #[test]
    fn short_v_is_version_not_a_git_flag() {
        assert!(is_cli_token(tokens(&["-v"]).first()));
        for flag in ["-v", "-V", "--version"] {
            let err = Cli::try_parse_from(["gh-shortlog", flag]).err().expect("version exits");
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion, "{}", flag);
        }
    }

    #[test]
    fn browser_email_is_optional() {
        let cli = Cli::try_parse_from(["gh-shortlog", "_browser"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Browser { email: None })));
    }
}
