//! Turns the raw top-level tokens into a repository root, feature flags and
//! the arguments handed to `git shortlog` / `git log`.
//!
//! A directory token picks the repository: either it is a repo root itself,
//! or it sits inside one and becomes a `-- <relative path>` filter.

use std::path::{Path, PathBuf};

pub const NO_MOUSE_FLAG: &str = "--no-mouse";
pub const SEPARATOR: &str = "--";
const GIT_MARKER: &str = ".git";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// `None` means "run git in the current directory".
    pub repo_root: Option<PathBuf>,
    pub no_mouse: bool,
    pub git_args: Vec<String>,
}

pub fn resolve(tokens: &[String]) -> Resolved {
    let mut out = Resolved::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token == NO_MOUSE_FLAG {
            out.no_mouse = true;
            i += 1;
            continue;
        }

        if token == SEPARATOR {
            if out.repo_root.is_none() {
                if let Some(rest) = resolve_after_separator(&tokens[i + 1..]) {
                    out.repo_root = Some(rest.0);
                    out.git_args.push(SEPARATOR.to_string());
                    out.git_args.extend(rest.1);
                    return out;
                }
            }
            // Paths and later separators are git's business from here on.
            out.git_args.extend(tokens[i..].iter().cloned());
            return out;
        }

        if out.repo_root.is_none() && !token.starts_with('-') && Path::new(token).is_dir() {
            if let Ok(abs) = std::path::absolute(token) {
                if is_repo_root(&abs) {
                    out.repo_root = Some(abs);
                    i += 1;
                    continue;
                }
                if let Some(root) = find_repo_root(&abs) {
                    let rel = relative_to(&root, &abs);
                    out.repo_root = Some(root);
                    if let Some(rel) = rel {
                        out.git_args.push(SEPARATOR.to_string());
                        out.git_args.push(rel);
                        i += 1;
                        continue;
                    }
                }
            }
        }

        out.git_args.push(token.clone());
        i += 1;
    }

    out
}

/// When the first path after `--` is a directory inside a repository, that
/// repository becomes the root and every path after `--` is rewritten
/// relative to it.
fn resolve_after_separator(paths: &[String]) -> Option<(PathBuf, Vec<String>)> {
    let first = paths.first()?;
    if !Path::new(first).is_dir() {
        return None;
    }
    let abs = std::path::absolute(first).ok()?;
    let root = find_repo_root(&abs)?;

    let rewritten = paths
        .iter()
        .map(|p| {
            std::path::absolute(p)
                .ok()
                .and_then(|abs| relative_to(&root, &abs))
                .unwrap_or_else(|| p.clone())
        })
        .collect();

    Some((root, rewritten))
}

pub fn is_repo_root(dir: &Path) -> bool {
    dir.join(GIT_MARKER).exists()
}

/// Walks upward from `start` until a directory holding `.git` is found.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_repo_root(dir))
        .map(Path::to_path_buf)
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = rel.to_str()?;
    if rel.is_empty() {
        Some(".".to_string())
    } else {
        Some(rel.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _tmp: tempfile::TempDir,
        outside: PathBuf,
        repo: PathBuf,
        src: PathBuf,
        pkg: PathBuf,
    }

    // tmp/repo/.git, tmp/repo/src/pkg
    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().expect("tempdir");
        let outside = tmp.path().to_path_buf();
        let repo = outside.join("repo");
        let src = repo.join("src");
        let pkg = src.join("pkg");
        fs::create_dir_all(repo.join(".git")).expect("create .git");
        fs::create_dir_all(&pkg).expect("create pkg");
        Fixture {
            _tmp: tmp,
            outside,
            repo,
            src,
            pkg,
        }
    }

    fn s(p: &Path) -> String {
        p.to_str().unwrap().to_string()
    }

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn find_repo_root_walks_up() {
        let f = fixture();
        assert_eq!(find_repo_root(&f.repo), Some(f.repo.clone()));
        assert_eq!(find_repo_root(&f.src), Some(f.repo.clone()));
        assert_eq!(find_repo_root(&f.pkg), Some(f.repo.clone()));
    }

    #[test]
    fn find_repo_root_outside_any_repo() {
        let f = fixture();
        // The tempdir itself may live under a checkout on odd CI setups.
        if find_repo_root(f.outside.parent().unwrap()).is_some() {
            return;
        }
        assert_eq!(find_repo_root(&f.outside), None);
    }

    #[test]
    fn directory_outside_any_repo_passes_through() {
        let f = fixture();
        if find_repo_root(f.outside.parent().unwrap()).is_some() {
            return;
        }
        let plain = f.outside.join("plain");
        fs::create_dir_all(&plain).expect("create plain");
        let plain = s(&plain);

        let r = resolve(&args(&[plain.as_str(), "--since=1 week ago"]));
        assert_eq!(r.repo_root, None);
        assert_eq!(r.git_args, args(&[plain.as_str(), "--since=1 week ago"]));
    }

    #[test]
    fn no_mouse_is_consumed() {
        let r = resolve(&args(&["--no-mouse", "--since=1 month ago"]));
        assert!(r.no_mouse);
        assert_eq!(r.git_args, args(&["--since=1 month ago"]));
        assert_eq!(r.repo_root, None);
    }

    #[test]
    fn plain_tokens_pass_through() {
        for input in [
            vec!["HEAD~10..HEAD"],
            vec!["--since=2024-01-01"],
            vec!["-n", "10", "--since=1 week ago"],
        ] {
            let r = resolve(&args(&input));
            assert_eq!(r.git_args, args(&input));
            assert!(!r.no_mouse);
        }
    }

    #[test]
    fn repo_root_token_is_dropped() {
        let f = fixture();
        let r = resolve(&[s(&f.repo)]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert!(r.git_args.is_empty());
    }

    #[test]
    fn repo_root_with_more_args() {
        let f = fixture();
        let r = resolve(&[s(&f.repo), "--since=1 week ago".to_string()]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, args(&["--since=1 week ago"]));
    }

    #[test]
    fn subdirectory_becomes_path_filter() {
        let f = fixture();
        let r = resolve(&[s(&f.src)]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, args(&["--", "src"]));

        let r = resolve(&[s(&f.pkg)]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, args(&["--", "src/pkg"]));
    }

    #[test]
    fn separator_then_subdirectory() {
        let f = fixture();
        let r = resolve(&["--".to_string(), s(&f.src)]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, args(&["--", "src"]));
    }

    #[test]
    fn flags_before_separator_are_kept() {
        let f = fixture();
        let r = resolve(&[
            "--since=1 week ago".to_string(),
            "--".to_string(),
            s(&f.src),
            s(&f.pkg),
        ]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, args(&["--since=1 week ago", "--", "src", "src/pkg"]));
    }

    #[test]
    fn separator_with_non_directory_is_verbatim() {
        let r = resolve(&args(&["--", "does/not/exist", "--", "x"]));
        assert_eq!(r.repo_root, None);
        assert_eq!(r.git_args, args(&["--", "does/not/exist", "--", "x"]));
    }

    #[test]
    fn only_first_directory_selects_root() {
        let f = fixture();
        let r = resolve(&[s(&f.repo), s(&f.src)]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, vec![s(&f.src)]);
    }

    #[test]
    fn separator_after_root_is_not_rewritten() {
        let f = fixture();
        let r = resolve(&[s(&f.repo), "--".to_string(), s(&f.src)]);
        assert_eq!(r.repo_root, Some(f.repo.clone()));
        assert_eq!(r.git_args, vec!["--".to_string(), s(&f.src)]);
    }

    #[test]
    fn no_mouse_after_separator_is_a_path() {
        let r = resolve(&args(&["--", "--no-mouse"]));
        assert!(!r.no_mouse);
        assert_eq!(r.git_args, args(&["--", "--no-mouse"]));
    }
}
