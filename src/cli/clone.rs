//! Cloning remote repositories for analysis

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Command;

const HTTPS_PREFIX: &str = "https://github.com/";
const SSH_PREFIX: &str = "git@github.com:";

/// Whether `path` should be cloned rather than read from disk
pub fn is_remote(path: &str, force: bool) -> bool {
    force || path.starts_with(HTTPS_PREFIX) || path.starts_with(SSH_PREFIX)
}

/// HTTPS form of a GitHub URL, ending in `.git`
pub fn normalize_url(url: &str) -> String {
    let mut url = match url.strip_prefix(SSH_PREFIX) {
        Some(rest) => format!("{}{}", HTTPS_PREFIX, rest),
        None => url.to_string(),
    };
    if !url.ends_with(".git") {
        url.push_str(".git");
    }
    url
}

/// Last path segment of the URL without `.git`
pub fn repo_name(url: &str) -> String {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repo".to_string()
    } else {
        name.to_string()
    }
}

/// Clone `url` into a fresh temporary directory that outlives the process
pub fn clone_repo(url: &str) -> Result<PathBuf> {
    let name = repo_name(url);
    let temp = tempfile::Builder::new()
        .prefix(&format!("onboarder_{}_", name))
        .tempdir()?;
    let target = temp.keep().join(&name);

    tracing::info!("Cloning {} into {}", url, target.display());

    let output = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(&target)
        .output()
        .map_err(|e| Error::clone_failed(url, format!("could not run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::clone_failed(url, stderr.trim()));
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://github.com/acme/shop", false));
        assert!(is_remote("git@github.com:acme/shop.git", false));
        assert!(!is_remote("./shop", false));
        assert!(is_remote("https://gitlab.com/acme/shop", true));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("git@github.com:acme/shop"),
            "https://github.com/acme/shop.git"
        );
        assert_eq!(
            normalize_url("https://github.com/acme/shop.git"),
            "https://github.com/acme/shop.git"
        );
        assert_eq!(
            normalize_url("https://gitlab.com/acme/shop"),
            "https://gitlab.com/acme/shop.git"
        );
    }

    #[test]
    fn test_repo_name() {
        assert_eq!(repo_name("https://github.com/acme/shop.git"), "shop");
        assert_eq!(repo_name("https://github.com/acme/shop/"), "shop");
        assert_eq!(repo_name(""), "repo");
    }
}
