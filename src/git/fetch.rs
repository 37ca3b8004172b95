use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Validate that `url` is a well-formed HTTPS Git URL.
/// Local paths and non-HTTPS schemes are rejected up front so a malformed
/// request never reaches libgit2 or the filesystem.
pub fn validate_repo_url(url: &str) -> Result<(), FetchError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(FetchError::InvalidUrl("empty URL".to_string()));
    }
    if url.chars().any(|c| c.is_whitespace()) {
        return Err(FetchError::InvalidUrl(
            "URL contains whitespace".to_string(),
        ));
    }

    let rest = url.strip_prefix("https://").ok_or_else(|| {
        FetchError::InvalidUrl("only https:// repository URLs are allowed".to_string())
    })?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() || !host.contains('.') {
        return Err(FetchError::InvalidUrl(format!("invalid host in {url}")));
    }
    if rest.split('/').nth(1).map(str::is_empty).unwrap_or(true) {
        return Err(FetchError::InvalidUrl(
            "URL has no repository path".to_string(),
        ));
    }

    Ok(())
}

/// Shallow-clone `url` into `target`. Blocking; callers run this under
/// `spawn_blocking` with a timeout.
pub fn clone_shallow(url: &str, target: &Path) -> Result<(), FetchError> {
    tracing::info!("Cloning {} into {}", url, target.display());

    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.depth(1);

    let result = git2::build::RepoBuilder::new()
        .fetch_options(fetch_options)
        .clone(url, target);

    match result {
        Ok(_) => {
            tracing::info!("Clone complete: {}", target.display());
            Ok(())
        }
        Err(e) => Err(classify_git_error(e)),
    }
}

/// Map libgit2 failures onto the fetch taxonomy. Transport errors carry the
/// HTTP status only in the message text, so this is partly string matching.
fn classify_git_error(e: git2::Error) -> FetchError {
    let message = e.message().to_lowercase();
    if e.code() == git2::ErrorCode::Auth
        || message.contains("401")
        || message.contains("403")
        || message.contains("authentication")
    {
        return FetchError::AuthRequired;
    }
    if e.code() == git2::ErrorCode::NotFound
        || message.contains("404")
        || message.contains("not found")
        || message.contains("could not resolve host")
    {
        return FetchError::NotFound;
    }
    FetchError::Git(e)
}

/// Total size of a directory tree in bytes.
pub fn dir_size_bytes(dir: &Path) -> u64 {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Deletes the working directory on drop unless the ingestion pipeline
/// completed and called [`WorkDirGuard::keep`]. This is what guarantees a
/// partial clone never outlives its failure.
pub struct WorkDirGuard {
    path: PathBuf,
    keep: bool,
}

impl WorkDirGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard: the session now owns the directory.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for WorkDirGuard {
    fn drop(&mut self) {
        if !self.keep && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::warn!("Failed to clean up {}: {e}", self.path.display());
            }
        }
    }
}
