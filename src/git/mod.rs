//! Repository fetching and file walking.

pub mod fetch;
pub mod walk;

pub use fetch::{clone_shallow, dir_size_bytes, validate_repo_url, WorkDirGuard};
pub use walk::walk_source_files;
