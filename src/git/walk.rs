use std::path::Path;
use walkdir::WalkDir;

use crate::models::SourceFile;

/// Files above this size are skipped outright.
const MAX_FILE_BYTES: u64 = 1_048_576;

/// How many leading bytes to probe for binary content.
const SNIFF_BYTES: usize = 8_192;

/// Walk the cloned tree and return every indexable text file.
/// Binary detection is content-based (NUL probe + strict UTF-8), not
/// extension-based, so unlabeled text files like LICENSE still get indexed.
pub fn walk_source_files(repo_dir: &Path) -> Vec<SourceFile> {
    let mut files = Vec::new();

    // Collected and path-sorted so chunk ids are stable for a given tree
    let mut entries: Vec<_> = WalkDir::new(repo_dir)
        .into_iter()
        .filter_entry(|e| !is_hidden_or_ignored(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in entries {
        let path = entry.path();

        if let Ok(meta) = entry.metadata() {
            if meta.len() > MAX_FILE_BYTES {
                continue;
            }
        }

        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        if looks_binary(&bytes) {
            continue;
        }
        let Ok(content) = String::from_utf8(bytes) else {
            continue;
        };

        let relative = path
            .strip_prefix(repo_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let language = detect_language(path);
        files.push(SourceFile {
            relative_path: relative,
            content,
            language,
        });
    }

    files
}

fn is_hidden_or_ignored(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') && entry.depth() > 0 {
        return true;
    }
    // Skip build artifacts, vendored dependencies and VCS metadata
    matches!(
        name.as_ref(),
        "node_modules"
            | "target"
            | "dist"
            | "build"
            | "__pycache__"
            | ".git"
            | "vendor"
            | "venv"
            | ".venv"
            | "env"
    )
}

/// A NUL byte in the leading window marks the file as binary.
fn looks_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(SNIFF_BYTES)
        .any(|b| *b == 0)
}

fn detect_language(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "lua" => "lua",
        "sh" | "bash" | "zsh" | "fish" => "shell",
        "sql" => "sql",
        "html" => "html",
        "css" | "scss" | "less" => "css",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "xml" => "xml",
        "md" | "rst" | "txt" => "text",
        "proto" => "protobuf",
        "hs" => "haskell",
        "ex" | "exs" => "elixir",
        "zig" => "zig",
        "dart" => "dart",
        _ => "text",
    }
    .to_string()
}
