//! Sandboxed filesystem tools (§4.7), grounded on
//! `sa_tools::file_ops::validate_path`: reject absolute paths, reject raw
//! `..` components, canonicalize-and-contain check against the project
//! root. Extended with an extension allow-list, a protected-path set, and
//! `search_code`/`git_status`/`git_commit` (subprocess invocation, grounded
//! on `sa_tools::exec`'s timeout pattern).

use alex_domain::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Extensions writable under the sandbox; anything else is rejected even if
/// the path itself is otherwise allowed.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "rs", "toml", "md", "txt", "json", "yaml", "yml", "py", "js", "ts", "sh", "cfg", "ini", "lock",
];

/// Paths that may only be written with `require_confirmation=false`.
const PROTECTED_PATHS: &[&str] = &[".env", "Cargo.lock", ".git/config"];

const GIT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub size: u64,
    pub modified: String,
    pub is_dir: bool,
}

/// Validates and resolves `requested` within `project_root`. Rejects
/// absolute paths and raw `..` components before touching the filesystem,
/// then canonicalizes the longest existing ancestor and checks containment.
pub fn validate_path(project_root: &Path, requested: &str) -> Result<PathBuf> {
    let requested_path = Path::new(requested);
    if requested_path.is_absolute() {
        return Err(Error::PathNotAllowed(format!("absolute paths are not allowed (got '{requested}')")));
    }
    for component in requested_path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(Error::PathNotAllowed("path must not contain '..' components".into()));
        }
    }

    let canonical_root = project_root
        .canonicalize()
        .map_err(|e| Error::PathNotAllowed(format!("cannot resolve project root '{}': {e}", project_root.display())))?;

    let candidate = canonical_root.join(requested_path);

    let resolved = if candidate.exists() {
        candidate
            .canonicalize()
            .map_err(|e| Error::PathNotAllowed(format!("cannot resolve '{}': {e}", candidate.display())))?
    } else {
        let mut existing = candidate.as_path();
        let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
        loop {
            if existing.exists() {
                break;
            }
            match existing.parent() {
                Some(parent) => {
                    if let Some(name) = existing.file_name() {
                        tail.push(name);
                    }
                    existing = parent;
                }
                None => break,
            }
        }
        let mut resolved = existing
            .canonicalize()
            .map_err(|e| Error::PathNotAllowed(format!("cannot resolve ancestor of '{}': {e}", candidate.display())))?;
        for part in tail.into_iter().rev() {
            resolved.push(part);
        }
        resolved
    };

    if !resolved.starts_with(&canonical_root) {
        return Err(Error::PathNotAllowed(format!(
            "path '{requested}' resolves outside project root '{}'",
            canonical_root.display()
        )));
    }

    Ok(resolved)
}

fn extension_allowed(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_protected(requested: &str) -> bool {
    PROTECTED_PATHS.iter().any(|p| requested == *p || requested.ends_with(&format!("/{p}")))
}

pub async fn read_file(project_root: &Path, requested: &str) -> Result<serde_json::Value> {
    let path = validate_path(project_root, requested)?;
    let content = fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(requested.to_string())
        } else {
            Error::Io(e)
        }
    })?;
    Ok(serde_json::json!({ "path": requested, "content": content }))
}

/// Writes `content` atomically (temp sibling + rename), matching the
/// teacher's write-then-rename discipline. Rejects disallowed extensions and
/// protected paths unless `require_confirmation` is explicitly `false`.
pub async fn write_file(
    project_root: &Path,
    requested: &str,
    content: &str,
    create_dirs: bool,
    require_confirmation: bool,
) -> Result<serde_json::Value> {
    let path = validate_path(project_root, requested)?;

    let protected = is_protected(requested);
    if protected && require_confirmation {
        return Err(Error::PathNotAllowed(format!("'{requested}' is protected; pass require_confirmation=false to write it")));
    }
    if !protected && !extension_allowed(&path) {
        return Err(Error::PathNotAllowed(format!("extension not permitted for '{requested}'")));
    }

    if let Some(parent) = path.parent() {
        if create_dirs {
            fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
    }

    let tmp_name = format!(".{}.{}.tmp", path.file_name().unwrap_or_default().to_string_lossy(), uuid::Uuid::new_v4().as_simple());
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp_path).await.map_err(Error::Io)?;
    file.write_all(content.as_bytes()).await.map_err(Error::Io)?;
    file.flush().await.map_err(Error::Io)?;
    file.sync_data().await.map_err(Error::Io)?;

    fs::rename(&tmp_path, &path).await.map_err(|e| {
        let tmp = tmp_path.clone();
        tokio::spawn(async move { let _ = fs::remove_file(&tmp).await; });
        Error::Io(e)
    })?;

    Ok(serde_json::json!({ "path": requested, "bytes_written": content.len(), "success": true }))
}

pub async fn list_directory(project_root: &Path, requested: &str, recursive: bool) -> Result<serde_json::Value> {
    let path = validate_path(project_root, requested)?;
    let mut entries = Vec::new();
    collect_dir_entries(&path, &path, recursive, &mut entries).await?;
    entries.sort_by(|a: &DirEntry, b: &DirEntry| a.name.cmp(&b.name));
    Ok(serde_json::json!({ "path": requested, "entries": entries, "count": entries.len() }))
}

fn collect_dir_entries<'a>(
    root: &'a Path,
    dir: &'a Path,
    recursive: bool,
    out: &'a mut Vec<DirEntry>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut read_dir = fs::read_dir(dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(dir.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

        while let Some(entry) = read_dir.next_entry().await.map_err(Error::Io)? {
            let metadata = entry.metadata().await.map_err(Error::Io)?;
            let modified = metadata.modified().ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339()).unwrap_or_default();
            let name = entry.path().strip_prefix(root).unwrap_or(&entry.path()).display().to_string();
            let is_dir = metadata.is_dir();
            out.push(DirEntry { name, size: metadata.len(), modified, is_dir });

            if recursive && is_dir {
                collect_dir_entries(root, &entry.path(), recursive, out).await?;
            }
        }
        Ok(())
    })
}

/// Greps for `pattern` under `path` (default project root), restricted to
/// files matching `file_pattern` (a simple glob suffix, default `*.py`).
pub async fn search_code(project_root: &Path, pattern: &str, path: Option<&str>, file_pattern: &str, max_results: usize) -> Result<serde_json::Value> {
    if pattern.is_empty() {
        return Err(Error::InvalidPattern("pattern must not be empty".into()));
    }
    let regex = regex::Regex::new(pattern).map_err(|e| Error::InvalidPattern(e.to_string()))?;
    let search_root = match path {
        Some(p) => validate_path(project_root, p)?,
        None => project_root.canonicalize().map_err(Error::Io)?,
    };

    let suffix = file_pattern.trim_start_matches('*');
    let mut matches = Vec::new();
    walk_and_grep(&search_root, suffix, &regex, max_results, &mut matches).await?;

    Ok(serde_json::json!({ "pattern": pattern, "matches": matches, "count": matches.len() }))
}

#[derive(Debug, Clone, Serialize)]
struct CodeMatch {
    file: String,
    line: usize,
    text: String,
}

fn walk_and_grep<'a>(
    dir: &'a Path,
    suffix: &'a str,
    regex: &'a regex::Regex,
    max_results: usize,
    out: &'a mut Vec<CodeMatch>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        if out.len() >= max_results {
            return Ok(());
        }
        let mut read_dir = match fs::read_dir(dir).await {
            Ok(r) => r,
            Err(_) => return Ok(()),
        };
        while let Some(entry) = read_dir.next_entry().await.map_err(Error::Io)? {
            if out.len() >= max_results {
                break;
            }
            let entry_path = entry.path();
            let file_name = entry.file_name();
            if file_name == ".git" || file_name == "target" || file_name == "node_modules" {
                continue;
            }
            let metadata = entry.metadata().await.map_err(Error::Io)?;
            if metadata.is_dir() {
                walk_and_grep(&entry_path, suffix, regex, max_results, out).await?;
                continue;
            }
            if !suffix.is_empty() && !entry_path.to_string_lossy().ends_with(suffix) {
                continue;
            }
            let Ok(content) = fs::read_to_string(&entry_path).await else { continue };
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    out.push(CodeMatch { file: entry_path.display().to_string(), line: idx + 1, text: line.to_string() });
                    if out.len() >= max_results {
                        break;
                    }
                }
            }
        }
        Ok(())
    })
}

async fn run_git(project_root: &Path, args: &[&str]) -> Result<String> {
    let output = tokio::time::timeout(GIT_TIMEOUT, Command::new("git").args(args).current_dir(project_root).output())
        .await
        .map_err(|_| Error::Timeout(format!("git {} timed out", args.join(" "))))?
        .map_err(Error::Io)?;

    if !output.status.success() {
        return Err(Error::Io(std::io::Error::other(String::from_utf8_lossy(&output.stderr).to_string())));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub async fn git_status(project_root: &Path) -> Result<serde_json::Value> {
    let stdout = run_git(project_root, &["status", "--porcelain"]).await?;
    let entries: Vec<&str> = stdout.lines().collect();
    Ok(serde_json::json!({ "clean": entries.is_empty(), "entries": entries }))
}

pub async fn git_commit(project_root: &Path, message: &str, files: Option<&[String]>) -> Result<serde_json::Value> {
    match files {
        Some(paths) if !paths.is_empty() => {
            let mut args = vec!["add"];
            args.extend(paths.iter().map(String::as_str));
            run_git(project_root, &args).await?;
        }
        _ => {
            run_git(project_root, &["add", "-A"]).await?;
        }
    }
    let stdout = run_git(project_root, &["commit", "-m", message]).await?;
    Ok(serde_json::json!({ "success": true, "message": message, "output": stdout.trim() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn validate_path_rejects_parent_traversal() {
        let ws = TempDir::new().unwrap();
        let result = validate_path(ws.path(), "../etc/passwd");
        assert!(matches!(result, Err(Error::PathNotAllowed(_))));
    }

    #[test]
    fn validate_path_rejects_absolute_path() {
        let ws = TempDir::new().unwrap();
        let abs = if cfg!(windows) { "C:\\Windows" } else { "/etc/passwd" };
        assert!(matches!(validate_path(ws.path(), abs), Err(Error::PathNotAllowed(_))));
    }

    #[tokio::test]
    async fn write_then_read_roundtrips() {
        let ws = TempDir::new().unwrap();
        write_file(ws.path(), "notes.md", "hello", true, true).await.unwrap();
        let result = read_file(ws.path(), "notes.md").await.unwrap();
        assert_eq!(result["content"].as_str().unwrap(), "hello");
    }

    #[tokio::test]
    async fn write_rejects_disallowed_extension() {
        let ws = TempDir::new().unwrap();
        let err = write_file(ws.path(), "binary.exe", "x", true, true).await.unwrap_err();
        assert!(matches!(err, Error::PathNotAllowed(_)));
    }

    #[tokio::test]
    async fn write_rejects_protected_path_without_explicit_flag() {
        let ws = TempDir::new().unwrap();
        let err = write_file(ws.path(), ".env", "SECRET=1", true, true).await.unwrap_err();
        assert!(matches!(err, Error::PathNotAllowed(_)));
    }

    #[tokio::test]
    async fn write_allows_protected_path_with_explicit_confirmation_false() {
        let ws = TempDir::new().unwrap();
        let result = write_file(ws.path(), ".env", "SECRET=1", true, false).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn list_directory_returns_entries() {
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join("a.rs"), "").unwrap();
        std::fs::create_dir(ws.path().join("sub")).unwrap();
        let result = list_directory(ws.path(), ".", false).await.unwrap();
        assert_eq!(result["count"].as_u64().unwrap(), 2);
    }

    #[tokio::test]
    async fn search_code_finds_pattern_in_matching_files() {
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join("main.py"), "def foo():\n    return 1\n").unwrap();
        std::fs::write(ws.path().join("other.txt"), "def foo(): return 1\n").unwrap();
        let result = search_code(ws.path(), "def foo", None, "*.py", 10).await.unwrap();
        assert_eq!(result["count"].as_u64().unwrap(), 1);
    }
}
