//! Project context gathering
//!
//! Collects the text of project files under a path so it can be sent along
//! with a question.

use crate::utils::error::Failure;
use crate::utils::error_handler::ErrorHandler;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File patterns scanned by default
pub const DEFAULT_PATTERNS: [&str; 7] = ["*.py", "*.js", "*.html", "*.css", "*.json", "*.md", "*.txt"];

/// Limits applied while scanning
#[derive(Debug, Clone)]
pub struct ContextLimits {
    pub patterns: Vec<String>,
    /// Files taken per pattern
    pub max_files: usize,
    /// Files of this size or larger are skipped
    pub max_file_bytes: u64,
    /// Characters kept per file when scanning a directory
    pub max_chars_per_file: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            max_files: 10,
            max_file_bytes: 50_000,
            max_chars_per_file: 2_000,
        }
    }
}

/// Gathered context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectContext {
    pub text: String,
    pub file_count: usize,
}

impl ProjectContext {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Gather file contents under `target`
///
/// A file target is included whole; a directory is scanned recursively with
/// the configured patterns. Read failures go through `errors` and appear as
/// a single line in the output.
pub fn gather_context(target: &Path, limits: &ContextLimits, errors: &ErrorHandler) -> ProjectContext {
    let mut sections = Vec::new();
    let mut file_count = 0;

    if target.is_file() {
        match read_section(target, limits.max_file_bytes, None) {
            Ok(Some(section)) => {
                sections.push(section);
                file_count += 1;
            }
            Ok(None) => {}
            Err(failure) => {
                let message = errors.handle(failure, json!({"function": "gather_context", "path": target}));
                sections.push(format!("Error reading file {}: {}", target.display(), message));
            }
        }
    } else if target.is_dir() {
        for pattern in &limits.patterns {
            for path in find_files(target, pattern, limits.max_files, errors) {
                match read_section(&path, limits.max_file_bytes, Some(limits.max_chars_per_file)) {
                    Ok(Some(section)) => {
                        sections.push(section);
                        file_count += 1;
                    }
                    Ok(None) => {}
                    Err(failure) => {
                        let message = errors.handle(failure, json!({"function": "gather_context", "path": path}));
                        sections.push(format!("Error reading {}: {}", path.display(), message));
                    }
                }
            }
        }
    }

    debug!("Gathered context from {} files under {:?}", file_count, target);
    ProjectContext {
        text: sections.join("\n"),
        file_count,
    }
}

fn find_files(root: &Path, pattern: &str, max_files: usize, errors: &ErrorHandler) -> Vec<PathBuf> {
    let root = glob::Pattern::escape(&root.to_string_lossy());
    let search = format!("{}/**/{}", root.trim_end_matches('/'), pattern);

    let entries = match glob::glob(&search) {
        Ok(entries) => entries,
        Err(e) => {
            errors.handle(Failure::other(e), json!({"function": "find_files", "pattern": search}));
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                errors.handle(e.into_error(), json!({"function": "find_files"}));
                None
            }
        })
        .filter(|path| path.is_file())
        .take(max_files)
        .collect()
}

/// Render one `=== path ===` section; `None` for skipped or blank files
fn read_section(path: &Path, max_bytes: u64, max_chars: Option<usize>) -> Result<Option<String>, Failure> {
    if fs::metadata(path)?.len() >= max_bytes {
        debug!("Skipping large file {:?}", path);
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    if content.trim().is_empty() {
        return Ok(None);
    }

    let body = match max_chars {
        Some(limit) if content.chars().count() > limit => {
            let head: String = content.chars().take(limit).collect();
            format!("{}...", head)
        }
        _ => content.into_owned(),
    };

    Ok(Some(format!("=== {} ===\n{}", path.display(), body)))
}
