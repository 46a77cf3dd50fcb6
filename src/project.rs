use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Language {
    Python,
    JavaScript,
}

impl Language {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
        }
    }

    fn project_markers(self) -> &'static [&'static str] {
        match self {
            Self::Python => &[
                "pyproject.toml",
                "ruff.toml",
                ".ruff.toml",
                "setup.py",
                "setup.cfg",
            ],
            Self::JavaScript => &["package.json"],
        }
    }

    fn has_marker(self, dir: &Path) -> bool {
        if self
            .project_markers()
            .iter()
            .any(|marker| dir.join(marker).is_file())
        {
            return true;
        }
        if self != Self::JavaScript {
            return false;
        }
        // eslint.config.{js,mjs,cjs,ts} and the legacy .eslintrc{,.json,.js,...}
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };
        entries.filter_map(Result::ok).any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("eslint.config.") || name.starts_with(".eslintrc")
        })
    }
}

pub(crate) fn detect_language(path: &Path) -> Option<Language> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "py" | "pyi" => Some(Language::Python),
        "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts" => Some(Language::JavaScript),
        _ => None,
    }
}

/// Resolves an edited path against `cwd` and confines it to `project_root`.
///
/// Returns the canonical file path, or a reason to skip it.
pub(crate) fn resolve_edited_file(
    project_root: &Path,
    cwd: &Path,
    raw: &str,
) -> Result<PathBuf, String> {
    let candidate = Path::new(raw);
    let candidate = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        cwd.join(candidate)
    };
    let canonical = fs::canonicalize(&candidate)
        .map_err(|err| format!("cannot resolve {}: {}", candidate.display(), err))?;
    if !canonical.is_file() {
        return Err(format!("not a regular file: {}", canonical.display()));
    }
    let root = fs::canonicalize(project_root).map_err(|err| {
        format!(
            "cannot resolve project root {}: {}",
            project_root.display(),
            err
        )
    })?;
    if !canonical.starts_with(&root) {
        return Err(format!(
            "outside project root {}: {}",
            root.display(),
            canonical.display()
        ));
    }
    Ok(canonical)
}

/// Nearest directory from the file up to `project_root` that carries a
/// project marker for `language`; the linter runs from there so it picks up
/// the right configuration.
pub(crate) fn linter_working_dir(file: &Path, project_root: &Path, language: Language) -> PathBuf {
    let root = fs::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
    let mut current = file.parent();
    while let Some(dir) = current {
        if !dir.starts_with(&root) {
            break;
        }
        if language.has_marker(dir) {
            return dir.to_path_buf();
        }
        if dir == root {
            break;
        }
        current = dir.parent();
    }
    root
}

/// `path` relative to `project_root` when it lives inside it.
pub(crate) fn display_path(path: &Path, project_root: &Path) -> String {
    let root = fs::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
    path.strip_prefix(&root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
