use std::path::Path;

use crate::clock::Clock;
use crate::task_types::{LintResult, Task, TaskPriority, TaskStatus};

pub(crate) const LINTER_TASK_ID_PREFIX: &str = "linter_fix_";
pub(crate) const LINTER_TASK_TITLE: &str = "Fix Linter Errors - IMMEDIATE";
pub(crate) const LINTER_TASK_MODE: &str = "development";
pub(crate) const DEFAULT_REPORT_FILE: &str = "development/linter-errors.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct LintTotals {
    pub(crate) errors: usize,
    pub(crate) warnings: usize,
}

pub(crate) fn lint_totals(lint_results: &[LintResult]) -> LintTotals {
    lint_results
        .iter()
        .fold(LintTotals::default(), |totals, result| LintTotals {
            errors: totals.errors + result.error_count,
            warnings: totals.warnings + result.warning_count,
        })
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn project_relative(path: &str, project_root: &Path) -> String {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        if let Ok(relative) = candidate.strip_prefix(project_root) {
            return relative.to_string_lossy().into_owned();
        }
    }
    path.to_string()
}

fn success_criteria(report_file: &str) -> Vec<String> {
    vec![
        "All linter errors in the edited files are resolved".to_string(),
        format!("{} reports no remaining issues", report_file),
        "The linter passes on the edited files without errors or warnings".to_string(),
    ]
}

/// Builds the remediation task for a batch of lint findings.
///
/// Pure apart from the injected clock: `id` and `created_at` derive from the
/// same instant.
pub(crate) fn synthesize_task(
    lint_results: &[LintResult],
    project_root: &Path,
    file_paths: &[String],
    report_file: &str,
    clock: &dyn Clock,
) -> Task {
    let totals = lint_totals(lint_results);
    let file_names: Vec<String> = file_paths.iter().map(|path| base_name(path)).collect();
    let description = format!(
        "Linter found {} errors and {} warnings in recently edited files: {}. \
Review {} and fix every reported issue before continuing with other work.",
        totals.errors,
        totals.warnings,
        file_names.join(", "),
        report_file
    );

    let mut important_files: Vec<String> = Vec::with_capacity(file_paths.len() + 1);
    let candidates = std::iter::once(report_file.to_string()).chain(
        file_paths
            .iter()
            .map(|path| project_relative(path, project_root)),
    );
    for candidate in candidates {
        if !important_files.contains(&candidate) {
            important_files.push(candidate);
        }
    }

    Task {
        id: format!("{}{}", LINTER_TASK_ID_PREFIX, clock.epoch_millis()),
        title: LINTER_TASK_TITLE.to_string(),
        description,
        mode: Some(LINTER_TASK_MODE.to_string()),
        priority: Some(TaskPriority::High),
        status: Some(TaskStatus::Pending),
        important_files,
        success_criteria: success_criteria(report_file),
        created_at: Some(clock.iso_timestamp()),
        is_linter_task: Some(true),
    }
}
