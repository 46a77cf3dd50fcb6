use std::path::Path;

use crate::clock::Clock;
use crate::logger::Logger;
use crate::synthesize::synthesize_task;
use crate::task_types::{LintResult, TaskQueueDocument};
use crate::todo_state::{read_todo_state, TodoStateAnalysis};
use crate::writer::{write_document, DocumentStore};

/// Everything a placement needs besides the lint findings themselves.
pub(crate) struct PlacementContext<'a> {
    pub(crate) todo_file: &'a str,
    pub(crate) report_file: &'a str,
    pub(crate) clock: &'a dyn Clock,
    pub(crate) store: &'a dyn DocumentStore,
    pub(crate) logger: &'a Logger,
}

/// Insert right after the task in progress; with no current task the fix
/// goes first.
pub(crate) fn resolve_insertion_index(analysis: &TodoStateAnalysis) -> usize {
    let index = match analysis.current_task_index {
        Some(current) => current + 1,
        None => 0,
    };
    index.min(analysis.total_tasks)
}

/// Returns `id`, or `id_<n>` for the first `n` not already used in `document`.
pub(crate) fn unique_task_id(document: &TaskQueueDocument, id: &str) -> String {
    if !document.contains_task_id(id) {
        return id.to_string();
    }
    let mut suffix = 1usize;
    loop {
        let candidate = format!("{}_{}", id, suffix);
        if !document.contains_task_id(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Reads the task queue, synthesizes a fix task for `lint_results` and writes
/// it back next to the current task. Never fails loudly: `false` covers a
/// missing queue as well as a failed write.
pub(crate) fn place_task(
    lint_results: &[LintResult],
    project_root: &Path,
    file_paths: &[String],
    ctx: &PlacementContext<'_>,
) -> bool {
    let Some(analysis) = read_todo_state(project_root, ctx.todo_file, ctx.logger) else {
        ctx.logger.log_event("placement skipped reason=todo_unavailable");
        return false;
    };

    let index = resolve_insertion_index(&analysis);
    let mut task = synthesize_task(
        lint_results,
        project_root,
        file_paths,
        ctx.report_file,
        ctx.clock,
    );
    let unique_id = unique_task_id(&analysis.document, &task.id);
    if unique_id != task.id {
        ctx.logger.log_event(&format!(
            "placement id collision id={} renamed={}",
            task.id, unique_id
        ));
        task.id = unique_id;
    }

    ctx.logger.log_event(&format!(
        "placement resolved task={} index={} total={}",
        task.id, index, analysis.total_tasks
    ));
    write_document(
        &analysis.document,
        task,
        index,
        &analysis.document_path,
        ctx.clock,
        ctx.store,
        ctx.logger,
    )
}
