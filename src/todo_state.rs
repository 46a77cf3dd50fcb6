use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::logger::Logger;
use crate::task_types::{TaskEntry, TaskQueueDocument};

/// A snapshot of the task queue taken at the start of a placement.
#[derive(Debug, Clone)]
pub(crate) struct TodoStateAnalysis {
    pub(crate) document_path: PathBuf,
    pub(crate) document: TaskQueueDocument,
    pub(crate) current_task: Option<TaskEntry>,
    pub(crate) current_task_index: Option<usize>,
    pub(crate) pending_tasks: Vec<TaskEntry>,
    pub(crate) high_priority_tasks: Vec<TaskEntry>,
    pub(crate) total_tasks: usize,
}

impl TodoStateAnalysis {
    pub(crate) fn from_document(document_path: PathBuf, document: TaskQueueDocument) -> Self {
        let entries = document.task_entries();
        let current_task_index = document.current_index();
        let current_task = current_task_index.and_then(|index| entries.get(index).cloned());
        let total_tasks = entries.len();
        let pending_tasks: Vec<TaskEntry> = entries
            .into_iter()
            .filter(TaskEntry::is_pending)
            .collect();
        let high_priority_tasks = pending_tasks
            .iter()
            .filter(|task| task.is_high_priority())
            .cloned()
            .collect();
        Self {
            document_path,
            document,
            current_task,
            current_task_index,
            pending_tasks,
            high_priority_tasks,
            total_tasks,
        }
    }
}

/// Parses a task queue. Only the top-level shape is checked; tasks are kept
/// as raw JSON.
pub(crate) fn parse_document(bytes: &[u8]) -> Result<TaskQueueDocument, String> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    let root: Map<String, Value> =
        serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            format!("invalid task queue at {}: {}", path, err.into_inner())
        })?;
    TaskQueueDocument::try_from(root).map_err(|err| format!("invalid task queue: {}", err))
}

pub(crate) fn load_document(path: &Path) -> Result<TaskQueueDocument, String> {
    let bytes =
        fs::read(path).map_err(|err| format!("Failed to read {}: {}", path.display(), err))?;
    parse_document(&bytes).map_err(|err| format!("Failed to parse {}: {}", path.display(), err))
}

/// Loads the task queue under `project_root`.
///
/// Returns `None` when the document is missing, unreadable or malformed; the
/// reason is logged and never surfaced to the caller.
pub(crate) fn read_todo_state(
    project_root: &Path,
    todo_file: &str,
    logger: &Logger,
) -> Option<TodoStateAnalysis> {
    let document_path = project_root.join(todo_file);
    if !document_path.is_file() {
        logger.log_event(&format!(
            "todo unavailable path={} reason=missing",
            document_path.display()
        ));
        return None;
    }
    match load_document(&document_path) {
        Ok(document) => {
            let analysis = TodoStateAnalysis::from_document(document_path, document);
            logger.log_event(&format!(
                "todo loaded total={} pending={} high_priority={} current={} keys={}",
                analysis.total_tasks,
                analysis.pending_tasks.len(),
                analysis.high_priority_tasks.len(),
                analysis
                    .current_task_index
                    .map(|index| index.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                analysis.document.key_style().as_str()
            ));
            Some(analysis)
        }
        Err(message) => {
            logger.log_event(&format!("todo unavailable reason={}", message));
            None
        }
    }
}
