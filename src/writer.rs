use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::clock::Clock;
use crate::logger::Logger;
use crate::task_types::{Task, TaskQueueDocument};
use crate::todo_state::parse_document;

const BACKUP_NAME_ATTEMPTS: usize = 100;

/// Filesystem operations the writer needs; split out so failures can be injected.
pub(crate) trait DocumentStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, String>;

    /// Writes `bytes` to a path that must not exist yet. `Ok(false)` means the
    /// path was already taken and nothing was written.
    fn create_new(&self, path: &Path, bytes: &[u8]) -> Result<bool, String>;

    /// Replaces `path` so readers observe either the old or the new bytes.
    fn replace(&self, path: &Path, bytes: &[u8]) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FsStore;

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, String> {
        fs::read(path).map_err(|err| format!("Failed to read {}: {}", path.display(), err))
    }

    fn create_new(&self, path: &Path, bytes: &[u8]) -> Result<bool, String> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => {
                return Err(format!("Failed to create {}: {}", path.display(), err));
            }
        };
        if let Err(err) = file.write_all(bytes).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(path);
            return Err(format!("Failed to write {}: {}", path.display(), err));
        }
        Ok(true)
    }

    fn replace(&self, path: &Path, bytes: &[u8]) -> Result<(), String> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(parent).map_err(|err| {
            format!(
                "Failed to create temp file in {}: {}",
                parent.display(),
                err
            )
        })?;
        if let Ok(metadata) = fs::metadata(path) {
            let _ = staged.as_file().set_permissions(metadata.permissions());
        }
        staged
            .write_all(bytes)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| format!("Failed to write {}: {}", staged.path().display(), err))?;
        staged
            .persist(path)
            .map_err(|err| format!("Failed to replace {}: {}", path.display(), err.error))?;
        Ok(())
    }
}

pub(crate) fn backup_path(document_path: &Path, epoch_millis: i64, attempt: usize) -> PathBuf {
    let mut name = document_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("TODO.json"));
    name.push(format!(".backup.{}", epoch_millis));
    if attempt > 0 {
        name.push(format!("-{}", attempt));
    }
    document_path.with_file_name(name)
}

fn write_backup(
    document_path: &Path,
    bytes: &[u8],
    clock: &dyn Clock,
    store: &dyn DocumentStore,
) -> Result<PathBuf, String> {
    let millis = clock.epoch_millis();
    for attempt in 0..BACKUP_NAME_ATTEMPTS {
        let candidate = backup_path(document_path, millis, attempt);
        if store.create_new(&candidate, bytes)? {
            return Ok(candidate);
        }
    }
    Err(format!(
        "No free backup name for {} at {}",
        document_path.display(),
        millis
    ))
}

pub(crate) fn serialize_document(document: &TaskQueueDocument) -> Result<Vec<u8>, String> {
    let mut bytes = serde_json::to_vec_pretty(document)
        .map_err(|err| format!("Failed to serialize task queue: {}", err))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_document_impl(
    document: &TaskQueueDocument,
    task: Task,
    index: usize,
    document_path: &Path,
    clock: &dyn Clock,
    store: &dyn DocumentStore,
    logger: &Logger,
) -> Result<(), String> {
    let original = store.read(document_path)?;
    let backup = write_backup(document_path, &original, clock, store)?;
    logger.log_event(&format!("todo backup path={}", backup.display()));

    let task_value = task.to_value(document.key_style())?;
    let updated = document.with_task_inserted(task_value, index);
    let bytes = serialize_document(&updated)?;
    let reparsed = parse_document(&bytes)?;
    if reparsed != updated
        || reparsed.tasks().len() != document.tasks().len() + 1
        || !reparsed.contains_task_id(&task.id)
    {
        return Err(format!(
            "Serialized task queue failed verification for task {}",
            task.id
        ));
    }

    store.replace(document_path, &bytes)?;
    Ok(())
}

/// Inserts `task` at `index` and rewrites the document at `document_path`.
/// The task's keys follow the document's existing key style.
///
/// The pre-mutation bytes are saved to a sibling backup before anything is
/// overwritten. Any failure is logged and reported as `false`; the original
/// document is only ever replaced as the final step.
pub(crate) fn write_document(
    document: &TaskQueueDocument,
    task: Task,
    index: usize,
    document_path: &Path,
    clock: &dyn Clock,
    store: &dyn DocumentStore,
    logger: &Logger,
) -> bool {
    let task_id = task.id.clone();
    match write_document_impl(document, task, index, document_path, clock, store, logger) {
        Ok(()) => {
            logger.log_event(&format!(
                "todo write ok path={} task={} index={}",
                document_path.display(),
                task_id,
                index
            ));
            true
        }
        Err(message) => {
            logger.log_event(&format!("todo write failed task={} reason={}", task_id, message));
            false
        }
    }
}

#[cfg(test)]
pub(crate) struct FailingReplaceStore;

#[cfg(test)]
impl DocumentStore for FailingReplaceStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, String> {
        FsStore.read(path)
    }

    fn create_new(&self, path: &Path, bytes: &[u8]) -> Result<bool, String> {
        FsStore.create_new(path, bytes)
    }

    fn replace(&self, path: &Path, _bytes: &[u8]) -> Result<(), String> {
        Err(format!("Failed to replace {}: permission denied", path.display()))
    }
}
