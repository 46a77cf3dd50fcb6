use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub(crate) enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Unknown(String),
}

impl TaskStatus {
    pub(crate) fn parse(token: &str) -> Self {
        match token.trim() {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Unknown(value) => value,
        }
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub(crate) enum TaskPriority {
    High,
    Medium,
    Low,
    Unknown(String),
}

impl TaskPriority {
    pub(crate) fn parse(token: &str) -> Self {
        match token.trim() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown(value) => value,
        }
    }
}

impl From<TaskPriority> for String {
    fn from(value: TaskPriority) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// snake_case key and its camelCase counterpart, for every key that differs.
const CAMEL_CASE_KEYS: [(&str, &str); 7] = [
    ("project", "projectName"),
    ("current_task_index", "currentTaskIndex"),
    ("last_hook_activation", "lastActivationTimestamp"),
    ("important_files", "importantFiles"),
    ("success_criteria", "successCriteria"),
    ("created_at", "createdAt"),
    ("is_linter_task", "isSyntheticLintTask"),
];

/// Naming convention of an existing document; new tasks are written in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeyStyle {
    SnakeCase,
    CamelCase,
}

impl KeyStyle {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::SnakeCase => "snake_case",
            Self::CamelCase => "camelCase",
        }
    }

    /// Maps a snake_case key to this style.
    pub(crate) fn key<'a>(self, snake: &'a str) -> &'a str {
        match self {
            Self::SnakeCase => snake,
            Self::CamelCase => CAMEL_CASE_KEYS
                .iter()
                .find(|(snake_key, _)| *snake_key == snake)
                .map(|(_, camel_key)| *camel_key)
                .unwrap_or(snake),
        }
    }

    fn is_camel_case_key(key: &str) -> bool {
        CAMEL_CASE_KEYS.iter().any(|(_, camel_key)| *camel_key == key)
    }
}

/// A task synthesized by this crate, serialized with snake_case keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Task {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<TaskStatus>,
    pub(crate) important_files: Vec<String>,
    pub(crate) success_criteria: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_linter_task: Option<bool>,
}

impl Task {
    /// The task as a JSON object whose keys follow `style`.
    pub(crate) fn to_value(&self, style: KeyStyle) -> Result<Value, String> {
        let value = serde_json::to_value(self)
            .map_err(|err| format!("Failed to serialize task {}: {}", self.id, err))?;
        let Value::Object(fields) = value else {
            return Err(format!("Task {} did not serialize to an object", self.id));
        };
        let renamed: Map<String, Value> = fields
            .into_iter()
            .map(|(key, value)| (style.key(&key).to_string(), value))
            .collect();
        Ok(Value::Object(renamed))
    }
}

/// Read-only view of a task already in the queue. Fields with an unexpected
/// JSON type read as absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TaskEntry {
    pub(crate) id: Option<String>,
    pub(crate) status: Option<TaskStatus>,
    pub(crate) priority: Option<TaskPriority>,
}

impl TaskEntry {
    pub(crate) fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str);
        Self {
            id: text("id").map(str::to_string),
            status: text("status").map(TaskStatus::parse),
            priority: text("priority").map(TaskPriority::parse),
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.status == Some(TaskStatus::Pending)
    }

    pub(crate) fn is_high_priority(&self) -> bool {
        self.priority == Some(TaskPriority::High)
    }
}

/// The persisted task queue (`TODO.json`), held as the JSON object read from
/// disk so a rewrite only ever touches the `tasks` array.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct TaskQueueDocument {
    root: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for TaskQueueDocument {
    type Error = String;

    fn try_from(root: Map<String, Value>) -> Result<Self, Self::Error> {
        match root.get("tasks") {
            None | Some(Value::Null) | Some(Value::Array(_)) => Ok(Self { root }),
            Some(other) => Err(format!("tasks must be an array, found {}", json_type(other))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TaskQueueDocument {
    pub(crate) fn tasks(&self) -> &[Value] {
        self.root
            .get("tasks")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks().iter().map(TaskEntry::from_value).collect()
    }

    pub(crate) fn key_style(&self) -> KeyStyle {
        let task_keys = self
            .tasks()
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|task| task.keys());
        if self
            .root
            .keys()
            .chain(task_keys)
            .any(|key| KeyStyle::is_camel_case_key(key))
        {
            KeyStyle::CamelCase
        } else {
            KeyStyle::SnakeCase
        }
    }

    /// The current task index, when it names an existing task.
    pub(crate) fn current_index(&self) -> Option<usize> {
        let raw = self
            .root
            .get("current_task_index")
            .or_else(|| self.root.get("currentTaskIndex"))?;
        let index = usize::try_from(raw.as_u64()?).ok()?;
        (index < self.tasks().len()).then_some(index)
    }

    pub(crate) fn contains_task_id(&self, id: &str) -> bool {
        self.tasks()
            .iter()
            .any(|task| task.get("id").and_then(Value::as_str) == Some(id))
    }

    /// A copy with `task` spliced into `tasks` at `index` (clamped). Nothing
    /// else in the document changes.
    pub(crate) fn with_task_inserted(&self, task: Value, index: usize) -> Self {
        let mut next = self.clone();
        match next.root.get_mut("tasks") {
            Some(Value::Array(tasks)) => {
                let index = index.min(tasks.len());
                tasks.insert(index, task);
            }
            Some(slot) => *slot = Value::Array(vec![task]),
            None => {
                next.root.insert("tasks".to_string(), Value::Array(vec![task]));
            }
        }
        next
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Violation {
    pub(crate) line: u64,
    pub(crate) column: u64,
    pub(crate) rule: Option<String>,
    pub(crate) message: String,
    pub(crate) severity: Severity,
}

/// Normalized linter output for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LintResult {
    pub(crate) file_path: String,
    pub(crate) error_count: usize,
    pub(crate) warning_count: usize,
    pub(crate) violations: Vec<Violation>,
}

impl LintResult {
    pub(crate) fn from_violations(file_path: String, violations: Vec<Violation>) -> Self {
        let error_count = violations
            .iter()
            .filter(|violation| violation.severity == Severity::Error)
            .count();
        let warning_count = violations.len() - error_count;
        Self {
            file_path,
            error_count,
            warning_count,
            violations,
        }
    }

    #[cfg(test)]
    pub(crate) fn counts(file_path: &str, error_count: usize, warning_count: usize) -> Self {
        Self {
            file_path: file_path.to_string(),
            error_count,
            warning_count,
            violations: Vec::new(),
        }
    }

    pub(crate) fn has_issues(&self) -> bool {
        self.error_count + self.warning_count > 0
    }
}
