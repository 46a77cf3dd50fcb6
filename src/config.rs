use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

use crate::synthesize::DEFAULT_REPORT_FILE;

pub(crate) const PROJECT_CONFIG_REL: &str = ".claude/lint-task-hook.yml";
pub(crate) const DEFAULT_TODO_FILE: &str = "TODO.json";
pub(crate) const DEFAULT_LOG_FILE: &str = "post-tool-linter-hook.log";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) enabled_tools: Vec<String>,
    pub(crate) todo_file: String,
    pub(crate) report_file: String,
    pub(crate) log_file: Option<String>,
    pub(crate) linters: Linters,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_tools: vec![
                "Edit".to_string(),
                "Write".to_string(),
                "MultiEdit".to_string(),
            ],
            todo_file: DEFAULT_TODO_FILE.to_string(),
            report_file: DEFAULT_REPORT_FILE.to_string(),
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
            linters: Linters::default(),
        }
    }
}

impl Config {
    pub(crate) fn tool_enabled(&self, tool_name: &str) -> bool {
        self.enabled_tools.iter().any(|tool| tool == tool_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Linters {
    pub(crate) python: String,
    pub(crate) javascript: String,
}

impl Default for Linters {
    fn default() -> Self {
        Self {
            python: "ruff".to_string(),
            javascript: "eslint".to_string(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct LoadedConfig {
    pub(crate) config: Config,
    pub(crate) warnings: Vec<String>,
}

pub(crate) fn load_config(path: &Path) -> Result<LoadedConfig, String> {
    let content = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config {}: {}", path.display(), err))?;
    let value: Value = serde_yaml::from_str(&content)
        .map_err(|err| format!("Failed to parse config {}: {}", path.display(), err))?;
    let mapping = match value {
        // An empty file means "all defaults".
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(format!("Config {} must be a YAML mapping", path.display())),
    };

    let warnings = unknown_top_level_keys(&mapping);
    validate_fields(&mapping)?;

    let config: Config = serde_yaml::from_value(Value::Mapping(mapping))
        .map_err(|err| format!("Failed to parse config {}: {}", path.display(), err))?;

    Ok(LoadedConfig { config, warnings })
}

/// `explicit` (from `--config`) wins; otherwise the project-local file is
/// used when present. A missing project file is not an error.
pub(crate) fn resolve_config(
    explicit: Option<&Path>,
    project_root: &Path,
) -> Result<LoadedConfig, String> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let project_config = project_root.join(PROJECT_CONFIG_REL);
    if project_config.is_file() {
        return load_config(&project_config);
    }
    Ok(LoadedConfig {
        config: Config::default(),
        warnings: Vec::new(),
    })
}

fn unknown_top_level_keys(mapping: &Mapping) -> Vec<String> {
    let allowed = [
        "enabled_tools",
        "todo_file",
        "report_file",
        "log_file",
        "linters",
    ];

    mapping
        .keys()
        .filter_map(|key| key.as_str().map(|value| value.to_string()))
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect()
}

fn validate_fields(mapping: &Mapping) -> Result<(), String> {
    optional_non_empty_string(mapping, "todo_file", "todo_file")?;
    optional_non_empty_string(mapping, "report_file", "report_file")?;
    // log_file may be null to turn logging off.
    let log_file = Value::String("log_file".to_string());
    if !matches!(mapping.get(&log_file), Some(Value::Null)) {
        optional_non_empty_string(mapping, "log_file", "log_file")?;
    }

    let enabled_tools = Value::String("enabled_tools".to_string());
    if let Some(value) = mapping.get(&enabled_tools) {
        let Value::Sequence(tools) = value else {
            return Err("enabled_tools must be a list of tool names".to_string());
        };
        for tool in tools {
            match tool {
                Value::String(name) if !name.trim().is_empty() => {}
                _ => return Err("enabled_tools entries must be non-empty strings".to_string()),
            }
        }
    }

    let linters = Value::String("linters".to_string());
    match mapping.get(&linters) {
        None => {}
        Some(Value::Mapping(linters)) => {
            optional_non_empty_string(linters, "python", "linters.python")?;
            optional_non_empty_string(linters, "javascript", "linters.javascript")?;
        }
        Some(_) => return Err("linters must be a mapping".to_string()),
    }

    Ok(())
}

fn optional_non_empty_string(mapping: &Mapping, key_name: &str, label: &str) -> Result<(), String> {
    let key = Value::String(key_name.to_string());
    match mapping.get(&key) {
        None => Ok(()),
        Some(Value::Null) => Err(format!("{} must not be null", label)),
        Some(Value::String(value)) => {
            if value.trim().is_empty() {
                Err(format!("{} must not be empty", label))
            } else {
                Ok(())
            }
        }
        Some(_) => Err(format!("{} must be a string", label)),
    }
}
