use serde::Deserialize;
use serde_json::Value;

/// The JSON payload the agent writes to the hook's stdin after a tool call.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct HookInput {
    #[serde(default)]
    pub(crate) tool_name: Option<String>,
    #[serde(default)]
    pub(crate) tool_input: Option<ToolInput>,
    #[serde(default, alias = "tool_response")]
    pub(crate) tool_output: Option<Value>,
    #[serde(default)]
    pub(crate) cwd: Option<String>,
    #[serde(default)]
    pub(crate) session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ToolInput {
    #[serde(default)]
    pub(crate) file_path: Option<String>,
    #[serde(default)]
    pub(crate) edits: Vec<EditEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EditEntry {
    #[serde(default)]
    pub(crate) file_path: Option<String>,
}

impl HookInput {
    pub(crate) fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    /// True only when the tool explicitly reported `success: false`.
    pub(crate) fn tool_failed(&self) -> bool {
        self.tool_output
            .as_ref()
            .and_then(|output| output.get("success"))
            .and_then(Value::as_bool)
            == Some(false)
    }

    /// Edited file paths as given by the tool, de-duplicated in order.
    pub(crate) fn edited_files(&self) -> Vec<String> {
        let Some(input) = &self.tool_input else {
            return Vec::new();
        };
        let mut files: Vec<String> = Vec::new();
        let candidates = input
            .file_path
            .iter()
            .chain(input.edits.iter().filter_map(|edit| edit.file_path.as_ref()));
        for path in candidates {
            let trimmed = path.trim();
            if trimmed.is_empty() || files.iter().any(|existing| existing == trimmed) {
                continue;
            }
            files.push(trimmed.to_string());
        }
        files
    }
}

/// Parses stdin. Blank input is `Ok(None)`; anything unparseable is an error
/// the caller is expected to log and ignore.
pub(crate) fn parse_hook_input(raw: &str) -> Result<Option<HookInput>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let deserializer = &mut serde_json::Deserializer::from_str(trimmed);
    serde_path_to_error::deserialize(deserializer)
        .map(Some)
        .map_err(|err| {
            let path = err.path().to_string();
            format!("invalid hook input at {}: {}", path, err.into_inner())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_none() {
        assert!(parse_hook_input("").expect("parse").is_none());
        assert!(parse_hook_input("  \n").expect("parse").is_none());
    }

    #[test]
    fn malformed_input_is_an_error() {
        let err = parse_hook_input("invalid json").expect_err("expected error");
        assert!(err.contains("invalid hook input"), "got: {err}");
        assert!(parse_hook_input(r#"{"tool_input": "oops"}"#).is_err());
    }

    #[test]
    fn minimal_object_parses_with_defaults() {
        let input = parse_hook_input("{}").expect("parse").expect("input");
        assert_eq!(input.tool_name(), "");
        assert!(!input.tool_failed());
        assert!(input.edited_files().is_empty());
    }

    #[test]
    fn tool_failure_is_read_from_output_or_response() {
        let input = parse_hook_input(
            r#"{"tool_name": "Edit", "tool_output": {"success": false, "error": "boom"}}"#,
        )
        .expect("parse")
        .expect("input");
        assert!(input.tool_failed());

        let input = parse_hook_input(r#"{"tool_name": "Edit", "tool_response": {"success": false}}"#)
            .expect("parse")
            .expect("input");
        assert!(input.tool_failed());

        let input = parse_hook_input(r#"{"tool_name": "Edit", "tool_response": "done"}"#)
            .expect("parse")
            .expect("input");
        assert!(!input.tool_failed());
    }

    #[test]
    fn edited_files_merge_top_level_and_multiedit_paths() {
        let input = parse_hook_input(
            r#"{
                "tool_name": "MultiEdit",
                "tool_input": {
                    "file_path": "src/a.py",
                    "edits": [
                        {"old_string": "x", "new_string": "y"},
                        {"file_path": "src/a.py"},
                        {"file_path": " src/b.py "}
                    ]
                },
                "session_id": "abc"
            }"#,
        )
        .expect("parse")
        .expect("input");
        assert_eq!(
            input.edited_files(),
            vec!["src/a.py".to_string(), "src/b.py".to_string()]
        );
        assert_eq!(input.session_id.as_deref(), Some("abc"));
    }
}
