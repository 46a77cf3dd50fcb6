use serde::Deserialize;
use shell_escape::unix::escape;
use std::env;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::logger::{sanitize_log_value, Logger};
use crate::project::Language;
use crate::task_types::{LintResult, Severity, Violation};

pub(crate) fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = escape(program.into()).into_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(escape(arg.as_str().into()).as_ref());
    }
    rendered
}

pub(crate) fn command_exists(name: &str) -> bool {
    if name.contains('/') {
        return Path::new(name).is_file();
    }
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|path| {
        let full = path.join(name);
        full.is_file() || full.is_symlink()
    })
}

/// Splits a configured linter command (`"npx eslint"`) into program and
/// leading arguments.
fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn linter_args(language: Language, file: &Path) -> Vec<String> {
    let file = file.to_string_lossy().into_owned();
    match language {
        Language::Python => vec![
            "check".to_string(),
            "--output-format".to_string(),
            "json".to_string(),
            file,
        ],
        Language::JavaScript => vec!["--format".to_string(), "json".to_string(), file],
    }
}

#[derive(Debug, Deserialize)]
struct RuffLocation {
    #[serde(default)]
    row: u64,
    #[serde(default)]
    column: u64,
}

#[derive(Debug, Deserialize)]
struct RuffDiagnostic {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    location: Option<RuffLocation>,
}

/// Ruff has no severities; every diagnostic counts as an error.
pub(crate) fn parse_ruff_output(stdout: &str, file_path: &str) -> Result<LintResult, String> {
    let diagnostics: Vec<RuffDiagnostic> = serde_json::from_str(stdout.trim())
        .map_err(|err| format!("Failed to parse ruff output: {}", err))?;
    let violations = diagnostics
        .into_iter()
        .map(|diagnostic| {
            let (line, column) = diagnostic
                .location
                .map(|location| (location.row, location.column))
                .unwrap_or((0, 0));
            Violation {
                line,
                column,
                rule: diagnostic.code,
                message: diagnostic.message,
                severity: Severity::Error,
            }
        })
        .collect();
    Ok(LintResult::from_violations(file_path.to_string(), violations))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintMessage {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    severity: u8,
    #[serde(default)]
    message: String,
    #[serde(default)]
    line: u64,
    #[serde(default)]
    column: u64,
}

#[derive(Debug, Deserialize)]
struct EslintFileResult {
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

pub(crate) fn parse_eslint_output(stdout: &str, file_path: &str) -> Result<LintResult, String> {
    let results: Vec<EslintFileResult> = serde_json::from_str(stdout.trim())
        .map_err(|err| format!("Failed to parse eslint output: {}", err))?;
    let violations = results
        .into_iter()
        .flat_map(|result| result.messages)
        .filter_map(|message| {
            let severity = match message.severity {
                2 => Severity::Error,
                1 => Severity::Warning,
                _ => return None,
            };
            Some(Violation {
                line: message.line,
                column: message.column,
                rule: message.rule_id,
                message: message.message,
                severity,
            })
        })
        .collect();
    Ok(LintResult::from_violations(file_path.to_string(), violations))
}

/// Runs the configured linter for `language` on `file` from `cwd`.
///
/// A non-zero exit is normal when violations exist; only a missing program
/// or output that is not the expected JSON is an error.
pub(crate) fn run_linter(
    language: Language,
    command: &str,
    file: &Path,
    display_path: &str,
    cwd: &Path,
    logger: &Logger,
) -> Result<LintResult, String> {
    let (program, mut args) = split_command(command)
        .ok_or_else(|| format!("No linter configured for {}", language.as_str()))?;
    if !command_exists(&program) {
        return Err(format!("Linter not found: {}", program));
    }
    args.extend(linter_args(language, file));

    logger.log_event(&format!(
        "lint start language={} cwd={} command={}",
        language.as_str(),
        cwd.display(),
        sanitize_log_value(&render_command(&program, &args))
    ));
    let output = Command::new(&program)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| format!("Failed to run {}: {}", program, err))?;
    let exit_code = output.status.code().unwrap_or(1);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if stdout.trim().is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} produced no output (exit={}): {}",
            program,
            exit_code,
            sanitize_log_value(stderr.trim())
        ));
    }

    let result = match language {
        Language::Python => parse_ruff_output(&stdout, display_path),
        Language::JavaScript => parse_eslint_output(&stdout, display_path),
    }?;
    logger.log_event(&format!(
        "lint done file={} exit={} errors={} warnings={}",
        display_path, exit_code, result.error_count, result.warning_count
    ));
    Ok(result)
}
