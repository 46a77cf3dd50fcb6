use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::cli::Cli;
use crate::clock::SystemClock;
use crate::config::{resolve_config, Config};
use crate::hook_input::parse_hook_input;
use crate::linters::run_linter;
use crate::logger::Logger;
use crate::placement::{place_task, PlacementContext};
use crate::project::{
    detect_language, display_path, linter_working_dir, resolve_edited_file, Language,
};
use crate::synthesize::lint_totals;
use crate::task_types::LintResult;
use crate::writer::FsStore;

/// Exit code that makes the agent surface stderr to the model.
pub(crate) const VIOLATIONS_EXIT_CODE: i32 = 2;
const MAX_REPORTED_VIOLATIONS: usize = 20;

#[derive(Debug)]
pub(crate) struct Quit {
    pub(crate) code: i32,
    #[allow(dead_code)]
    pub(crate) reason: String,
}

impl Quit {
    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code as u8)
    }
}

#[derive(Debug)]
pub(crate) enum HookOutcome {
    Skipped(String),
    Clean {
        #[allow(dead_code)]
        files: Vec<String>,
    },
    Violations {
        results: Vec<LintResult>,
        todo_file: String,
        task_placed: bool,
    },
}

fn linter_command(config: &Config, language: Language) -> &str {
    match language {
        Language::Python => &config.linters.python,
        Language::JavaScript => &config.linters.javascript,
    }
}

fn load_config_or_default(cli: &Cli, project_root: &Path) -> Config {
    match resolve_config(cli.config.as_deref(), project_root) {
        Ok(loaded) => {
            for key in &loaded.warnings {
                eprintln!("Warning: unknown config key: {}", key);
            }
            loaded.config
        }
        Err(message) => {
            eprintln!("Warning: {}; using default configuration.", message);
            Config::default()
        }
    }
}

/// Runs one hook invocation against the raw stdin payload.
pub(crate) fn run_hook(cli: &Cli, raw_input: &str) -> HookOutcome {
    // Bad input never blocks the agent, and without a cwd there is no log to write to.
    let input = match parse_hook_input(raw_input) {
        Ok(Some(input)) => input,
        Ok(None) => return HookOutcome::Skipped("empty input".to_string()),
        Err(message) => return HookOutcome::Skipped(message),
    };

    let project_root = cli
        .project_root
        .clone()
        .or_else(|| input.cwd.as_ref().map(PathBuf::from))
        .or_else(|| env::current_dir().ok());
    let Some(project_root) = project_root else {
        return HookOutcome::Skipped("no project root".to_string());
    };
    let cwd = input
        .cwd
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| project_root.clone());

    let config = load_config_or_default(cli, &project_root);
    let logger = Logger::new(
        config
            .log_file
            .as_ref()
            .map(|log_file| project_root.join(log_file)),
    );
    logger.start_invocation(&format!(
        "tool={} session={} project_root={}",
        input.tool_name(),
        input.session_id.as_deref().unwrap_or("unknown"),
        project_root.display()
    ));

    let skip = |reason: String| {
        logger.log_event(&format!("skip reason={}", reason));
        HookOutcome::Skipped(reason)
    };

    if !config.tool_enabled(input.tool_name()) {
        return skip(format!("tool not enabled: {}", input.tool_name()));
    }
    if input.tool_failed() {
        return skip("tool reported failure".to_string());
    }
    let edited = input.edited_files();
    if edited.is_empty() {
        return skip("no file path in tool input".to_string());
    }

    let mut results: Vec<LintResult> = Vec::new();
    let mut linted_files: Vec<String> = Vec::new();
    for raw_path in &edited {
        let file = match resolve_edited_file(&project_root, &cwd, raw_path) {
            Ok(file) => file,
            Err(message) => {
                logger.log_event(&format!("file skipped reason={}", message));
                continue;
            }
        };
        let Some(language) = detect_language(&file) else {
            logger.log_event(&format!(
                "file skipped reason=unsupported_type path={}",
                file.display()
            ));
            continue;
        };
        let shown = display_path(&file, &project_root);
        let working_dir = linter_working_dir(&file, &project_root, language);
        match run_linter(
            language,
            linter_command(&config, language),
            &file,
            &shown,
            &working_dir,
            &logger,
        ) {
            Ok(result) => {
                linted_files.push(shown);
                results.push(result);
            }
            Err(message) => {
                logger.log_event(&format!("lint failed file={} reason={}", shown, message));
            }
        }
    }

    if linted_files.is_empty() {
        return skip("no lintable files".to_string());
    }
    let with_issues: Vec<LintResult> = results
        .into_iter()
        .filter(LintResult::has_issues)
        .collect();
    if with_issues.is_empty() {
        logger.log_event(&format!("lint clean files={}", linted_files.join(",")));
        return HookOutcome::Clean {
            files: linted_files,
        };
    }

    let clock = SystemClock;
    let ctx = PlacementContext {
        todo_file: &config.todo_file,
        report_file: &config.report_file,
        clock: &clock,
        store: &FsStore,
        logger: &logger,
    };
    let task_placed = place_task(&with_issues, &project_root, &linted_files, &ctx);
    HookOutcome::Violations {
        results: with_issues,
        todo_file: config.todo_file.clone(),
        task_placed,
    }
}

pub(crate) fn render_violation_summary(
    results: &[LintResult],
    todo_file: &str,
    task_placed: bool,
) -> String {
    let totals = lint_totals(results);
    let mut out = format!(
        "Linter found {} errors and {} warnings in {} file(s):\n",
        totals.errors,
        totals.warnings,
        results.len()
    );
    let violations = results.iter().flat_map(|result| {
        result
            .violations
            .iter()
            .map(move |violation| (result.file_path.as_str(), violation))
    });
    let total_violations: usize = results.iter().map(|result| result.violations.len()).sum();
    for (file, violation) in violations.take(MAX_REPORTED_VIOLATIONS) {
        let rule = violation
            .rule
            .as_deref()
            .map(|rule| format!(" [{}]", rule))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {}:{}:{}{} {} ({})\n",
            file,
            violation.line,
            violation.column,
            rule,
            violation.message,
            violation.severity.as_str()
        ));
    }
    if total_violations > MAX_REPORTED_VIOLATIONS {
        out.push_str(&format!(
            "  ... and {} more\n",
            total_violations - MAX_REPORTED_VIOLATIONS
        ));
    }
    if task_placed {
        out.push_str(&format!(
            "A high-priority fix task was added to {} right after the current task.",
            todo_file
        ));
    } else {
        out.push_str(&format!(
            "No fix task could be added to {}; fix these issues before continuing.",
            todo_file
        ));
    }
    out
}

pub(crate) fn run_with_input(cli: &Cli, raw_input: &str) -> Result<(), Quit> {
    match run_hook(cli, raw_input) {
        HookOutcome::Skipped(_) | HookOutcome::Clean { .. } => Ok(()),
        HookOutcome::Violations {
            results,
            todo_file,
            task_placed,
        } => {
            let summary = render_violation_summary(&results, &todo_file, task_placed);
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", summary);
            Err(Quit {
                code: VIOLATIONS_EXIT_CODE,
                reason: "lint_violations".to_string(),
            })
        }
    }
}

fn parse_cli(args: Vec<OsString>) -> Result<Cli, Quit> {
    Cli::try_parse_from(args).map_err(|err| {
        // Render clap's error ourselves so it stays capture-friendly.
        if err.use_stderr() {
            eprintln!("{err}");
        } else {
            print!("{err}");
        }
        Quit {
            code: err.exit_code(),
            reason: "cli_parse".to_string(),
        }
    })
}

pub(crate) fn run_with_args(args: Vec<OsString>, raw_input: &str) -> Result<(), Quit> {
    let cli = parse_cli(args)?;
    run_with_input(&cli, raw_input)
}

fn read_hook_input() -> String {
    let mut raw_input = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut raw_input) {
        eprintln!("Warning: failed to read hook input: {}", err);
        raw_input.clear();
    }
    raw_input
}

pub(crate) fn main() -> ExitCode {
    // Flags are parsed before stdin is touched so --help never waits on input.
    let result = parse_cli(env::args_os().collect())
        .and_then(|cli| run_with_input(&cli, &read_hook_input()));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(quit) => quit.exit_code(),
    }
}
