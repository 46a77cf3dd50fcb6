use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "lint-task-hook",
    about = "Post-edit hook that lints edited files and queues a fix task for any violations.",
    long_about = "Reads a tool-use payload from stdin, runs ruff or ESLint on the edited files, and when violations are found inserts a high-priority fix task into the project's TODO.json right after the task in progress.\n\nExits 2 when violations were found so the agent sees the summary on stderr; every other outcome exits 0."
)]
pub(crate) struct Cli {
    /// Load configuration from PATH instead of <project>/.claude/lint-task-hook.yml.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Load configuration from PATH instead of <project>/.claude/lint-task-hook.yml."
    )]
    pub(crate) config: Option<PathBuf>,

    /// Treat PATH as the project root instead of the payload's cwd.
    #[arg(
        long = "project-root",
        value_name = "PATH",
        help = "Treat PATH as the project root instead of the payload's cwd."
    )]
    pub(crate) project_root: Option<PathBuf>,
}
