use std::process::ExitCode;

mod app;
mod cli;
mod clock;
mod config;
mod hook_input;
mod linters;
mod logger;
mod placement;
mod project;
mod synthesize;
mod task_types;
mod todo_state;
mod writer;


fn main() -> ExitCode {
    app::main()
}
