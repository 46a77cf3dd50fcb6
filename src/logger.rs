use chrono::{SecondsFormat, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) const LOG_HEADER: &str = "POST-TOOL LINTER HOOK LOG";

#[derive(Debug)]
pub(crate) struct Logger {
    path: Option<PathBuf>,
    disabled: AtomicBool,
}

impl Logger {
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            disabled: AtomicBool::new(false),
        }
    }

    pub(crate) fn disabled() -> Self {
        Self::new(None)
    }

    /// Writes the banner that opens each hook invocation's section of the log.
    pub(crate) fn start_invocation(&self, summary: &str) {
        self.append(&format!(
            "===== {} =====\n{} {}\n",
            LOG_HEADER,
            timestamp(),
            sanitize_log_value(summary)
        ));
    }

    pub(crate) fn log_event(&self, message: &str) {
        self.append(&format!("{} {}\n", timestamp(), sanitize_log_value(message)));
    }

    fn append(&self, text: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if self.disabled.load(Ordering::Relaxed) {
            return;
        }
        let mut file = match fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(err) => {
                self.disable_with_warning(path, &err);
                return;
            }
        };
        if let Err(err) = file.write_all(text.as_bytes()) {
            self.disable_with_warning(path, &err);
        }
    }

    fn disable_with_warning(&self, path: &Path, err: &std::io::Error) {
        // Logging failures must not fail the hook; warn once and stop retrying.
        if self
            .disabled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(
                stderr,
                "Warning: hook logging disabled log_path={} io_error={}",
                path.display(),
                err
            );
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn sanitize_log_value(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_log_value_replaces_controls() {
        let value = "line\ncarriage\rtab\t";
        assert_eq!(sanitize_log_value(value), "line\\ncarriage\\rtab\\t");
    }

    #[test]
    fn invocation_header_precedes_events() {
        let temp = TempDir::new().expect("temp dir");
        let log_path = temp.path().join("hook.log");
        let logger = Logger::new(Some(log_path.clone()));

        logger.start_invocation("tool=Edit");
        logger.log_event("lint start\tfile=a.py");

        let contents = fs::read_to_string(&log_path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3, "unexpected log contents: {contents:?}");
        assert!(lines[0].contains(LOG_HEADER));
        assert!(lines[1].ends_with(" tool=Edit"));
        assert!(lines[2].ends_with(" lint start\\tfile=a.py"));
    }

    #[test]
    fn write_error_disables_logger_without_panicking() {
        let temp = TempDir::new().expect("temp dir");
        let log_path = temp.path().join("missing-dir").join("hook.log");
        let logger = Logger::new(Some(log_path.clone()));

        logger.log_event("first");
        assert!(logger.disabled.load(Ordering::Relaxed));

        fs::create_dir(temp.path().join("missing-dir")).expect("create dir");
        logger.log_event("second");
        assert!(!log_path.exists(), "logger should stay disabled after an error");
    }

    #[test]
    fn disabled_logger_is_a_no_op() {
        let logger = Logger::disabled();
        logger.start_invocation("ignored");
        logger.log_event("ignored");
        assert!(!logger.disabled.load(Ordering::Relaxed));
    }
}
