//! Progress reporting for long-running solves.

/// Receives human-readable progress lines from a solve.
pub trait ProgressSink {
    fn print(&mut self, line: &str);
}

/// Forwards progress lines to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn print(&mut self, line: &str) {
        log::info!("{line}");
    }
}

/// Collects lines in memory.
impl ProgressSink for Vec<String> {
    fn print(&mut self, line: &str) {
        self.push(line.to_string());
    }
}
