/// Destination for human-readable progress lines.
pub trait Console: Send + Sync {
    fn line(&self, line: &str);
}

/// Writes progress to stdout, one line per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&self, line: &str) {
        println!("{line}");
    }
}

/// Marker printed when a poll found nothing new.
pub const HEARTBEAT: &str = "...";
