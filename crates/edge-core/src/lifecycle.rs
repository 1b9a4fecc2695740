//! Request lifecycle: where a streamed response is, and when it got there.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Mark recorded once the document opening has been written.
pub const SHELL_SENT: &str = "shell_sent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    Start,
    ShellSent,
    /// The named section was the last one written.
    SectionSent(String),
    Completion,
}

/// Named instants relative to the start of a request.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record `name` now. A repeated mark keeps the latest instant.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    pub fn mark_section_start(&mut self, section: &str) {
        self.mark(&section_mark(section, "start"));
    }

    pub fn mark_section_sent(&mut self, section: &str) {
        self.mark(&section_mark(section, "sent"));
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn time_to_shell(&self) -> Option<Duration> {
        self.since_start(SHELL_SENT)
    }

    pub fn since_start(&self, mark: &str) -> Option<Duration> {
        self.marks.get(mark).map(|t| t.duration_since(self.start))
    }

    /// Time between a section's start and sent marks.
    pub fn section_duration(&self, section: &str) -> Option<Duration> {
        let start = self.marks.get(&section_mark(section, "start"))?;
        let sent = self.marks.get(&section_mark(section, "sent"))?;
        Some(sent.duration_since(*start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

fn section_mark(section: &str, edge: &str) -> String {
    format!("section:{}:{}", section, edge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_duration_needs_both_marks() {
        let mut timing = TimingContext::new();
        timing.mark_section_start("reviews");
        assert!(timing.section_duration("reviews").is_none());

        timing.mark_section_sent("reviews");
        assert!(timing.section_duration("reviews").is_some());
        assert!(timing.section_duration("try-on").is_none());
    }

    #[test]
    fn test_time_to_shell() {
        let mut timing = TimingContext::new();
        assert!(timing.time_to_shell().is_none());
        timing.mark(SHELL_SENT);
        assert!(timing.time_to_shell().is_some());
    }
}
