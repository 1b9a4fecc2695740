//! Per-request timing metrics.

use std::time::{Duration, Instant};

use edge_core::RequestId;
use serde::Serialize;

/// How the page body was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Shell first, sections as they complete.
    Streamed,
    /// Whole document in one body (crawlers).
    Buffered,
}

/// Finished metrics for one request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_shell_us: Option<u64>,
    /// Sections in the order they were sent.
    pub sections: Vec<SectionMetrics>,
    pub dependencies: Vec<DependencyMetrics>,
    pub total_duration_us: u64,
    pub status_code: u16,
}

/// Timing for one rendered section.
#[derive(Debug, Clone, Serialize)]
pub struct SectionMetrics {
    pub name: String,
    /// Offset from request start to section send.
    pub sent_us: u64,
    pub render_us: u64,
    pub bytes: usize,
}

/// One outbound dependency call.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyMetrics {
    /// Dependency tag, e.g. `storefront`.
    pub tag: String,
    pub duration_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub success: bool,
}

impl DependencyMetrics {
    pub fn new(tag: impl Into<String>, duration: Duration, status_code: Option<u16>) -> Self {
        let success = matches!(status_code, Some(code) if (200..300).contains(&code));
        Self {
            tag: tag.into(),
            duration_us: duration.as_micros() as u64,
            status_code,
            success,
        }
    }
}

/// Collects metrics while a request is handled.
#[derive(Debug)]
pub struct MetricsCollector {
    request_id: RequestId,
    route: Option<String>,
    render_mode: Option<RenderMode>,
    start: Instant,
    shell_sent: Option<Instant>,
    open_section: Option<(String, Instant)>,
    sections: Vec<SectionMetrics>,
    dependencies: Vec<DependencyMetrics>,
}

impl MetricsCollector {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            render_mode: None,
            start: Instant::now(),
            shell_sent: None,
            open_section: None,
            sections: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = Some(mode);
    }

    pub fn record_shell_sent(&mut self) {
        self.shell_sent.get_or_insert_with(Instant::now);
    }

    /// Mark the start of a section render.
    pub fn section_started(&mut self, name: &str) {
        self.open_section = Some((name.to_string(), Instant::now()));
    }

    /// Mark a section as written to the client.
    ///
    /// A section that was never started counts as rendered instantly.
    pub fn section_sent(&mut self, name: &str, bytes: usize) {
        let now = Instant::now();
        let started = match self.open_section.take() {
            Some((open, started)) if open == name => started,
            other => {
                self.open_section = other;
                now
            }
        };

        self.sections.push(SectionMetrics {
            name: name.to_string(),
            sent_us: micros(now.duration_since(self.start)),
            render_us: micros(now.duration_since(started)),
            bytes,
        });
    }

    pub fn record_dependency(&mut self, dependency: DependencyMetrics) {
        self.dependencies.push(dependency);
    }

    pub fn time_to_shell(&self) -> Option<Duration> {
        self.shell_sent.map(|t| t.duration_since(self.start))
    }

    pub fn finalize(self, status_code: u16) -> RequestMetrics {
        RequestMetrics {
            request_id: self.request_id.to_string(),
            route: self.route,
            render_mode: self.render_mode,
            time_to_shell_us: self
                .shell_sent
                .map(|t| micros(t.duration_since(self.start))),
            sections: self.sections,
            dependencies: self.dependencies,
            total_duration_us: micros(self.start.elapsed()),
            status_code,
        }
    }
}

impl RequestMetrics {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// One-line summary for human log output.
    pub fn to_summary(&self) -> String {
        let mut summary = format!(
            "{} {} in {:.2}ms",
            self.status_code,
            self.route.as_deref().unwrap_or("-"),
            self.total_duration_us as f64 / 1000.0
        );
        if let Some(shell) = self.time_to_shell_us {
            summary.push_str(&format!(", shell {:.2}ms", shell as f64 / 1000.0));
        }
        for section in &self.sections {
            summary.push_str(&format!(", {} {}B", section.name, section.bytes));
        }
        let failed = self.dependencies.iter().filter(|d| !d.success).count();
        if failed > 0 {
            summary.push_str(&format!(", {} failed dependencies", failed));
        }
        summary
    }
}

fn micros(duration: Duration) -> u64 {
    duration.as_micros() as u64
}
