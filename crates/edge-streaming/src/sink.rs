//! Shell-first streaming sink.

use std::fmt::Display;

use edge_core::{LifecyclePhase, TimingContext, WorkloadError, SHELL_SENT};
use futures::{Sink, SinkExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Initial,
    ShellSent,
    Completed,
}

/// Wraps a byte sink and refuses sections until the shell has been sent.
///
/// Generic over any `Sink<Vec<u8>>`: Spin's outgoing body in production,
/// a plain `Vec<Vec<u8>>` for buffered bot responses and tests.
pub struct StreamingSink<S> {
    inner: S,
    state: SinkState,
    timing: TimingContext,
    sections_sent: Vec<String>,
    bytes_sent: usize,
}

impl<S, E> StreamingSink<S>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing,
            sections_sent: Vec::new(),
            bytes_sent: 0,
        }
    }

    /// Send the document opening. Must precede every section.
    pub async fn send_shell(&mut self, html: &str) -> Result<(), WorkloadError> {
        if self.state != SinkState::Initial {
            return Err(WorkloadError::StreamError(
                "shell already sent".to_string(),
            ));
        }

        self.timing.mark("shell_start");
        self.write(html).await?;
        self.timing.mark(SHELL_SENT);
        self.state = SinkState::ShellSent;
        Ok(())
    }

    /// Send a rendered section.
    pub async fn send_section(&mut self, name: &str, html: &str) -> Result<(), WorkloadError> {
        self.ensure_open()?;

        self.timing.mark_section_start(name);
        self.write(html).await?;
        self.timing.mark_section_sent(name);
        self.sections_sent.push(name.to_string());
        Ok(())
    }

    /// Send the document closing and flush. No writes are accepted afterwards.
    pub async fn finish(&mut self, closing_html: &str) -> Result<(), WorkloadError> {
        self.ensure_open()?;

        self.write(closing_html).await?;
        self.inner
            .flush()
            .await
            .map_err(|e| WorkloadError::StreamError(e.to_string()))?;
        self.timing.mark("complete");
        self.state = SinkState::Completed;
        Ok(())
    }

    pub fn sections_sent(&self) -> &[String] {
        &self.sections_sent
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn phase(&self) -> LifecyclePhase {
        match (self.state, self.sections_sent.last()) {
            (SinkState::Initial, _) => LifecyclePhase::Start,
            (SinkState::ShellSent, None) => LifecyclePhase::ShellSent,
            (SinkState::ShellSent, Some(last)) => LifecyclePhase::SectionSent(last.clone()),
            (SinkState::Completed, _) => LifecyclePhase::Completion,
        }
    }

    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn ensure_open(&self) -> Result<(), WorkloadError> {
        match self.state {
            SinkState::Initial => Err(WorkloadError::ShellNotSent),
            SinkState::Completed => Err(WorkloadError::StreamError(
                "response already completed".to_string(),
            )),
            SinkState::ShellSent => Ok(()),
        }
    }

    async fn write(&mut self, html: &str) -> Result<(), WorkloadError> {
        self.inner
            .send(html.as_bytes().to_vec())
            .await
            .map_err(|e| WorkloadError::StreamError(e.to_string()))?;
        self.bytes_sent += html.len();
        Ok(())
    }
}
