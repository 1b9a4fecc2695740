//! Client for the hosted inference queue.
//!
//! Jobs are submitted with `POST {base}/{app}` and then addressed under the
//! app's first two path segments: `{base}/{owner}/{name}/requests/{id}`.

use edge_data::{DependencyTag, FetchClient, FetchError, HttpTransport, OutboundRequest};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_QUEUE_URL;
use crate::error::{TryOnError, TryOnResult};
use crate::input::{TryOnInput, TryOnOutput};
use crate::pause::Pause;

/// Handle returned when a job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub request_id: String,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Progress of a queued job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    InQueue {
        #[serde(skip_serializing_if = "Option::is_none")]
        queue_position: Option<u32>,
    },
    InProgress {
        logs: Vec<String>,
    },
    Completed {
        logs: Vec<String>,
    },
}

impl QueueStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, QueueStatus::Completed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueueStatus::InQueue { .. } => "IN_QUEUE",
            QueueStatus::InProgress { .. } => "IN_PROGRESS",
            QueueStatus::Completed { .. } => "COMPLETED",
        }
    }

    pub fn logs(&self) -> &[String] {
        match self {
            QueueStatus::InQueue { .. } => &[],
            QueueStatus::InProgress { logs } | QueueStatus::Completed { logs } => logs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    status: String,
    #[serde(default)]
    queue_position: Option<u32>,
    #[serde(default)]
    logs: Option<Vec<RawLog>>,
}

#[derive(Debug, Deserialize)]
struct RawLog {
    message: String,
}

impl TryFrom<RawStatus> for QueueStatus {
    type Error = TryOnError;

    fn try_from(raw: RawStatus) -> Result<Self, Self::Error> {
        let logs = || {
            raw.logs
                .iter()
                .flatten()
                .map(|log| log.message.clone())
                .collect()
        };
        match raw.status.as_str() {
            "IN_QUEUE" => Ok(QueueStatus::InQueue {
                queue_position: raw.queue_position,
            }),
            "IN_PROGRESS" => Ok(QueueStatus::InProgress { logs: logs() }),
            "COMPLETED" => Ok(QueueStatus::Completed { logs: logs() }),
            other => Err(TryOnError::InvalidResponse(format!(
                "unknown queue status {}",
                other
            ))),
        }
    }
}

/// Queue client authenticated with one credential.
pub struct QueueClient<'a, T> {
    fetch: &'a FetchClient<T>,
    base_url: String,
    credential: String,
}

impl<'a, T: HttpTransport> QueueClient<'a, T> {
    pub fn new(fetch: &'a FetchClient<T>, credential: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: DEFAULT_QUEUE_URL.to_string(),
            credential: credential.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Queue a job.
    pub async fn submit(&self, app: &str, input: &TryOnInput) -> TryOnResult<Submission> {
        let url = format!("{}/{}", self.base_url, app.trim_matches('/'));
        let request = self.authorize(OutboundRequest::post(url)).json(input)?;
        Ok(self.fetch.send(request, DependencyTag::Inference).await?.json()?)
    }

    /// Current status of a job.
    pub async fn status(
        &self,
        app: &str,
        request_id: &str,
        with_logs: bool,
    ) -> TryOnResult<QueueStatus> {
        let mut url = format!("{}/status", self.request_url(app, request_id));
        if with_logs {
            url.push_str("?logs=1");
        }
        let raw: RawStatus = self
            .fetch
            .send(self.authorize(OutboundRequest::get(url)), DependencyTag::Inference)
            .await?
            .json()?;
        QueueStatus::try_from(raw)
    }

    /// Output of a completed job.
    ///
    /// An error response from the queue is reported as a failed job.
    pub async fn result(&self, app: &str, request_id: &str) -> TryOnResult<TryOnOutput> {
        let request = self.authorize(OutboundRequest::get(self.request_url(app, request_id)));
        match self.fetch.send(request, DependencyTag::Inference).await {
            Ok(response) => Ok(response.json()?),
            Err(FetchError::Http { status, body, .. }) => Err(TryOnError::JobFailed(format!(
                "status {}: {}",
                status, body
            ))),
            Err(other) => Err(other.into()),
        }
    }

    /// Ask the queue to drop a job. Jobs that already finished stay finished.
    pub async fn cancel(&self, app: &str, request_id: &str) -> TryOnResult<()> {
        let url = format!("{}/cancel", self.request_url(app, request_id));
        self.fetch
            .send(self.authorize(OutboundRequest::put(url)), DependencyTag::Inference)
            .await?;
        Ok(())
    }

    /// Submit a job and poll until it completes, then fetch its output.
    ///
    /// `on_update` sees every status. There is no deadline: the loop ends on
    /// completion, on an error, or when the surrounding future is dropped.
    pub async fn subscribe<P, F>(
        &self,
        app: &str,
        input: &TryOnInput,
        pause: &P,
        mut on_update: F,
    ) -> TryOnResult<TryOnOutput>
    where
        P: Pause + ?Sized,
        F: FnMut(&QueueStatus),
    {
        let submission = self.submit(app, input).await?;
        loop {
            let status = self.status(app, &submission.request_id, true).await?;
            on_update(&status);
            if status.is_completed() {
                break;
            }
            pause.pause().await;
        }
        self.result(app, &submission.request_id).await
    }

    fn request_url(&self, app: &str, request_id: &str) -> String {
        format!("{}/{}/requests/{}", self.base_url, app_base(app), request_id)
    }

    fn authorize(&self, request: OutboundRequest) -> OutboundRequest {
        request
            .header("authorization", format!("Key {}", self.credential))
            .accept("application/json")
    }
}

/// The `owner/name` part of an app id; deeper paths only apply to submission.
pub fn app_base(app: &str) -> String {
    app.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join("/")
}
