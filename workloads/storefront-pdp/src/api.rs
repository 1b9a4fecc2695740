//! JSON routes behind the try-on popup.
//!
//! The browser posts the shopper photo, then polls the job until it
//! completes. Closing the popup cancels the job.

use edge_sdk::edge_data::{FetchClient, HttpTransport};
use edge_sdk::edge_observability::StructuredLogger;
use serde_json::{json, Value};
use storefront_tryon::{QueueClient, QueueStatus, TryOnError, TryOnSession, UploadedImage};

use crate::config::StorefrontConfig;

/// A JSON response from one of the API routes.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    /// Serialized body, empty for 204.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body
            .as_ref()
            .map(|body| body.to_string().into_bytes())
            .unwrap_or_default()
    }
}

/// `POST /api/try-on`: queue a job for the uploaded photo.
pub async fn submit<T: HttpTransport>(
    fetch: &FetchClient<T>,
    config: &StorefrontConfig,
    content_type: Option<&str>,
    body: Vec<u8>,
    logger: &StructuredLogger,
) -> ApiResponse {
    let Some(credential) = &config.fal_key else {
        return ApiResponse::error(503, "try-on is not configured");
    };

    let mut session = TryOnSession::new(config.tryon.clone()).with_logger(logger.clone());
    let image = UploadedImage::new(body, content_type);
    let input = match session.upload(&image).and_then(|_| session.begin()) {
        Ok((input, _registration)) => input,
        Err(err) => return ApiResponse::error(400, err.to_string()),
    };

    let queue = QueueClient::new(fetch, credential.as_str());
    match queue.submit(&config.tryon.app_id, &input).await {
        Ok(submission) => {
            logger
                .info("try-on queued")
                .field("request_id", &submission.request_id)
                .field("mime", image.mime_type())
                .field_u64("bytes", image.bytes.len() as u64)
                .emit();
            ApiResponse::json(
                202,
                json!({ "request_id": submission.request_id, "status": "IN_QUEUE" }),
            )
        }
        Err(err) => {
            session.fail(&err);
            ApiResponse::error(502, err.to_string())
        }
    }
}

/// `GET /api/try-on/:request_id`: job status, with the image once complete.
pub async fn status<T: HttpTransport>(
    fetch: &FetchClient<T>,
    config: &StorefrontConfig,
    request_id: &str,
    logger: &StructuredLogger,
) -> ApiResponse {
    let Some(credential) = &config.fal_key else {
        return ApiResponse::error(503, "try-on is not configured");
    };
    if !is_valid_request_id(request_id) {
        return ApiResponse::error(400, "invalid request id");
    }

    let queue = QueueClient::new(fetch, credential.as_str());
    let app = config.tryon.app_id.as_str();

    let status = match queue.status(app, request_id, false).await {
        Ok(status) => status,
        Err(err) => return upstream_failure(logger, request_id, &err),
    };

    match status {
        QueueStatus::InQueue { queue_position } => {
            let mut body = json!({ "status": "IN_QUEUE" });
            if let Some(position) = queue_position {
                body["queue_position"] = json!(position);
            }
            ApiResponse::json(200, body)
        }
        QueueStatus::InProgress { .. } => ApiResponse::json(200, json!({ "status": "IN_PROGRESS" })),
        QueueStatus::Completed { .. } => {
            let output = match queue.result(app, request_id).await {
                Ok(output) => output,
                Err(err) => return upstream_failure(logger, request_id, &err),
            };
            match output.first_image_url() {
                Some(url) => ApiResponse::json(200, json!({ "status": "COMPLETED", "image_url": url })),
                None => upstream_failure(logger, request_id, &TryOnError::EmptyResult),
            }
        }
    }
}

/// `DELETE /api/try-on/:request_id`: cancel a job.
///
/// Always answers 204. A job that already finished cannot be cancelled and
/// that is not an error for the shopper.
pub async fn cancel<T: HttpTransport>(
    fetch: &FetchClient<T>,
    config: &StorefrontConfig,
    request_id: &str,
    logger: &StructuredLogger,
) -> ApiResponse {
    let Some(credential) = &config.fal_key else {
        return ApiResponse::no_content();
    };
    if !is_valid_request_id(request_id) {
        return ApiResponse::no_content();
    }

    let queue = QueueClient::new(fetch, credential.as_str());
    match queue.cancel(&config.tryon.app_id, request_id).await {
        Ok(()) => logger.info("try-on cancelled").field("request_id", request_id).emit(),
        Err(err) => logger
            .warn("try-on cancel failed")
            .field("request_id", request_id)
            .error(&err)
            .emit(),
    }
    ApiResponse::no_content()
}

fn upstream_failure(logger: &StructuredLogger, request_id: &str, err: &TryOnError) -> ApiResponse {
    logger
        .error("try-on failed")
        .field("request_id", request_id)
        .error(err)
        .emit();
    ApiResponse::error(502, err.to_string())
}

/// Queue request ids are UUIDs; anything else never reaches the queue URL.
fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::config;
    use edge_sdk::edge_core::{Method, RequestId};
    use edge_sdk::edge_data::mock::MockTransport;
    use futures::executor::block_on;

    const JOB: &str = "2f1c-77ab";

    fn fetch(transport: MockTransport) -> FetchClient<MockTransport> {
        FetchClient::new(
            transport,
            RequestId::from_string("req-1"),
            crate::outbound_allowlist(&config()),
        )
    }

    fn logger() -> StructuredLogger {
        StructuredLogger::capturing(RequestId::from_string("req-1")).0
    }

    #[test]
    fn test_submit_queues_data_url() {
        let fetch = fetch(MockTransport::new().reply_json(200, json!({ "request_id": JOB })));
        let response = block_on(submit(
            &fetch,
            &config(),
            Some("image/jpeg"),
            b"photo".to_vec(),
            &logger(),
        ));

        assert_eq!(response.status, 202);
        assert_eq!(response.body.unwrap()["request_id"], JOB);

        let requests = fetch.transport().requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "https://queue.fal.run/fashn/tryon");
        assert_eq!(requests[0].header_value("authorization"), Some("Key fal-secret"));
        let input: Value = serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(input["model_image"], "data:image/jpeg;base64,cGhvdG8=");
        assert_eq!(input["category"], "one-pieces");
    }

    #[test]
    fn test_submit_rejects_empty_upload() {
        let fetch = fetch(MockTransport::new());
        let response = block_on(submit(&fetch, &config(), Some("image/png"), Vec::new(), &logger()));
        assert_eq!(response.status, 400);
        assert!(fetch.transport().requests().is_empty());
    }

    #[test]
    fn test_submit_without_credential() {
        let mut config = config();
        config.fal_key = None;
        let fetch = fetch(MockTransport::new());
        let response = block_on(submit(&fetch, &config, None, b"x".to_vec(), &logger()));
        assert_eq!(response.status, 503);
    }

    #[test]
    fn test_status_in_queue() {
        let fetch = fetch(
            MockTransport::new().reply_json(200, json!({ "status": "IN_QUEUE", "queue_position": 3 })),
        );
        let response = block_on(status(&fetch, &config(), JOB, &logger()));
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body.unwrap(),
            json!({ "status": "IN_QUEUE", "queue_position": 3 })
        );
        assert_eq!(
            fetch.transport().requests()[0].url,
            format!("https://queue.fal.run/fashn/tryon/requests/{}/status", JOB)
        );
    }

    #[test]
    fn test_status_completed_returns_image() {
        let fetch = fetch(
            MockTransport::new()
                .reply_json(200, json!({ "status": "COMPLETED" }))
                .reply_json(200, json!({ "images": [{ "url": "https://v3.fal.media/out.png" }] })),
        );
        let response = block_on(status(&fetch, &config(), JOB, &logger()));
        assert_eq!(
            response.body.unwrap(),
            json!({ "status": "COMPLETED", "image_url": "https://v3.fal.media/out.png" })
        );
    }

    #[test]
    fn test_status_failed_job() {
        let fetch = fetch(
            MockTransport::new()
                .reply_json(200, json!({ "status": "COMPLETED" }))
                .reply_json(422, json!({ "detail": "no person found" })),
        );
        let (logger, entries) = StructuredLogger::capturing(RequestId::from_string("req-1"));
        let response = block_on(status(&fetch, &config(), JOB, &logger));

        assert_eq!(response.status, 502);
        let error = response.body.unwrap()["error"].as_str().unwrap().to_string();
        assert!(error.contains("no person found"));
        assert!(entries.borrow().iter().any(|e| e.message == "try-on failed"));
    }

    #[test]
    fn test_status_rejects_bad_id() {
        let fetch = fetch(MockTransport::new());
        let response = block_on(status(&fetch, &config(), "../secrets", &logger()));
        assert_eq!(response.status, 400);
        assert!(fetch.transport().requests().is_empty());
    }

    #[test]
    fn test_cancel_is_best_effort() {
        let fetch = fetch(MockTransport::new().reply_json(400, json!({ "detail": "already done" })));
        let (logger, entries) = StructuredLogger::capturing(RequestId::from_string("req-1"));
        let response = block_on(cancel(&fetch, &config(), JOB, &logger));

        assert_eq!(response.status, 204);
        assert!(response.body_bytes().is_empty());
        assert_eq!(fetch.transport().requests()[0].method, Method::Put);
        assert!(entries.borrow().iter().any(|e| e.message == "try-on cancel failed"));
    }
}
