//! Try-on popup state.
//!
//! A session moves through `Idle -> Uploaded -> Processing -> Result`. A new
//! upload always drops the previous result, and closing the popup aborts the
//! in-flight job and returns to `Idle`.

use std::cell::RefCell;
use std::rc::Rc;

use edge_data::HttpTransport;
use edge_observability::StructuredLogger;
use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};
use serde::Serialize;

use crate::config::TryOnConfig;
use crate::encode::UploadedImage;
use crate::error::{TryOnError, TryOnResult};
use crate::input::{TryOnInput, TryOnOutput};
use crate::pause::Pause;
use crate::queue::QueueClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryOnState {
    Idle,
    /// Photo chosen, no job yet.
    Uploaded { preview: String },
    Processing { preview: String },
    Result { preview: String, result_url: String },
}

impl TryOnState {
    pub fn preview(&self) -> Option<&str> {
        match self {
            TryOnState::Idle => None,
            TryOnState::Uploaded { preview }
            | TryOnState::Processing { preview }
            | TryOnState::Result { preview, .. } => Some(preview),
        }
    }

    pub fn result_url(&self) -> Option<&str> {
        match self {
            TryOnState::Result { result_url, .. } => Some(result_url),
            _ => None,
        }
    }
}

type AbortSlot = Rc<RefCell<Option<AbortHandle>>>;

/// Aborts a session's in-flight job from outside the future running it.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    slot: AbortSlot,
}

impl CloseHandle {
    /// Returns whether a job was running.
    pub fn abort(&self) -> bool {
        match self.slot.borrow_mut().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Result,
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slide {
    pub kind: SlideKind,
    pub url: String,
}

/// What the popup shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TryOnView {
    pub open: bool,
    pub processing: bool,
    /// Result first, then the uploaded photo.
    pub slides: Vec<Slide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One shopper's try-on popup.
#[derive(Debug)]
pub struct TryOnSession {
    config: TryOnConfig,
    state: TryOnState,
    open: bool,
    error: Option<String>,
    in_flight: AbortSlot,
    logger: Option<StructuredLogger>,
}

impl TryOnSession {
    pub fn new(config: TryOnConfig) -> Self {
        Self {
            config,
            state: TryOnState::Idle,
            open: false,
            error: None,
            in_flight: Rc::new(RefCell::new(None)),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &TryOnConfig {
        &self.config
    }

    pub fn state(&self) -> &TryOnState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, TryOnState::Processing { .. })
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the popup, aborting any running job and forgetting the photo.
    pub fn close(&mut self) {
        if self.abort_in_flight() {
            self.log_info("try-on aborted on close");
        }
        self.open = false;
        self.state = TryOnState::Idle;
        self.error = None;
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            slot: Rc::clone(&self.in_flight),
        }
    }

    /// Replace the photo. Any previous result is dropped and a running job
    /// is aborted, even when the new file cannot be encoded.
    pub fn upload(&mut self, image: &UploadedImage) -> TryOnResult<()> {
        if self.abort_in_flight() {
            self.log_info("try-on aborted by new upload");
        }
        match image.to_data_url() {
            Ok(preview) => {
                self.state = TryOnState::Uploaded { preview };
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.state = TryOnState::Idle;
                self.error = Some(err.to_string());
                if let Some(logger) = &self.logger {
                    logger.warn("try-on upload rejected").error(&err).emit();
                }
                Err(err)
            }
        }
    }

    /// Start a job for the current photo.
    ///
    /// The registration must wrap the job's future so that closing the
    /// session can abort it.
    pub fn begin(&mut self) -> TryOnResult<(TryOnInput, AbortRegistration)> {
        let preview = match &self.state {
            TryOnState::Idle => return Err(TryOnError::NoUpload),
            TryOnState::Processing { .. } => return Err(TryOnError::AlreadyProcessing),
            TryOnState::Uploaded { preview } | TryOnState::Result { preview, .. } => {
                preview.clone()
            }
        };

        let input = TryOnInput {
            model_image: preview.clone(),
            garment_image: self.config.garment_image.clone(),
            category: self.config.category,
        };
        let (handle, registration) = AbortHandle::new_pair();
        *self.in_flight.borrow_mut() = Some(handle);
        self.state = TryOnState::Processing { preview };
        self.error = None;
        Ok((input, registration))
    }

    /// Record a finished job. The first output image becomes the result.
    pub fn complete<'o>(&mut self, output: &'o TryOnOutput) -> TryOnResult<&'o str> {
        let preview = match &self.state {
            TryOnState::Processing { preview } => preview.clone(),
            _ => return Err(TryOnError::Aborted),
        };
        self.in_flight.borrow_mut().take();

        let Some(url) = output.first_image_url() else {
            let err = TryOnError::EmptyResult;
            self.fail(&err);
            return Err(err);
        };

        self.state = TryOnState::Result {
            preview,
            result_url: url.to_string(),
        };
        Ok(url)
    }

    /// Record a failed job. The photo is kept so the shopper can retry.
    pub fn fail(&mut self, error: &TryOnError) {
        self.in_flight.borrow_mut().take();
        if let TryOnState::Processing { preview } = &self.state {
            self.state = TryOnState::Uploaded {
                preview: preview.clone(),
            };
        }
        self.error = Some(error.to_string());
        if let Some(logger) = &self.logger {
            logger.error("try-on failed").error(error).emit();
        }
    }

    /// Run a job to completion through `queue`.
    ///
    /// Resolves with `Aborted` if the session is closed while the job runs.
    pub async fn run<T, P>(&mut self, queue: &QueueClient<'_, T>, pause: &P) -> TryOnResult<String>
    where
        T: HttpTransport,
        P: Pause + ?Sized,
    {
        let (input, registration) = self.begin()?;
        let app = self.config.app_id.clone();
        let logger = self.logger.clone();

        let job = queue.subscribe(&app, &input, pause, |status| {
            if let Some(logger) = &logger {
                let mut entry = logger.debug("try-on status").field("status", status.name());
                if let Some(last) = status.logs().last() {
                    entry = entry.field("log", last);
                }
                entry.emit();
            }
        });

        match Abortable::new(job, registration).await {
            Ok(Ok(output)) => self.complete(&output).map(str::to_string),
            Ok(Err(err)) => {
                self.fail(&err);
                Err(err)
            }
            Err(Aborted) => {
                self.state = TryOnState::Idle;
                self.error = None;
                Err(TryOnError::Aborted)
            }
        }
    }

    pub fn view(&self) -> TryOnView {
        let mut slides = Vec::new();
        if let Some(url) = self.state.result_url() {
            slides.push(Slide {
                kind: SlideKind::Result,
                url: url.to_string(),
            });
        }
        if let Some(url) = self.state.preview() {
            slides.push(Slide {
                kind: SlideKind::Preview,
                url: url.to_string(),
            });
        }
        TryOnView {
            open: self.open,
            processing: self.is_processing(),
            slides,
            error: self.error.clone(),
        }
    }

    fn abort_in_flight(&self) -> bool {
        self.close_handle().abort()
    }

    fn log_info(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger.info(message).emit();
        }
    }
}
