use crate::scoring::Score;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Shown instead of coaching when the request fails for any reason.
pub const FALLBACK_FEEDBACK: &str =
    "Great effort! Keep practicing a little every day to build both speed and accuracy.";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned empty content")]
    EmptyContent,
}

/// Turns a result summary into a short coaching message. May block.
pub trait FeedbackRequester: Send + Sync {
    fn request_feedback(&self, summary: &str) -> Result<String, FeedbackError>;
}

/// Requester used when no API key is available: every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFeedback;

impl FeedbackRequester for OfflineFeedback {
    fn request_feedback(&self, _summary: &str) -> Result<String, FeedbackError> {
        Err(FeedbackError::MissingApiKey)
    }
}

/// A pending request, tagged with the attempt it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub generation: u64,
    pub summary: String,
}

/// A resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackReply {
    pub generation: u64,
    pub message: String,
}

/// Accepts feedback requests without blocking the caller.
pub trait FeedbackSink {
    fn submit(&self, request: FeedbackRequest);
}

/// Message sent to the coach for a finished attempt.
pub fn summary_text(score: &Score, reference: &str) -> String {
    format!(
        "I just completed a typing test. WPM: {}, Accuracy: {}%. Text was: \"{}\".",
        score.wpm, score.accuracy, reference
    )
}

/// Resolves a request synchronously, substituting the fallback on error.
pub fn resolve(requester: &dyn FeedbackRequester, request: &FeedbackRequest) -> FeedbackReply {
    let message = match requester.request_feedback(&request.summary) {
        Ok(message) => message,
        Err(e) => {
            warn!(generation = request.generation, error = %e, "coaching feedback failed");
            FALLBACK_FEEDBACK.to_string()
        }
    };

    FeedbackReply {
        generation: request.generation,
        message,
    }
}

/// Runs each request on its own thread and sends the reply into an event channel.
pub struct FeedbackDispatcher<E> {
    requester: Arc<dyn FeedbackRequester>,
    tx: Sender<E>,
}

impl<E> FeedbackDispatcher<E>
where
    E: From<FeedbackReply> + Send + 'static,
{
    pub fn new(requester: Arc<dyn FeedbackRequester>, tx: Sender<E>) -> Self {
        Self { requester, tx }
    }
}

impl<E> Clone for FeedbackDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            requester: Arc::clone(&self.requester),
            tx: self.tx.clone(),
        }
    }
}

impl<E> FeedbackSink for FeedbackDispatcher<E>
where
    E: From<FeedbackReply> + Send + 'static,
{
    fn submit(&self, request: FeedbackRequest) {
        let requester = Arc::clone(&self.requester);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let reply = resolve(requester.as_ref(), &request);
            if tx.send(E::from(reply)).is_err() {
                debug!(
                    generation = request.generation,
                    "event loop gone, dropping feedback"
                );
            }
        });
    }
}
