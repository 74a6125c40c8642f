//! Stream aggregation.
//!
//! Turns a provider's newline-delimited JSON response body into incremental
//! updates of exactly one assistant `Message`. Each line is parsed
//! independently; a line that fails to parse is skipped, because providers
//! emit partial JSON chunks at buffer boundaries.

use chat_core::{Attachment, Message};
use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::api::models::StreamFragment;
use crate::error::{parse_error_message, parse_retry_after_secs, UpstreamError};

/// Incremental updates surfaced while a turn streams.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The message changed (content appended or citations/images merged).
    Snapshot(Message),
    /// A provider finished uploading a file; does not touch message content.
    AttachmentUploaded(Attachment),
    /// The message is complete and frozen.
    Completed(Message),
}

/// Aggregates stream fragments into one assistant message.
pub struct StreamAggregator {
    message: Message,
}

impl StreamAggregator {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message: Message::assistant_pending(message_id),
        }
    }

    /// Current state of the in-flight message (partial until completed).
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn is_completed(&self) -> bool {
        self.message.completed
    }

    /// Apply one line of the stream. Returns the resulting event, or `None`
    /// for blank lines, unrelated fragments and lines that fail to parse.
    pub fn apply_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        // Some providers frame the same payloads as `data: {...}` lines.
        let line = line.strip_prefix("data:").map(str::trim_start).unwrap_or(line);
        if line == "[DONE]" {
            return Some(StreamEvent::Completed(self.finish()));
        }

        let fragment: StreamFragment = match serde_json::from_str(line) {
            Ok(fragment) => fragment,
            Err(err) => {
                log::debug!("skipping malformed stream line: {err}");
                return None;
            }
        };
        self.apply_fragment(fragment)
    }

    fn apply_fragment(&mut self, fragment: StreamFragment) -> Option<StreamEvent> {
        if fragment.is_attachment_uploaded() {
            if let Some(attachment) = fragment.attachment.as_ref() {
                self.message.attachments.push(attachment.clone());
                return Some(StreamEvent::AttachmentUploaded(attachment.clone()));
            }
        }

        let mut changed = false;
        let finished = fragment.finish_reason().is_some();

        if let Some(citations) = fragment.citations {
            for citation in citations {
                if !self.message.citations.iter().any(|c| c.url == citation.url) {
                    self.message.citations.push(citation);
                    changed = true;
                }
            }
        }

        if let Some(images) = fragment.images {
            for image in images {
                if !self.message.images.iter().any(|i| i.url == image.url) {
                    self.message.images.push(image);
                    changed = true;
                }
            }
        }

        for choice in fragment.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    self.message.content.push_str(&content);
                    changed = true;
                }
            }
        }

        if finished {
            Some(StreamEvent::Completed(self.finish()))
        } else if changed {
            Some(StreamEvent::Snapshot(self.message.clone()))
        } else {
            None
        }
    }

    /// Mark the message completed, record the end timestamp and the
    /// tokens-per-second estimate. Idempotent.
    pub fn finish(&mut self) -> Message {
        if !self.message.completed {
            let end = Utc::now();
            self.message.completed = true;
            self.message.end_time = Some(end);
            if let Some(start) = self.message.start_time {
                // content length / 4 approximates the token count; clamp the
                // elapsed time so instant completions do not divide by zero.
                let elapsed = (end - start).num_milliseconds().max(1) as f64 / 1000.0;
                let tokens = self.message.content.len() as f64 / 4.0;
                self.message.tps = Some(tokens / elapsed);
            }
        }
        self.message.clone()
    }
}

/// Inspect a non-streaming upstream failure before aggregation starts.
///
/// 401 is reported as an authentication failure, 429 as a rate limit with a
/// wait-time hint scraped from the error message; everything else propagates
/// as a generic upstream failure carrying the server message if present.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = parse_error_message(&body);

    match status.as_u16() {
        401 => Err(UpstreamError::AuthenticationRequired),
        429 => Err(UpstreamError::RateLimited {
            retry_after_secs: message.as_deref().and_then(parse_retry_after_secs),
        }),
        code => Err(UpstreamError::Upstream {
            status: code,
            message: message.unwrap_or_else(|| status.to_string()),
        }),
    }
}

/// Drive a streaming response to completion, forwarding events to `tx`.
///
/// Cancellation aborts the network read and returns `Aborted`; the partial
/// message state remains available on the aggregator (not reverted). A
/// dropped receiver is treated the same way since nobody is listening.
/// Drain one complete line from the raw byte buffer. Conversion to text only
/// happens on whole lines, so a multi-byte character split across network
/// chunks is reassembled before decoding.
fn drain_line(buffer: &mut Vec<u8>) -> Option<String> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&line).into_owned())
}

pub async fn aggregate(
    response: reqwest::Response,
    aggregator: &mut StreamAggregator,
    tx: &Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> Result<Message, UpstreamError> {
    let mut byte_stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("stream cancelled, leaving message in partial state");
                return Err(UpstreamError::Aborted);
            }
            chunk = byte_stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                buffer.extend_from_slice(&bytes);
                while let Some(line) = drain_line(&mut buffer) {
                    if let Some(event) = aggregator.apply_line(&line) {
                        let completed = matches!(event, StreamEvent::Completed(_));
                        if tx.send(event).await.is_err() {
                            log::warn!("stream receiver dropped, aborting read");
                            return Err(UpstreamError::Aborted);
                        }
                        if completed {
                            return Ok(aggregator.message().clone());
                        }
                    }
                }
            }
            Some(Err(err)) => {
                log::error!("error reading upstream stream: {err}");
                return Err(UpstreamError::Network(err.to_string()));
            }
            // Transport completion also ends the message.
            None => break,
        }
    }

    // Whatever is left in the buffer is the final (unterminated) line.
    if let Some(event) = aggregator.apply_line(&String::from_utf8_lossy(&buffer)) {
        if tx.send(event).await.is_err() {
            return Err(UpstreamError::Aborted);
        }
    }
    if !aggregator.is_completed() {
        let message = aggregator.finish();
        if tx.send(StreamEvent::Completed(message)).await.is_err() {
            return Err(UpstreamError::Aborted);
        }
    }
    Ok(aggregator.message().clone())
}
