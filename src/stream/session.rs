//! Receive loop and response dispatch for an open block stream.
//!
//! `StreamSession` consumes raw responses one at a time, maps each into a
//! typed [`ResponseItem`], and hands it to the [`Dispatcher`]. The loop is
//! strictly sequential: the next receive is not issued until the previous
//! item is fully handled, which is the client-side backpressure mechanism.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::stream::client::{BlocksClient, ReceiveStream, StreamClientError};
use crate::stream::proto::{
    block_message, receive_blocks_response, stream_error, ReceiveBlocksRequest,
    ReceiveBlocksResponse,
};
use crate::stream::speed::SpeedGauge;

/// A classified response item.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseItem {
    /// A delivered block message.
    Message {
        /// Height of the block, 0 when the server omitted the id.
        height: u64,
        /// True while the item belongs to catchup replay rather than live
        /// delivery.
        catchup_in_progress: bool,
        /// Block body bytes; `None` when the request excluded payloads.
        payload: Option<Vec<u8>>,
    },
    /// Terminal completion notice.
    Done { description: String },
    /// Terminal failure notice.
    Error {
        kind: stream_error::Kind,
        description: String,
    },
    /// A variant this client does not know; logged and ignored so newer
    /// servers keep working.
    Unrecognized,
}

impl ResponseItem {
    /// Classifies a raw response into its item kind.
    pub fn from_response(response: ReceiveBlocksResponse) -> Self {
        use receive_blocks_response::Response;

        match response.response {
            Some(Response::Message(message)) => {
                let catchup_in_progress = message.catchup_in_progress;
                let (id, payload) = match message.message {
                    Some(block) => (block.id, block.payload),
                    None => (None, None),
                };
                let height = id.map_or(0, |id| id.height);
                let payload = payload.map(|payload| match payload {
                    block_message::Payload::RawPayload(bytes) => bytes,
                });
                ResponseItem::Message {
                    height,
                    catchup_in_progress,
                    payload,
                }
            }
            Some(Response::Done(done)) => ResponseItem::Done {
                description: done.description,
            },
            Some(Response::Error(failure)) => ResponseItem::Error {
                kind: stream_error::Kind::try_from(failure.kind)
                    .unwrap_or(stream_error::Kind::Unknown),
                description: failure.description,
            },
            None => ResponseItem::Unrecognized,
        }
    }
}

/// How a run of the receive loop ended, when it ended cleanly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    /// The server finished the stream (`Done` or clean end-of-stream).
    Completed,
    /// Cancellation was observed; the shutdown is clean, not an error.
    Interrupted,
}

/// Routes each received item to its handler; never fails.
pub struct Dispatcher {
    speed: Option<SpeedGauge>,
    messages: u64,
}

impl Dispatcher {
    /// Creates a dispatcher; a zero `speed_log_interval` disables speed
    /// accounting entirely.
    pub fn new(speed_log_interval: Duration) -> Self {
        Self {
            speed: SpeedGauge::new(speed_log_interval),
            messages: 0,
        }
    }

    /// Emits one observability record per item and feeds the speed gauge.
    pub fn dispatch(&mut self, item: &ResponseItem) {
        match item {
            ResponseItem::Message {
                height,
                catchup_in_progress,
                payload,
            } => {
                let payload_size = payload.as_ref().map_or(0, Vec::len);
                self.messages += 1;
                info!(
                    height = *height,
                    catchup = *catchup_in_progress,
                    payload_size,
                    "new message"
                );
                if let Some(speed) = self.speed.as_mut() {
                    speed.record(payload_size as u64);
                }
            }
            ResponseItem::Done { description } => {
                info!(%description, "stream done");
            }
            ResponseItem::Error { kind, description } => {
                error!(?kind, %description, "stream error");
            }
            ResponseItem::Unrecognized => {
                debug!("ignoring unrecognized response variant");
            }
        }
    }

    /// Number of block messages dispatched so far.
    pub fn messages_dispatched(&self) -> u64 {
        self.messages
    }
}

/// Source of raw responses consumed by a session.
///
/// The live implementation is [`ReceiveStream`]; tests script sources to
/// drive the loop without a server.
#[allow(async_fn_in_trait)]
pub trait BlockSource {
    /// Blocks until the next response, end-of-stream (`Ok(None)`), or a
    /// fatal transport failure.
    async fn next_response(&mut self) -> Result<Option<ReceiveBlocksResponse>, StreamClientError>;

    /// One-shot header reporting hook; called after the first successful
    /// receive and once more during shutdown.
    fn report_headers(&mut self) {}

    /// Releases the underlying call.
    fn close(&mut self) {}
}

impl BlockSource for ReceiveStream {
    async fn next_response(&mut self) -> Result<Option<ReceiveBlocksResponse>, StreamClientError> {
        ReceiveStream::next_response(self).await
    }

    fn report_headers(&mut self) {
        self.report_request_id();
    }

    fn close(&mut self) {
        ReceiveStream::close(self);
    }
}

/// Owns one open stream from first response to shutdown.
pub struct StreamSession<S = ReceiveStream> {
    source: S,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
    closed: bool,
}

impl StreamSession<ReceiveStream> {
    /// Opens the call for `request` and wraps it in a session.
    pub async fn open(
        client: &BlocksClient,
        request: ReceiveBlocksRequest,
        dispatcher: Dispatcher,
        cancel: CancellationToken,
    ) -> Result<Self, StreamClientError> {
        let source = client.open(request).await?;
        Ok(Self::from_source(source, dispatcher, cancel))
    }
}

impl<S: BlockSource> StreamSession<S> {
    /// Wraps an already-open source.
    pub fn from_source(source: S, dispatcher: Dispatcher, cancel: CancellationToken) -> Self {
        Self {
            source,
            dispatcher,
            cancel,
            closed: false,
        }
    }

    /// Consumes the stream until completion, server error, transport
    /// failure, or cancellation, then runs the close sequence.
    ///
    /// Cancellation and clean end-of-stream are successful outcomes; a
    /// server `Error` item or a broken transport is returned as the error it
    /// is, after the close sequence has run.
    pub async fn run(&mut self) -> Result<RunOutcome, StreamClientError> {
        let result = self.receive_loop().await;
        self.close();
        result
    }

    async fn receive_loop(&mut self) -> Result<RunOutcome, StreamClientError> {
        loop {
            // Cancellation is polled before the blocking receive; a receive
            // already in flight is dropped with the session during close.
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("interrupted, stopping");
                    return Ok(RunOutcome::Interrupted);
                }
                received = self.source.next_response() => received?,
            };

            let Some(response) = received else {
                info!("stream finished");
                return Ok(RunOutcome::Completed);
            };
            self.source.report_headers();

            let item = ResponseItem::from_response(response);
            self.dispatcher.dispatch(&item);

            match item {
                ResponseItem::Done { .. } => return Ok(RunOutcome::Completed),
                ResponseItem::Error { kind, description } => {
                    return Err(StreamClientError::Stream { kind, description });
                }
                ResponseItem::Message { .. } | ResponseItem::Unrecognized => {}
            }
        }
    }

    /// Runs the orderly shutdown sequence once: report headers if still
    /// pending, then release the source. Safe after errors and repeat calls.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source.report_headers();
        self.source.close();
    }

    /// Read access to dispatch counters.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
