//! gRPC transport client for the blocks provider service.
//!
//! The client owns connection setup (window sizes, response size cap) and
//! authorization-metadata attachment; the returned [`ReceiveStream`] owns the
//! inbound half of the single `ReceiveBlocks` call.

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tonic::codec::Streaming;
use tonic::metadata::errors::InvalidMetadataValue;
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::transport::Endpoint;
use tracing::{debug, info, warn};

use crate::stream::proto::blocks_provider_client::BlocksProviderClient;
use crate::stream::proto::{ReceiveBlocksRequest, ReceiveBlocksResponse};

/// Initial HTTP/2 stream and connection flow-control windows.
const INITIAL_WINDOW_SIZE: u32 = 64 * 1024 * 1024;
/// Upper bound for a single decoded response message.
const MAX_RESPONSE_MESSAGE_BYTES: usize = 1024 * 1024 * 1024;
/// Response header carrying the server-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-reqid";

/// Entry point for opening block stream calls.
#[derive(Clone)]
pub struct BlocksClient {
    addr: String,
    auth_token: Option<SecretString>,
}

impl BlocksClient {
    /// Creates a client for the given endpoint address (scheme included,
    /// e.g. `http://localhost:4300`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            auth_token: None,
        }
    }

    /// Sets the bearer token attached as `authorization` metadata.
    ///
    /// `None` or an empty token means no metadata is attached; the server is
    /// the one enforcing authorization, not this client.
    pub fn with_auth_token(mut self, token: Option<SecretString>) -> Self {
        self.auth_token = token;
        self
    }

    /// Opens the `ReceiveBlocks` call and returns a handle over its inbound
    /// half.
    ///
    /// Returns once the call is established; it does not wait for the first
    /// response message. Response headers are captured here and reported
    /// lazily by the handle.
    pub async fn open(
        &self,
        request: ReceiveBlocksRequest,
    ) -> Result<ReceiveStream, StreamClientError> {
        let endpoint = Endpoint::from_shared(self.addr.clone())
            .map_err(|source| StreamClientError::Connect {
                addr: self.addr.clone(),
                source,
            })?
            .initial_stream_window_size(INITIAL_WINDOW_SIZE)
            .initial_connection_window_size(INITIAL_WINDOW_SIZE);

        let channel = endpoint
            .connect()
            .await
            .map_err(|source| StreamClientError::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        let mut provider = BlocksProviderClient::new(channel)
            .max_decoding_message_size(MAX_RESPONSE_MESSAGE_BYTES);

        let mut call = tonic::Request::new(request);
        if let Some(token) = &self.auth_token {
            if !token.expose_secret().is_empty() {
                call.metadata_mut()
                    .insert("authorization", bearer_value(token)?);
            }
        }

        info!(addr = %self.addr, "calling ReceiveBlocks");
        let response = provider
            .receive_blocks(call)
            .await
            .map_err(StreamClientError::Call)?;
        info!("call established, waiting for responses");

        let (headers, stream, _extensions) = response.into_parts();
        Ok(ReceiveStream {
            inner: Some(stream),
            headers,
            headers_reported: false,
        })
    }
}

fn bearer_value(token: &SecretString) -> Result<MetadataValue<Ascii>, StreamClientError> {
    MetadataValue::try_from(format!("Bearer {}", token.expose_secret()))
        .map_err(StreamClientError::AuthToken)
}

/// Inbound half of an open `ReceiveBlocks` call.
pub struct ReceiveStream {
    inner: Option<Streaming<ReceiveBlocksResponse>>,
    headers: MetadataMap,
    headers_reported: bool,
}

impl ReceiveStream {
    /// Receives the next response, blocking until one arrives.
    ///
    /// `Ok(None)` is clean end-of-stream (also returned after [`close`]);
    /// any transport failure is fatal to the session and surfaced as
    /// [`StreamClientError::Receive`].
    ///
    /// [`close`]: ReceiveStream::close
    pub async fn next_response(
        &mut self,
    ) -> Result<Option<ReceiveBlocksResponse>, StreamClientError> {
        let Some(stream) = self.inner.as_mut() else {
            return Ok(None);
        };
        match stream.next().await {
            Some(Ok(response)) => Ok(Some(response)),
            Some(Err(status)) => Err(StreamClientError::Receive(status)),
            None => Ok(None),
        }
    }

    /// Reports the server-assigned request id from the response headers.
    ///
    /// Runs at most once; a missing or malformed header is logged and never
    /// retried.
    pub fn report_request_id(&mut self) {
        if self.headers_reported {
            return;
        }
        self.headers_reported = true;
        match self.headers.get(REQUEST_ID_HEADER).map(|value| value.to_str()) {
            Some(Ok(request_id)) => info!(request_id, "response headers received"),
            Some(Err(err)) => warn!(%err, "request id header is not valid ascii"),
            None => warn!("response headers carry no request id"),
        }
    }

    /// Releases the inbound half of the call.
    ///
    /// Safe to call repeatedly and after an error; subsequent
    /// [`next_response`] calls report end-of-stream.
    ///
    /// [`next_response`]: ReceiveStream::next_response
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!("receive stream released");
        }
    }
}

/// Errors produced by transport setup and stream consumption.
#[derive(Debug, Error)]
pub enum StreamClientError {
    /// Connection to the provider endpoint could not be established.
    #[error("unable to connect to blocks provider at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The `ReceiveBlocks` call itself was rejected.
    #[error("unable to call ReceiveBlocks: {0}")]
    Call(#[source] tonic::Status),

    /// The stream broke mid-delivery; the session is not recoverable.
    #[error("unable to receive next response: {0}")]
    Receive(#[source] tonic::Status),

    /// The configured bearer token is not valid metadata material.
    #[error("invalid authorization token: {0}")]
    AuthToken(#[source] InvalidMetadataValue),

    /// The server reported a stream-level failure.
    #[error("stream failed ({kind:?}): {description}")]
    Stream {
        kind: crate::stream::proto::stream_error::Kind,
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::bearer_value;

    #[test]
    fn bearer_value_formats_authorization_metadata() {
        let token = SecretString::new("abc123".to_string());
        let value = bearer_value(&token).expect("valid metadata");
        assert_eq!(value.to_str().expect("ascii"), "Bearer abc123");
    }

    #[test]
    fn bearer_value_rejects_non_ascii_tokens() {
        let token = SecretString::new("tok\nen".to_string());
        assert!(bearer_value(&token).is_err());
    }
}
