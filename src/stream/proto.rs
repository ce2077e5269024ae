//! Wire types for the `blocksapi.BlocksProvider` service.
//!
//! Hand-maintained prost definitions plus a tonic client kept in the shape of
//! codegen output, so the crate builds without a protoc step. The server
//! treats a target height of 0 as "unset" in every request field.

/// Position of a message in a block stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockId {
    #[prost(enumeration = "block_id::Kind", tag = "1")]
    pub kind: i32,
    #[prost(uint64, tag = "2")]
    pub height: u64,
}

/// Nested message and enum types in `BlockId`.
pub mod block_id {
    /// Granularity of the message the id points at.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Kind {
        Unspecified = 0,
        WholeMessage = 1,
    }
}

/// A single block message delivered over the stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockMessage {
    #[prost(message, optional, tag = "1")]
    pub id: ::core::option::Option<BlockId>,
    #[prost(oneof = "block_message::Payload", tags = "2")]
    pub payload: ::core::option::Option<block_message::Payload>,
}

/// Nested message and enum types in `BlockMessage`.
pub mod block_message {
    /// Absent entirely when the request excluded payloads (headers-only).
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(bytes, tag = "2")]
        RawPayload(::prost::alloc::vec::Vec<u8>),
    }
}

/// Per-message delivery toggles.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockMessageDeliverySettings {
    #[prost(bool, tag = "1")]
    pub exclude_payload: bool,
}

/// Per-phase (live vs catchup) delivery settings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockStreamDeliverySettings {
    #[prost(message, optional, tag = "1")]
    pub content: ::core::option::Option<BlockMessageDeliverySettings>,
}

/// The single request sent when opening a `ReceiveBlocks` call.
///
/// Target fields are meaningful only when the matching policy requires one;
/// the server reserves height 0 as "absent".
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReceiveBlocksRequest {
    #[prost(string, tag = "1")]
    pub stream_name: ::prost::alloc::string::String,
    #[prost(enumeration = "receive_blocks_request::StartPolicy", tag = "2")]
    pub start_policy: i32,
    #[prost(message, optional, tag = "3")]
    pub start_target: ::core::option::Option<BlockId>,
    #[prost(enumeration = "receive_blocks_request::StopPolicy", tag = "4")]
    pub stop_policy: i32,
    #[prost(message, optional, tag = "5")]
    pub stop_target: ::core::option::Option<BlockId>,
    #[prost(message, optional, tag = "6")]
    pub delivery_settings: ::core::option::Option<BlockStreamDeliverySettings>,
    #[prost(enumeration = "receive_blocks_request::CatchupPolicy", tag = "7")]
    pub catchup_policy: i32,
    #[prost(message, optional, tag = "8")]
    pub catchup_delivery_settings: ::core::option::Option<BlockStreamDeliverySettings>,
}

/// Nested message and enum types in `ReceiveBlocksRequest`.
pub mod receive_blocks_request {
    /// Where delivery starts within the stream.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum StartPolicy {
        StartOnEarliestAvailable = 0,
        StartOnLatestAvailable = 1,
        StartExactlyOnTarget = 2,
        StartExactlyAfterTarget = 3,
        StartOnClosestToTarget = 4,
        StartOnEarliestAfterTarget = 5,
    }

    /// Where delivery stops, if ever.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum StopPolicy {
        StopNever = 0,
        StopBeforeTarget = 1,
        StopAfterTarget = 2,
    }

    /// Whether the server may replay historical data to reach the start point.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum CatchupPolicy {
        CatchupPanic = 0,
        CatchupWait = 1,
        CatchupStream = 2,
    }
}

/// One item of the `ReceiveBlocks` response stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReceiveBlocksResponse {
    #[prost(oneof = "receive_blocks_response::Response", tags = "1, 2, 3")]
    pub response: ::core::option::Option<receive_blocks_response::Response>,
}

/// Nested message and enum types in `ReceiveBlocksResponse`.
pub mod receive_blocks_response {
    /// `Done` and `Error` are terminal; the transport stream closes after them.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Response {
        #[prost(message, tag = "1")]
        Message(super::BlockStreamMessage),
        #[prost(message, tag = "2")]
        Done(super::StreamDone),
        #[prost(message, tag = "3")]
        Error(super::StreamError),
    }
}

/// A block message plus its delivery-phase flag.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockStreamMessage {
    #[prost(message, optional, tag = "1")]
    pub message: ::core::option::Option<BlockMessage>,
    /// True while the server is replaying catchup data (`CatchupStream` only).
    #[prost(bool, tag = "2")]
    pub catchup_in_progress: bool,
}

/// Terminal completion notice.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamDone {
    #[prost(string, tag = "1")]
    pub description: ::prost::alloc::string::String,
}

/// Terminal failure notice.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamError {
    #[prost(enumeration = "stream_error::Kind", tag = "1")]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub description: ::prost::alloc::string::String,
}

/// Nested message and enum types in `StreamError`.
pub mod stream_error {
    /// Unknown values from newer servers decode to `Unknown`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Kind {
        Unknown = 0,
        StreamNotFound = 1,
        CatchupImpossible = 2,
        Internal = 3,
    }
}

/// Client for the `blocksapi.BlocksProvider` service, kept in the shape of
/// tonic codegen output.
pub mod blocks_provider_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct BlocksProviderClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl BlocksProviderClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> BlocksProviderClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::Body>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        /// Limits the maximum size of a decoded message.
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        pub async fn receive_blocks(
            &mut self,
            request: impl tonic::IntoRequest<super::ReceiveBlocksRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::ReceiveBlocksResponse>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/blocksapi.BlocksProvider/ReceiveBlocks");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("blocksapi.BlocksProvider", "ReceiveBlocks"));
            self.inner.server_streaming(req, path, codec).await
        }
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn request_round_trip() {
        let request = ReceiveBlocksRequest {
            stream_name: "v2_mainnet_near_blocks".to_string(),
            start_policy: receive_blocks_request::StartPolicy::StartExactlyOnTarget as i32,
            start_target: Some(BlockId {
                kind: block_id::Kind::WholeMessage as i32,
                height: 95_000_000,
            }),
            stop_policy: receive_blocks_request::StopPolicy::StopBeforeTarget as i32,
            stop_target: Some(BlockId {
                kind: block_id::Kind::WholeMessage as i32,
                height: 95_000_100,
            }),
            delivery_settings: Some(BlockStreamDeliverySettings {
                content: Some(BlockMessageDeliverySettings {
                    exclude_payload: true,
                }),
            }),
            catchup_policy: receive_blocks_request::CatchupPolicy::CatchupStream as i32,
            catchup_delivery_settings: Some(BlockStreamDeliverySettings {
                content: Some(BlockMessageDeliverySettings {
                    exclude_payload: false,
                }),
            }),
        };

        let bytes = request.encode_to_vec();
        let decoded = ReceiveBlocksRequest::decode(bytes.as_slice()).expect("decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn unknown_error_kind_decodes_to_unknown() {
        let error = StreamError {
            kind: 42,
            description: "from a newer server".to_string(),
        };
        let decoded =
            stream_error::Kind::try_from(error.kind).unwrap_or(stream_error::Kind::Unknown);
        assert_eq!(decoded, stream_error::Kind::Unknown);
    }
}
