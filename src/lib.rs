//! Client SDK and consumer runtime for the blocks provider streaming API.
//!
//! The crate is organized by concern:
//! - `stream`: request policy building, gRPC transport, and the receive
//!   session that consumes one long-lived `ReceiveBlocks` call.
//! - `shutdown`: process signal handling mapped onto a cancellation token.

/// Signal handling and cooperative cancellation.
pub mod shutdown;
/// Block stream client, policy model, wire types, and session helpers.
pub mod stream;
