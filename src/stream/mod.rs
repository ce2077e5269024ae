//! Block stream modules.
//!
//! - `client`: gRPC channel setup, authorization metadata, and the receive
//!   handle for one `ReceiveBlocks` call.
//! - `policy`: start/stop/catchup policy resolution into a stream request.
//! - `proto`: wire types for the blocks provider service.
//! - `session`: receive loop, response dispatch, and run outcome reporting.
//! - `speed`: sliding-window delivery speed accounting.

/// gRPC connection and receive-stream handle.
pub mod client;
/// Request policy model and builder.
pub mod policy;
/// Blocks provider wire types.
pub mod proto;
/// Session wrapper that drives the receive loop.
pub mod session;
/// Delivery speed accounting.
pub mod speed;
