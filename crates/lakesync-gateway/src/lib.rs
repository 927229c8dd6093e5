//! # lakesync-gateway
//!
//! The stateful gateway: owns the HLC and delta buffer, admits pushes under
//! drift/quota/backpressure contracts, serves claim-filtered pulls, and
//! moves buffered deltas to a backing adapter through the flush pipeline.
//! Gateways are independent; the registry shards them by identifier.

pub mod adapter;
mod flush;
mod gateway;
pub mod persist;
mod registry;
mod transport;

pub use flush::{FlushPipeline, FlushTarget};
pub use gateway::{Gateway, GatewayState};
pub use registry::GatewayRegistry;
pub use transport::LoopbackTransport;
