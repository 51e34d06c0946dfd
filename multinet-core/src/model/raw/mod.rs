//! Raw graph produced by network readers

pub mod components;
pub mod network;

pub use components::{RawLink, RawNode, RawNodeId, Tags};
pub use network::RawNetwork;
