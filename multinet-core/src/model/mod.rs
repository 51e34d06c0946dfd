//! Data model for network conversion
//!
//! Contains the raw graph produced by readers and the canonical,
//! attribute-resolved network produced by the converter.

pub mod mode;
pub mod network;
pub mod raw;

pub use mode::{Mode, ModeSet, modes_to_string, parse_mode_list};
pub use network::{Link, Network, NetworkGraph, Node};
pub use raw::{RawLink, RawNetwork, RawNode, RawNodeId, Tags};
