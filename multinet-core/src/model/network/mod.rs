//! Canonical, attribute-resolved network

pub mod components;
pub mod graph;

pub use components::{Link, Node};
pub use graph::{Network, NetworkGraph};
