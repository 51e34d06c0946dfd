//! Conversion of heterogeneous road and transit data into a single
//! mode-aware network graph.
//!
//! The pipeline runs strictly downstream:
//! readers → [`RawNetwork`] → converter → [`Network`] → optimizer → cleaner.

pub mod algo;
pub mod classification;
pub mod conversion;
pub mod error;
pub mod export;
pub mod loading;
pub mod model;
pub mod prelude;

pub use error::Error;

pub use algo::connectivity::{ConnectivityStrategy, NetworkCleaner};
pub use algo::optimizer::{NetworkOptimizer, OptimizedNetwork};
pub use classification::{ModeClassifier, RuleSet};
pub use loading::{ConverterConfig, convert_network, convert_raw_network};
pub use model::{Link, Mode, ModeSet, Network, Node, RawLink, RawNetwork, RawNode};

/// Threshold in meters below which two GIS vertices are treated as one node
pub const NODE_SNAP_THRESHOLD: f64 = 0.05;

/// Lower bound for every link length in the canonical network
pub const MIN_LINK_LENGTH: f64 = 1.0;

/// Placeholder written for reserved fields missing on a link
pub const MISSING_ATTRIBUTE: &str = "NA";
