pub use crate::{MIN_LINK_LENGTH, MISSING_ATTRIBUTE, NODE_SNAP_THRESHOLD};

// Re-export key components
pub use crate::algo::connectivity::{ConnectivityStrategy, NetworkCleaner};
pub use crate::algo::optimizer::{
    AttributeCombiner, DefaultAttributeCombiner, DefaultMergePolicy, LinkSimplifier,
    MergePolicy, NetworkOptimizer, OptimizedNetwork,
};
pub use crate::algo::transform::{CoordinateTransform, transform_for};
pub use crate::classification::{ModeClassifier, RuleGroup, RuleSet, TagCondition, ValuePattern};
pub use crate::export::{NetworkDocument, network_to_geojson, write_geojson, write_network};
pub use crate::loading::{
    ConnectivityConfig, ConverterConfig, FileType, GeoJsonReader, LinkAttrConfig, ModeConfig,
    NetworkReader, OptimizerConfig, OsmReader, convert_network, convert_raw_network,
    convert_with_reader,
};

// Core types for both network representations
pub use crate::model::{Link, Mode, ModeSet, Network, Node, RawLink, RawNetwork, RawNode, RawNodeId};
pub use crate::{Error, conversion::SplitPolicy};
