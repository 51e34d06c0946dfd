//! This module is responsible for reading source networks (OSM, GeoJSON)
//! and converting them into the canonical mode-aware network.

mod builder;
mod config;
pub mod geojson;
pub mod osm;
mod reader;

pub use builder::{convert_network, convert_raw_network, convert_with_reader};
pub use config::{
    ConnectivityConfig, ConverterConfig, FileType, LinkAttrConfig, ModeConfig, OptimizerConfig,
    is_geographic,
};
pub use self::geojson::GeoJsonReader;
pub use osm::OsmReader;
pub use reader::NetworkReader;
