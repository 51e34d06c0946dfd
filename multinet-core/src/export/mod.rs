//! Network export: canonical JSON documents and GeoJSON

mod geojson;
mod json;

pub use self::geojson::{network_to_geojson, write_geojson};
pub use json::{LinkRecord, NetworkDocument, NodeRecord, read_network, write_network};
