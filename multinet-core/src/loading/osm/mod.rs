//! OSM pbf processing

mod processor;

pub use processor::OsmReader;
