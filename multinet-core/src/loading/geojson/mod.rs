//! GeoJSON line network reader

mod processor;
mod snapping;

pub use processor::GeoJsonReader;
