use std::path::Path;

use crate::Error;
use crate::model::RawNetwork;

/// Source of raw network elements
///
/// Implemented by the built-in OSM PBF and GeoJSON readers. Shapefile input
/// is supported by supplying an implementation to
/// [`convert_with_reader`](super::convert_with_reader).
pub trait NetworkReader {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded
    fn read(&self, path: &Path) -> Result<RawNetwork, Error>;
}
