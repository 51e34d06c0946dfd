//! Coordinate system transforms applied to finished networks

use std::fmt::Debug;

use geo::Point;

use crate::Error;
use crate::loading::is_geographic;
use crate::model::Network;

/// Half the equatorial circumference in EPSG:3857 meters
const MERCATOR_MAX: f64 = 20_037_508.342_789_244;
/// Latitude bound of the Web Mercator square
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Maps points from one coordinate system into another
pub trait CoordinateTransform: Debug + Send + Sync {
    fn transform(&self, point: Point<f64>) -> Point<f64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl CoordinateTransform for Identity {
    fn transform(&self, point: Point<f64>) -> Point<f64> {
        point
    }
}

/// EPSG:4326 longitude/latitude to EPSG:3857 meters
#[derive(Debug, Clone, Copy, Default)]
pub struct WgsToWebMercator;

impl CoordinateTransform for WgsToWebMercator {
    fn transform(&self, point: Point<f64>) -> Point<f64> {
        let lat = point.y().clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = point.x() * MERCATOR_MAX / 180.0;
        let y = (lat.tan() + 1.0 / lat.cos()).ln() * MERCATOR_MAX / std::f64::consts::PI;
        Point::new(x, y)
    }
}

/// EPSG:3857 meters to EPSG:4326 longitude/latitude
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorToWgs;

impl CoordinateTransform for WebMercatorToWgs {
    fn transform(&self, point: Point<f64>) -> Point<f64> {
        let lon = point.x() * 180.0 / MERCATOR_MAX;
        let lat = (std::f64::consts::FRAC_PI_2
            - 2.0 * (-point.y() * std::f64::consts::PI / MERCATOR_MAX).exp().atan())
        .to_degrees();
        Point::new(lon, lat)
    }
}

fn is_web_mercator(crs: &str) -> bool {
    matches!(
        crs.trim().to_ascii_uppercase().as_str(),
        "EPSG:3857" | "EPSG:900913" | "EPSG:3785"
    )
}

/// Picks the built-in transform between two CRS codes
///
/// # Errors
///
/// Returns [`Error::UnsupportedTransform`] for pairs other than identical
/// codes and EPSG:4326 ↔ EPSG:3857
pub fn transform_for(from: &str, to: &str) -> Result<Box<dyn CoordinateTransform>, Error> {
    let same = from.trim().eq_ignore_ascii_case(to.trim())
        || (is_geographic(from) && is_geographic(to))
        || (is_web_mercator(from) && is_web_mercator(to));
    if same {
        return Ok(Box::new(Identity));
    }
    if is_geographic(from) && is_web_mercator(to) {
        return Ok(Box::new(WgsToWebMercator));
    }
    if is_web_mercator(from) && is_geographic(to) {
        return Ok(Box::new(WebMercatorToWgs));
    }
    Err(Error::UnsupportedTransform {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// Moves every node of `network` through `transform`
pub fn transform_network(network: &mut Network, transform: &dyn CoordinateTransform) {
    for idx in network.node_indices() {
        if let Some(node) = network.node_at_mut(idx) {
            node.geometry = transform.transform(node.geometry);
        }
    }
}
