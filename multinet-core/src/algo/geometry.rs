//! Distance and interpolation helpers shared by the converter and optimizer

use geo::{Distance, Euclidean, Haversine, Point};

/// Point with an optional elevation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub point: Point<f64>,
    pub elevation: Option<f64>,
}

impl Position {
    pub fn new(point: Point<f64>, elevation: Option<f64>) -> Self {
        Self { point, elevation }
    }
}

/// Distance in meters between two positions.
///
/// The horizontal part is haversine for geographic coordinates and planar
/// otherwise. When both positions carry an elevation the vertical
/// difference is folded in.
pub fn distance(a: Position, b: Position, geographic: bool) -> f64 {
    let horizontal = if geographic {
        Haversine.distance(a.point, b.point)
    } else {
        Euclidean.distance(a.point, b.point)
    };
    match (a.elevation, b.elevation) {
        (Some(za), Some(zb)) => (horizontal * horizontal + (za - zb).powi(2)).sqrt(),
        _ => horizontal,
    }
}

/// Linear interpolation at fraction `t` of the way from `a` to `b`
pub fn interpolate(a: Position, b: Position, t: f64) -> Position {
    let point = Point::new(
        a.point.x() + (b.point.x() - a.point.x()) * t,
        a.point.y() + (b.point.y() - a.point.y()) * t,
    );
    let elevation = match (a.elevation, b.elevation) {
        (Some(za), Some(zb)) => Some(za + (zb - za) * t),
        _ => None,
    };
    Position { point, elevation }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_planar_and_elevation() {
        let a = Position::new(Point::new(0.0, 0.0), None);
        let b = Position::new(Point::new(3.0, 4.0), None);
        assert_relative_eq!(distance(a, b, false), 5.0);

        let a = Position::new(Point::new(0.0, 0.0), Some(0.0));
        let b = Position::new(Point::new(3.0, 0.0), Some(4.0));
        assert_relative_eq!(distance(a, b, false), 5.0);
    }

    #[test]
    fn test_haversine_degree() {
        let a = Position::new(Point::new(0.0, 0.0), None);
        let b = Position::new(Point::new(0.0, 1.0), None);
        // One degree of latitude on the mean earth radius
        assert_relative_eq!(distance(a, b, true), 111_195.0, epsilon = 1.0);
    }

    #[test]
    fn test_interpolate() {
        let a = Position::new(Point::new(0.0, 0.0), Some(10.0));
        let b = Position::new(Point::new(10.0, 20.0), Some(20.0));
        let mid = interpolate(a, b, 0.5);
        assert_relative_eq!(mid.point.x(), 5.0);
        assert_relative_eq!(mid.point.y(), 10.0);
        assert_eq!(mid.elevation, Some(15.0));

        let flat = interpolate(Position::new(a.point, None), b, 0.25);
        assert_eq!(flat.elevation, None);
    }
}
