//! Vertex deduplication for GIS inputs.
//!
//! Candidates are found with a planar radius query on an R-tree, then
//! confirmed with the same distance the converter uses for link lengths
//! (haversine for geographic coordinates, elevation-aware when both
//! vertices carry a Z value).

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::algo::geometry::{Position, distance};

/// Mean earth radius used by `geo::Haversine`
const EARTH_RADIUS: f64 = 6_371_008.8;

/// The R-tree query runs in degrees on a sphere approximation; pad it so
/// the exact haversine check never loses a candidate at the boundary.
const RADIUS_PADDING: f64 = 1.01;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

pub(crate) struct NodeSnapper {
    tree: RTree<IndexedPoint>,
    positions: Vec<Position>,
    geographic: bool,
    threshold: f64,
}

impl NodeSnapper {
    pub(crate) fn new(geographic: bool, threshold: f64) -> Self {
        Self {
            tree: RTree::new(),
            positions: Vec::new(),
            geographic,
            threshold,
        }
    }

    /// Index of the closest known vertex within the threshold, or of a
    /// newly registered one. The flag is `true` for new vertices.
    pub(crate) fn snap(&mut self, position: Position) -> (usize, bool) {
        let query = [position.point.x(), position.point.y()];
        let radius = self.search_radius(position.point.y());

        let existing = self
            .tree
            .locate_within_distance(query, radius * radius)
            .map(|candidate| {
                let idx = candidate.data;
                (idx, distance(self.positions[idx], position, self.geographic))
            })
            .filter(|(_, meters)| *meters < self.threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        if let Some((idx, _)) = existing {
            return (idx, false);
        }

        let idx = self.positions.len();
        self.positions.push(position);
        self.tree.insert(GeomWithData::new(query, idx));
        (idx, true)
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }

    /// Query radius in coordinate units. Degrees of longitude shrink
    /// towards the poles, so the radius is widened accordingly.
    fn search_radius(&self, latitude: f64) -> f64 {
        if self.geographic {
            let shrink = latitude.to_radians().cos().abs().max(1e-6);
            (self.threshold / EARTH_RADIUS).to_degrees() * RADIUS_PADDING / shrink
        } else {
            self.threshold
        }
    }
}
