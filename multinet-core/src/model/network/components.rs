//! Canonical network components - nodes and resolved links

use std::collections::BTreeMap;

use geo::Point;

use crate::model::{Mode, ModeSet, modes_to_string};

/// Network node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub geometry: Point<f64>,
    pub elevation: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            geometry: Point::new(x, y),
            elevation: None,
        }
    }
}

/// Directed network link with resolved attributes.
///
/// Lengths are in meters and speeds in meters per second.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: String,
    pub length: f64,
    pub free_speed: f64,
    /// Vehicles per hour
    pub capacity: f64,
    pub lanes: f64,
    pub lane_width: f64,
    pub modes: ModeSet,
    /// Reserved source attributes carried to the output
    pub attributes: BTreeMap<String, String>,
}

impl Link {
    pub fn allows(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn allows_any(&self, modes: &[Mode]) -> bool {
        modes.iter().any(|mode| self.modes.contains(mode))
    }

    pub fn modes_string(&self) -> String {
        modes_to_string(&self.modes)
    }

    /// Free flow travel time in seconds
    pub fn travel_time(&self) -> f64 {
        self.length / self.free_speed
    }
}
