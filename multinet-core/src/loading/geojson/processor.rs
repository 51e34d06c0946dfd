use std::path::Path;

use geo::Point;
use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry, Value as GeoJsonValue};
use log::{debug, info, warn};
use serde_json::Value;

use super::snapping::NodeSnapper;
use crate::algo::geometry::Position;
use crate::loading::config::{ConverterConfig, is_geographic};
use crate::loading::reader::NetworkReader;
use crate::model::{RawLink, RawNetwork, RawNode, RawNodeId, Tags};
use crate::{Error, NODE_SNAP_THRESHOLD};

/// Reads LineString and MultiLineString features into a raw network.
///
/// Every line part becomes one raw link named `{feature id}_{part}` whose
/// interior vertices are composed nodes. Vertices closer than the snapping
/// threshold are merged into one node. Other geometry types are ignored.
#[derive(Debug, Clone)]
pub struct GeoJsonReader {
    geographic: bool,
    threshold: f64,
}

impl GeoJsonReader {
    pub fn new(crs: &str) -> Self {
        Self {
            geographic: is_geographic(crs),
            threshold: NODE_SNAP_THRESHOLD,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(&config.input_crs)
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// # Errors
    ///
    /// Returns an error if the text is not valid GeoJSON or holds malformed
    /// positions
    pub fn read_str(&self, text: &str) -> Result<RawNetwork, Error> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| Error::GeoJsonError(e.to_string()))?;

        let features = match geojson {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        let mut builder = LineNetworkBuilder::new(NodeSnapper::new(self.geographic, self.threshold));
        for (idx, feature) in features.iter().enumerate() {
            builder.add_feature(idx, feature)?;
        }

        info!(
            "Read {} GeoJSON features into {} nodes and {} links",
            features.len(),
            builder.network.node_count(),
            builder.network.link_count()
        );
        Ok(builder.network)
    }
}

impl NetworkReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<RawNetwork, Error> {
        info!("Reading GeoJSON file: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path.display(), e),
            )
        })?;
        self.read_str(&text)
    }
}

struct LineNetworkBuilder {
    network: RawNetwork,
    snapper: NodeSnapper,
    handles: Vec<RawNodeId>,
}

impl LineNetworkBuilder {
    fn new(snapper: NodeSnapper) -> Self {
        Self {
            network: RawNetwork::new(),
            snapper,
            handles: Vec::new(),
        }
    }

    fn add_feature(&mut self, idx: usize, feature: &Feature) -> Result<(), Error> {
        let Some(geometry) = &feature.geometry else {
            debug!("Feature {idx} has no geometry");
            return Ok(());
        };
        let feature_id = match &feature.id {
            Some(Id::String(id)) => id.clone(),
            Some(Id::Number(id)) => id.to_string(),
            None => idx.to_string(),
        };
        let tags = feature_tags(feature);

        for (part, positions) in line_parts(geometry)?.into_iter().enumerate() {
            let link_id = format!("{feature_id}_{part}");
            if positions.len() < 2 {
                warn!("Skipping line {link_id} with fewer than two positions");
                continue;
            }

            let mut nodes = Vec::with_capacity(positions.len());
            for position in &positions {
                nodes.push(self.node_for(position)?);
            }

            let (Some(&from), Some(&to)) = (nodes.first(), nodes.last()) else {
                continue;
            };
            let mut link = RawLink::new(link_id, from, to);
            for &node in &nodes[1..nodes.len() - 1] {
                link.push_composed(node);
            }
            link.tags.clone_from(&tags);
            self.network.add_link(link)?;
        }
        Ok(())
    }

    fn node_for(&mut self, position: &[f64]) -> Result<RawNodeId, Error> {
        // Validates the coordinate count before snapping
        let node = RawNode::from_position(self.snapper.len().to_string(), position)?;
        let (idx, is_new) = self
            .snapper
            .snap(Position::new(Point::new(position[0], position[1]), node.elevation));
        if is_new {
            let handle = self.network.add_node(node);
            self.handles.push(handle);
        }
        self.handles
            .get(idx)
            .copied()
            .ok_or_else(|| Error::InvalidData(format!("Vertex {idx} was never registered")))
    }
}

/// Feature properties as tags. Nulls are skipped and non-string values are
/// kept in their JSON text form.
fn feature_tags(feature: &Feature) -> Tags {
    feature
        .properties
        .iter()
        .flatten()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key.clone(), text.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

/// Positions of each line part of `geometry`
fn line_parts(geometry: &Geometry) -> Result<Vec<Vec<Vec<f64>>>, Error> {
    let depth = match geometry.value {
        GeoJsonValue::LineString(_) => 1,
        GeoJsonValue::MultiLineString(_) => 2,
        _ => return Ok(Vec::new()),
    };

    let json = serde_json::to_value(geometry)?;
    let coordinates = json.get("coordinates").cloned().unwrap_or(Value::Null);
    if depth == 1 {
        Ok(vec![serde_json::from_value(coordinates)?])
    } else {
        Ok(serde_json::from_value(coordinates)?)
    }
}
