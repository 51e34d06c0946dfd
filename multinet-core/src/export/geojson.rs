use std::path::Path;

use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Map, Value, json};

use crate::Error;
use crate::model::Network;

/// One LineString feature per link, ordered by link id
///
/// # Errors
///
/// Returns [`Error::EmptyNetwork`] when the network has no links
pub fn network_to_geojson(network: &Network) -> Result<FeatureCollection, Error> {
    if network.link_count() == 0 {
        return Err(Error::EmptyNetwork(
            "GeoJSON export needs at least one link".to_string(),
        ));
    }

    let mut links: Vec<_> = network.links().collect();
    links.sort_by(|(_, a), (_, b)| a.id.cmp(&b.id));

    let mut features = Vec::with_capacity(links.len());
    for (idx, link) in links {
        let (Some((from, to)), Some((from_id, to_id))) =
            (network.endpoints(idx), network.endpoint_ids(idx))
        else {
            continue;
        };
        let (Some(start), Some(end)) = (network.node_at(from), network.node_at(to)) else {
            continue;
        };
        let line = LineString::new(vec![
            Coord::from(start.geometry),
            Coord::from(end.geometry),
        ]);
        let geometry = Geometry::new(GeoJsonValue::from(&line));

        let mut properties = Map::new();
        for (key, value) in &link.attributes {
            properties.insert(key.clone(), Value::String(value.clone()));
        }
        properties.insert("id".into(), json!(link.id));
        properties.insert("from".into(), json!(from_id));
        properties.insert("to".into(), json!(to_id));
        properties.insert("capacity".into(), json!(link.capacity));
        properties.insert("freespeed".into(), json!(link.free_speed));
        properties.insert("length".into(), json!(link.length));
        properties.insert("lanes".into(), json!(link.lanes));
        properties.insert("lane_width".into(), json!(link.lane_width));
        properties.insert("modes".into(), json!(link.modes_string()));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": properties,
        });
        features.push(Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))?);
    }

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

/// Writes the GeoJSON rendition of `network` to `path`
///
/// # Errors
///
/// Returns an error for empty networks or when writing fails
pub fn write_geojson(network: &Network, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let collection = network_to_geojson(network)?;
    log::info!(
        "Writing {} GeoJSON features to {}",
        collection.features.len(),
        path.display()
    );
    let text = serde_json::to_string(&collection).map_err(|e| Error::GeoJsonError(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}
