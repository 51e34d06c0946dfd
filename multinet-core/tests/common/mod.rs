//! Shared fixture: a diamond of four spokes and four rim arcs.
//!
//! Five endpoint nodes (center plus N/E/S/W at 300 m) and eight raw links,
//! each with two interior shape points, sixteen in total. Coordinates are
//! planar meters. No interior point is shared between links.

#![allow(dead_code)]

use multinet_core::prelude::*;

pub const ENDPOINTS: [(&str, [f64; 2]); 5] = [
    ("c", [0.0, 0.0]),
    ("n", [0.0, 300.0]),
    ("e", [300.0, 0.0]),
    ("s", [0.0, -300.0]),
    ("w", [-300.0, 0.0]),
];

/// (link id, from, to, interior points)
pub const LINKS: [(&str, &str, &str, [[f64; 2]; 2]); 8] = [
    ("cn", "c", "n", [[0.0, 100.0], [0.0, 200.0]]),
    ("ce", "c", "e", [[100.0, 0.0], [200.0, 0.0]]),
    ("cs", "c", "s", [[0.0, -100.0], [0.0, -200.0]]),
    ("cw", "c", "w", [[-100.0, 0.0], [-200.0, 0.0]]),
    ("ne", "n", "e", [[100.0, 200.0], [200.0, 100.0]]),
    ("es", "e", "s", [[200.0, -100.0], [100.0, -200.0]]),
    ("sw", "s", "w", [[-100.0, -200.0], [-200.0, -100.0]]),
    ("wn", "w", "n", [[-200.0, 100.0], [-100.0, 200.0]]),
];

fn position(id: &str) -> [f64; 2] {
    ENDPOINTS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, p)| *p)
        .unwrap()
}

pub fn diamond_raw() -> RawNetwork {
    let mut raw = RawNetwork::new();
    let handles: Vec<_> = ENDPOINTS
        .iter()
        .map(|(id, [x, y])| raw.add_node(RawNode::new(*id, *x, *y)))
        .collect();
    let handle = |id: &str| handles[ENDPOINTS.iter().position(|(name, _)| *name == id).unwrap()];

    for (id, from, to, interior) in LINKS {
        let mut link = RawLink::new(id, handle(from), handle(to))
            .with_tags([("highway", "residential"), ("surface", "asphalt")]);
        for (idx, [x, y]) in interior.iter().enumerate() {
            let node = raw.add_node(RawNode::new(format!("{id}{idx}"), *x, *y));
            link.push_composed(node);
        }
        raw.add_link(link).unwrap();
    }
    raw
}

/// The same diamond as a GeoJSON feature collection
pub fn diamond_geojson() -> String {
    let features: Vec<String> = LINKS
        .iter()
        .map(|(id, from, to, interior)| {
            let coordinates = [position(from), interior[0], interior[1], position(to)]
                .iter()
                .map(|[x, y]| format!("[{x:.1}, {y:.1}]"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                r#"{{"type": "Feature", "id": "{id}", "properties": {{"highway": "residential", "surface": "asphalt"}}, "geometry": {{"type": "LineString", "coordinates": [{coordinates}]}}}}"#
            )
        })
        .collect();
    format!(
        r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
        features.join(", ")
    )
}

/// Planar input, no oneway expansion, no connectivity cleaning
pub fn planar_config() -> ConverterConfig {
    let mut config = ConverterConfig::default();
    config.file_type = FileType::GeoJson;
    config.input_crs = "EPSG:3857".to_string();
    config.output_crs = "EPSG:3857".to_string();
    config.connectivity.strongly_connected = false;
    config
}
