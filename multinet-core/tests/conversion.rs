mod common;

use approx::assert_relative_eq;
use multinet_core::prelude::*;

use common::{LINKS, diamond_raw, planar_config};

#[test]
fn test_detailed_split_keeps_every_shape_point() {
    let network = convert_raw_network(diamond_raw(), &planar_config()).unwrap();
    assert_eq!(network.link_count(), 24);
    assert_eq!(network.node_count(), 21);

    for (id, from, to, _) in LINKS {
        let expected = [
            from.to_string(),
            format!("{id}0"),
            format!("{id}1"),
            to.to_string(),
        ];
        for (idx, pair) in expected.windows(2).enumerate() {
            let segment = network.link_index(&format!("{id}_{idx}")).unwrap();
            assert_eq!(
                network.endpoint_ids(segment),
                Some((pair[0].as_str(), pair[1].as_str()))
            );
        }
    }
}

#[test]
fn test_intersection_only_keeps_one_link_per_raw_link() {
    let mut config = planar_config();
    config.keep_detailed_link = false;
    let network = convert_raw_network(diamond_raw(), &config).unwrap();

    assert_eq!(network.link_count(), 8);
    assert_eq!(network.node_count(), 5);
    // straight line between the retained endpoints
    assert_relative_eq!(network.link("cn_0").unwrap().length, 300.0);
    assert_relative_eq!(
        network.link("ne_0").unwrap().length,
        300.0 * 2f64.sqrt(),
        epsilon = 1e-9
    );
}

#[test]
fn test_resolved_attributes() {
    let network = convert_raw_network(diamond_raw(), &planar_config()).unwrap();
    let link = network.link("ce_1").unwrap();

    // residential streets are car and bike, the catch-all is suppressed
    assert_eq!(link.modes_string(), "car,bike");
    assert_relative_eq!(link.length, 100.0);
    assert_relative_eq!(link.free_speed, 130.0 / 3.6);
    assert_relative_eq!(link.lanes, 2.0);
    assert_relative_eq!(link.lane_width, 3.5);
    assert_relative_eq!(link.capacity, 2.0 * 1000.0 + 130.0 / 3.6 * 20.0);
    assert_eq!(link.attributes["surface"], "asphalt");
    assert_eq!(link.attributes["lit"], "NA");
}

#[test]
fn test_tag_values_are_unit_converted() {
    let mut raw = RawNetwork::new();
    let a = raw.add_node(RawNode::new("a", 0.0, 0.0));
    let b = raw.add_node(RawNode::new("b", 50.0, 0.0));
    raw.add_link(RawLink::new("x", a, b).with_tags([
        ("highway", "primary"),
        ("speed", "72"),
        ("capacity", "1500"),
    ]))
    .unwrap();

    let mut config = planar_config();
    config.link_attributes.units = "MAX_SPEED_FIELD:km/h,LENGTH_FIELD:m".parse().unwrap();
    let network = convert_raw_network(raw, &config).unwrap();
    let link = network.link("x_0").unwrap();
    assert_relative_eq!(link.free_speed, 20.0);
    assert_relative_eq!(link.capacity, 1500.0);
}

#[test]
fn test_oneway_expansion_doubles_two_way_streets() {
    let mut config = planar_config();
    config.oneway = true;
    let network = convert_raw_network(diamond_raw(), &config).unwrap();
    assert_eq!(network.link_count(), 48);

    let reverse = network.link_index("cn_r_0").unwrap();
    assert_eq!(network.endpoint_ids(reverse), Some(("n", "cn1")));
}

#[test]
fn test_conversion_is_deterministic() {
    let mut config = planar_config();
    config.oneway = true;
    config.connectivity.strongly_connected = true;

    let first = convert_raw_network(diamond_raw(), &config).unwrap();
    let second = convert_raw_network(diamond_raw(), &config).unwrap();
    assert_eq!(
        NetworkDocument::from_network(&first, None),
        NetworkDocument::from_network(&second, None)
    );
}

#[test]
fn test_wildcard_rule_groups() {
    let tags = [("highway".to_string(), "residential".to_string())]
        .into_iter()
        .collect();
    let any_highway: RuleSet = "{highway=*}".parse().unwrap();
    let motorway: RuleSet = "{highway=motorway}".parse().unwrap();
    assert!(any_highway.matches(&tags));
    assert!(!motorway.matches(&tags));

    let classifier = ModeClassifier::from_config(&planar_config());
    assert_eq!(
        classifier.classify(&tags),
        classifier.classify(&tags),
        "classification is idempotent"
    );
}

#[test]
fn test_connectivity_during_conversion() {
    let mut config = planar_config();
    config.connectivity.strongly_connected = true;
    config.connectivity.modes = vec![Mode::Car, Mode::Bike];

    // spokes only leave the center, so they are cut off for bikes while
    // car links are retained
    let network = convert_raw_network(diamond_raw(), &config).unwrap();
    assert_eq!(network.link_count(), 24);
    assert_eq!(network.count_links_with_mode(Mode::Bike), 12);
    assert_eq!(network.count_links_with_mode(Mode::Car), 24);

    config.connectivity.retain_modes.clear();
    let network = convert_raw_network(diamond_raw(), &config).unwrap();
    assert_eq!(network.link_count(), 12);
    assert_eq!(network.node_count(), 12);
    assert!(network.node("c").is_none());
}

#[test]
fn test_unsupported_connectivity_strategy() {
    let mut config = planar_config();
    config.connectivity.strongly_connected = true;
    config.connectivity.method = ConnectivityStrategy::Insert;
    assert!(matches!(
        convert_raw_network(diamond_raw(), &config),
        Err(Error::UnsupportedStrategy(_))
    ));
}

#[test]
fn test_output_transform() {
    let mut config = planar_config();
    config.input_crs = "EPSG:4326".to_string();

    let mut raw = RawNetwork::new();
    let a = raw.add_node(RawNode::new("a", 0.0, 0.0));
    let b = raw.add_node(RawNode::new("b", 1.0, 0.0));
    raw.add_link(RawLink::new("x", a, b).with_tags([("highway", "primary")]))
        .unwrap();

    let network = convert_raw_network(raw, &config).unwrap();
    let link = network.link("x_0").unwrap();
    // haversine on the input, one degree at the equator
    assert_relative_eq!(link.length, 111_195.0, max_relative = 1e-3);
    let b = network.node("b").unwrap();
    assert_relative_eq!(b.geometry.x(), 111_319.49, max_relative = 1e-6);
    assert_relative_eq!(b.geometry.y(), 0.0, epsilon = 1e-6);

    config.output_crs = "EPSG:2154".to_string();
    assert!(matches!(
        convert_raw_network(RawNetwork::new(), &config),
        Err(Error::UnsupportedTransform { .. })
    ));
}
