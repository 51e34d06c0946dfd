//! Splitting raw polylines into straight segments

use hashbrown::HashMap;

use crate::model::{RawLink, RawNodeId};

/// Where a raw link is cut into canonical segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    /// One segment per consecutive node pair
    #[default]
    Detailed,
    /// Cut only at interior nodes shared with another raw link
    IntersectionOnly,
}

/// Splits `link` into segments named `{id}_{idx}`.
///
/// Segments keep the tags and modes of `link` and have no interior nodes.
/// `reference_counts` holds, per node, the number of raw links touching it
/// and is only consulted for [`SplitPolicy::IntersectionOnly`].
pub fn split_link(
    link: &RawLink,
    policy: SplitPolicy,
    reference_counts: &HashMap<RawNodeId, usize>,
) -> Vec<RawLink> {
    let mut cuts = Vec::with_capacity(link.composed.len() + 2);
    cuts.push(link.from);
    match policy {
        SplitPolicy::Detailed => cuts.extend_from_slice(&link.composed),
        SplitPolicy::IntersectionOnly => cuts.extend(
            link.composed
                .iter()
                .copied()
                .filter(|node| reference_counts.get(node).copied().unwrap_or(0) > 1),
        ),
    }
    cuts.push(link.to);

    cuts.windows(2)
        .enumerate()
        .map(|(idx, pair)| RawLink {
            id: format!("{}_{idx}", link.id),
            from: pair[0],
            to: pair[1],
            composed: Vec::new(),
            modes: link.modes.clone(),
            tags: link.tags.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, RawNetwork, RawNode};

    fn network_with_junction() -> (RawNetwork, RawLink) {
        let mut network = RawNetwork::new();
        let ids: Vec<_> = (0..5)
            .map(|i| network.add_node(RawNode::new(format!("n{i}"), f64::from(i), 0.0)))
            .collect();
        let mut main = RawLink::new("main", ids[0], ids[4]).with_tags([("highway", "primary")]);
        for &id in &ids[1..4] {
            main.push_composed(id);
        }
        main.modes.insert(Mode::Car);
        network.add_link(main.clone()).unwrap();

        let spur_end = network.add_node(RawNode::new("spur", 2.0, 1.0));
        network
            .add_link(RawLink::new("spur", ids[2], spur_end))
            .unwrap();
        (network, main)
    }

    #[test]
    fn test_detailed_split() {
        let (network, main) = network_with_junction();
        let segments = split_link(&main, SplitPolicy::Detailed, &network.reference_counts());

        assert_eq!(segments.len(), main.composed.len() + 1);
        let ids: Vec<_> = segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["main_0", "main_1", "main_2", "main_3"]);

        let mut rebuilt = vec![segments[0].from];
        rebuilt.extend(segments.iter().map(|s| s.to));
        assert_eq!(rebuilt, main.node_sequence());
        assert!(segments.iter().all(|s| s.modes == main.modes && s.tags == main.tags));
    }

    #[test]
    fn test_intersection_split() {
        let (network, main) = network_with_junction();
        let segments = split_link(
            &main,
            SplitPolicy::IntersectionOnly,
            &network.reference_counts(),
        );

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].from, main.from);
        assert_eq!(segments[0].to, main.composed[1]);
        assert_eq!(segments[1].from, main.composed[1]);
        assert_eq!(segments[1].to, main.to);
    }

    #[test]
    fn test_link_without_interior_nodes() {
        let (network, _) = network_with_junction();
        let spur = network.link("spur").unwrap();
        for policy in [SplitPolicy::Detailed, SplitPolicy::IntersectionOnly] {
            let segments = split_link(spur, policy, &network.reference_counts());
            assert_eq!(segments.len(), 1);
            assert_eq!(segments[0].id, "spur_0");
        }
    }
}
