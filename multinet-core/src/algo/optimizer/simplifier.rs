//! Pluggable merging of short links across pass-through nodes

use std::collections::BTreeSet;

use hashbrown::HashSet;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::Error;
use crate::model::{Link, Network};

/// Marks attribute values that differed between two merged links
pub const DIVERGENCE_SEPARATOR: &str = "|";

/// Decides whether two consecutive links may become one
pub trait MergePolicy {
    fn can_merge(&self, first: &Link, second: &Link) -> bool;
}

/// Builds the link replacing two consecutive links
pub trait AttributeCombiner {
    fn combine(&self, first: &Link, second: &Link) -> Link;
}

/// Merges when either link is at most `min_length` long and one mode set
/// contains the other
#[derive(Debug, Clone, Copy)]
pub struct DefaultMergePolicy {
    pub min_length: f64,
}

impl MergePolicy for DefaultMergePolicy {
    fn can_merge(&self, first: &Link, second: &Link) -> bool {
        let short = first.length <= self.min_length || second.length <= self.min_length;
        let nested =
            first.modes.is_subset(&second.modes) || second.modes.is_subset(&first.modes);
        short && nested
    }
}

/// Superset of modes, summed length, travel time preserving speed and the
/// tighter of capacity, lanes and lane width. Attributes that disagree are
/// kept side by side joined with [`DIVERGENCE_SEPARATOR`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAttributeCombiner;

impl AttributeCombiner for DefaultAttributeCombiner {
    fn combine(&self, first: &Link, second: &Link) -> Link {
        let length = first.length + second.length;
        let travel_time = first.travel_time() + second.travel_time();
        let free_speed = if travel_time > 0.0 && travel_time.is_finite() {
            length / travel_time
        } else {
            first.free_speed.min(second.free_speed)
        };

        let mut attributes = first.attributes.clone();
        for (key, value) in &second.attributes {
            match attributes.get_mut(key) {
                Some(existing) if existing != value => {
                    *existing = format!("{existing}{DIVERGENCE_SEPARATOR}{value}");
                }
                Some(_) => {}
                None => {
                    attributes.insert(key.clone(), value.clone());
                }
            }
        }

        Link {
            id: format!("merged_{}_{}", first.id, second.id),
            length,
            free_speed,
            capacity: first.capacity.min(second.capacity),
            lanes: first.lanes.min(second.lanes),
            lane_width: first.lane_width.min(second.lane_width),
            modes: first.modes.union(&second.modes).copied().collect(),
            attributes,
        }
    }
}

/// Two consecutive links `a -> via -> b`
#[derive(Debug, Clone, Copy)]
struct Candidate {
    first: EdgeIndex,
    second: EdgeIndex,
    via: NodeIndex,
    /// Length of the neighbour the short link would absorb
    partner_length: f64,
}

/// Merges short links with a neighbour through a pass-through node.
///
/// A node is passed through in one direction when its only neighbours are
/// the two outer endpoints and the merged pair is its only in/out link in
/// that direction, so no other route loses access to it.
#[derive(Debug, Clone)]
pub struct LinkSimplifier<P = DefaultMergePolicy, C = DefaultAttributeCombiner> {
    policy: P,
    combiner: C,
}

impl<P: MergePolicy, C: AttributeCombiner> LinkSimplifier<P, C> {
    pub fn new(policy: P, combiner: C) -> Self {
        Self { policy, combiner }
    }

    /// One merge pass over links shorter than `min_length`, ordered by id.
    ///
    /// Links without a mergeable neighbour are added to `skipped` and not
    /// considered again. Returns the number of merges.
    ///
    /// # Errors
    ///
    /// Returns an error if a merged link cannot be inserted
    pub fn merge_short_links(
        &self,
        network: &mut Network,
        min_length: f64,
        skipped: &mut BTreeSet<String>,
    ) -> Result<usize, Error> {
        let mut short: Vec<(String, EdgeIndex)> = network
            .links()
            .filter(|(_, link)| link.length < min_length && !skipped.contains(&link.id))
            .map(|(idx, link)| (link.id.clone(), idx))
            .collect();
        short.sort();

        let mut merged = 0;
        for (id, idx) in short {
            if network.link_at(idx).is_none_or(|link| link.id != id) {
                // Absorbed by an earlier merge in this pass
                continue;
            }
            let Some(candidate) = self.best_candidate(network, idx) else {
                log::warn!("No mergeable neighbour for short link {id}, leaving it as is");
                skipped.insert(id);
                continue;
            };
            self.merge(network, candidate)?;
            merged += 1;
        }
        Ok(merged)
    }

    fn best_candidate(&self, network: &Network, idx: EdgeIndex) -> Option<Candidate> {
        let (from, to) = network.endpoints(idx)?;
        let upstream = network
            .in_links(from)
            .into_iter()
            .filter_map(|incoming| pass_through(network, incoming, idx, from));
        let downstream = network
            .out_links(to)
            .into_iter()
            .filter_map(|outgoing| pass_through(network, idx, outgoing, to));

        upstream
            .chain(downstream)
            .filter(|candidate| {
                match (network.link_at(candidate.first), network.link_at(candidate.second)) {
                    (Some(first), Some(second)) => self.policy.can_merge(first, second),
                    _ => false,
                }
            })
            .min_by(|a, b| a.partner_length.total_cmp(&b.partner_length))
    }

    fn merge(&self, network: &mut Network, candidate: Candidate) -> Result<(), Error> {
        let (Some((start, _)), Some((_, end))) = (
            network.endpoints(candidate.first),
            network.endpoints(candidate.second),
        ) else {
            return Ok(());
        };
        let (Some(first), Some(second)) = (
            network.link_at(candidate.first),
            network.link_at(candidate.second),
        ) else {
            return Ok(());
        };
        let merged = self.combiner.combine(first, second);
        log::debug!("Merging {} and {} into {}", first.id, second.id, merged.id);

        network.remove_link_at(candidate.first);
        network.remove_link_at(candidate.second);
        network.add_link(start, end, merged)?;
        if network.degree(candidate.via) == 0 {
            network.remove_node_at(candidate.via);
        }
        Ok(())
    }
}

/// Checks that `first` (a -> via) and `second` (via -> b) can be joined at
/// `via` without cutting off any other movement through it
fn pass_through(
    network: &Network,
    first: EdgeIndex,
    second: EdgeIndex,
    via: NodeIndex,
) -> Option<Candidate> {
    if first == second {
        return None;
    }
    let (a, first_to) = network.endpoints(first)?;
    let (second_from, b) = network.endpoints(second)?;
    if first_to != via || second_from != via || a == via || b == via || a == b {
        return None;
    }

    let expected: HashSet<NodeIndex> = [a, b].into_iter().collect();
    if network.neighbors(via) != expected {
        return None;
    }

    let forward_in: Vec<EdgeIndex> = network
        .in_links(via)
        .into_iter()
        .filter(|&edge| network.endpoints(edge).is_some_and(|(source, _)| source != b))
        .collect();
    let forward_out: Vec<EdgeIndex> = network
        .out_links(via)
        .into_iter()
        .filter(|&edge| network.endpoints(edge).is_some_and(|(_, target)| target != a))
        .collect();
    if forward_in != [first] || forward_out != [second] {
        return None;
    }

    let first_link = network.link_at(first)?;
    let second_link = network.link_at(second)?;
    let partner_length = first_link.length.max(second_link.length);
    Some(Candidate {
        first,
        second,
        via,
        partner_length,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{Mode, Node};

    fn link(id: &str, length: f64, modes: &[Mode], surface: &str) -> Link {
        Link {
            id: id.to_string(),
            length,
            free_speed: 10.0,
            capacity: 1000.0,
            lanes: 1.0,
            lane_width: 3.5,
            modes: modes.iter().copied().collect(),
            attributes: BTreeMap::from([("surface".to_string(), surface.to_string())]),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = DefaultMergePolicy { min_length: 10.0 };
        let short_car = link("a", 5.0, &[Mode::Car], "x");
        let long_multi = link("b", 50.0, &[Mode::Car, Mode::Bike], "x");
        let long_walk = link("c", 50.0, &[Mode::Walk], "x");
        let long_car = link("d", 50.0, &[Mode::Car], "x");

        assert!(policy.can_merge(&short_car, &long_multi));
        assert!(policy.can_merge(&long_multi, &short_car));
        assert!(!policy.can_merge(&short_car, &long_walk));
        assert!(!policy.can_merge(&long_car, &long_multi));
    }

    #[test]
    fn test_default_combiner() {
        let mut first = link("a", 10.0, &[Mode::Car], "asphalt");
        first.free_speed = 5.0;
        first.attributes.insert("lit".into(), "yes".into());
        let mut second = link("b", 30.0, &[Mode::Car, Mode::Bike], "gravel");
        second.free_speed = 15.0;
        second.capacity = 600.0;
        second.attributes.insert("lit".into(), "yes".into());
        second.attributes.insert("name".into(), "Main".into());

        let merged = DefaultAttributeCombiner.combine(&first, &second);
        assert_eq!(merged.id, "merged_a_b");
        assert_eq!(merged.length, 40.0);
        // 10 m at 5 m/s plus 30 m at 15 m/s is 4 s
        assert!((merged.free_speed - 10.0).abs() < 1e-12);
        assert_eq!(merged.capacity, 600.0);
        assert_eq!(merged.modes, [Mode::Car, Mode::Bike].into_iter().collect());
        assert_eq!(merged.attributes["surface"], "asphalt|gravel");
        assert_eq!(merged.attributes["lit"], "yes");
        assert_eq!(merged.attributes["name"], "Main");
    }

    #[test]
    fn test_merge_through_pass_through_node() {
        let mut network = Network::new();
        for (id, x) in [("a", 0.0), ("m", 1.0), ("b", 2.0)] {
            network.add_node(Node::new(id, x, 0.0));
        }
        network.add_link_between("a", "m", link("am", 50.0, &[Mode::Car], "x")).unwrap();
        network.add_link_between("m", "b", link("mb", 4.0, &[Mode::Car], "x")).unwrap();

        let simplifier = LinkSimplifier::new(DefaultMergePolicy { min_length: 10.0 }, DefaultAttributeCombiner);
        let mut skipped = BTreeSet::new();
        let merged = simplifier
            .merge_short_links(&mut network, 10.0, &mut skipped)
            .unwrap();

        assert_eq!(merged, 1);
        assert!(skipped.is_empty());
        assert_eq!(network.link_count(), 1);
        assert_eq!(network.link("merged_am_mb").unwrap().length, 54.0);
        assert!(network.node("m").is_none());
    }

    #[test]
    fn test_junction_is_not_merged_through() {
        let mut network = Network::new();
        for (id, x, y) in [("a", 0.0, 0.0), ("m", 1.0, 0.0), ("b", 2.0, 0.0), ("c", 1.0, 1.0)] {
            network.add_node(Node::new(id, x, y));
        }
        network.add_link_between("a", "m", link("am", 50.0, &[Mode::Car], "x")).unwrap();
        network.add_link_between("m", "b", link("mb", 4.0, &[Mode::Car], "x")).unwrap();
        network.add_link_between("m", "c", link("mc", 50.0, &[Mode::Car], "x")).unwrap();

        let simplifier = LinkSimplifier::new(DefaultMergePolicy { min_length: 10.0 }, DefaultAttributeCombiner);
        let mut skipped = BTreeSet::new();
        let merged = simplifier
            .merge_short_links(&mut network, 10.0, &mut skipped)
            .unwrap();

        assert_eq!(merged, 0);
        assert!(skipped.contains("mb"));
        assert_eq!(network.link_count(), 3);
    }

    #[test]
    fn test_two_way_street_merges_per_direction() {
        let mut network = Network::new();
        for (id, x) in [("a", 0.0), ("m", 1.0), ("b", 2.0)] {
            network.add_node(Node::new(id, x, 0.0));
        }
        network.add_link_between("a", "m", link("am", 50.0, &[Mode::Car], "x")).unwrap();
        network.add_link_between("m", "b", link("mb", 4.0, &[Mode::Car], "x")).unwrap();
        network.add_link_between("b", "m", link("bm", 4.0, &[Mode::Car], "x")).unwrap();
        network.add_link_between("m", "a", link("ma", 50.0, &[Mode::Car], "x")).unwrap();

        let simplifier = LinkSimplifier::new(DefaultMergePolicy { min_length: 10.0 }, DefaultAttributeCombiner);
        let mut skipped = BTreeSet::new();
        simplifier
            .merge_short_links(&mut network, 10.0, &mut skipped)
            .unwrap();

        assert_eq!(network.link_count(), 2);
        assert!(network.link("merged_am_mb").is_some());
        assert!(network.link("merged_bm_ma").is_some());
        assert_eq!(network.node_count(), 2);
    }
}
