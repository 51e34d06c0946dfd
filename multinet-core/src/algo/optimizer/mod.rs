//! Topology optimizer keeping link lengths within bounds
//!
//! Long links are cut into equal straight pieces, short links are merged
//! into a neighbour by a [`LinkSimplifier`]. Both steps repeat until nothing
//! changes.

mod simplifier;

use std::collections::BTreeSet;

pub use simplifier::{
    AttributeCombiner, DIVERGENCE_SEPARATOR, DefaultAttributeCombiner, DefaultMergePolicy,
    LinkSimplifier, MergePolicy,
};

use crate::Error;
use crate::algo::geometry::{Position, interpolate};
use crate::loading::OptimizerConfig;
use crate::model::{Link, Network, Node};

const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Result of [`NetworkOptimizer::optimize`]
#[derive(Debug, Clone)]
pub struct OptimizedNetwork {
    pub network: Network,
    /// Links left out of bounds, either because no neighbour could absorb
    /// them or because the iteration limit was reached
    pub skipped: Vec<String>,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct NetworkOptimizer<P = DefaultMergePolicy, C = DefaultAttributeCombiner> {
    min_length: f64,
    max_length: f64,
    max_iterations: usize,
    simplifier: LinkSimplifier<P, C>,
}

impl NetworkOptimizer {
    /// Optimizer using the default merge policy and attribute combiner
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `0 < min_length` and
    /// `2 * min_length <= max_length`
    pub fn new(min_length: f64, max_length: f64) -> Result<Self, Error> {
        Self::with_simplifier(
            min_length,
            max_length,
            LinkSimplifier::new(DefaultMergePolicy { min_length }, DefaultAttributeCombiner),
        )
    }

    /// # Errors
    ///
    /// See [`NetworkOptimizer::new`]
    pub fn from_config(config: &OptimizerConfig) -> Result<Self, Error> {
        Self::new(config.min_length, config.max_length)
    }
}

impl<P: MergePolicy, C: AttributeCombiner> NetworkOptimizer<P, C> {
    /// # Errors
    ///
    /// See [`NetworkOptimizer::new`]
    pub fn with_simplifier(
        min_length: f64,
        max_length: f64,
        simplifier: LinkSimplifier<P, C>,
    ) -> Result<Self, Error> {
        OptimizerConfig {
            min_length,
            max_length,
        }
        .validate()?;
        Ok(Self {
            min_length,
            max_length,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            simplifier,
        })
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Splits and merges until every link is within bounds or skip-listed
    ///
    /// # Errors
    ///
    /// Returns an error if a replacement link cannot be inserted
    pub fn optimize(&self, mut network: Network) -> Result<OptimizedNetwork, Error> {
        log::info!(
            "Optimizing {} links to lengths within [{}, {}] m",
            network.link_count(),
            self.min_length,
            self.max_length
        );
        let mut skipped = BTreeSet::new();
        let mut iterations = 0;

        while self.needs_work(&network, &skipped) {
            if iterations == self.max_iterations {
                let before = skipped.len();
                skipped.extend(
                    network
                        .links()
                        .filter(|(_, link)| self.out_of_bounds(link))
                        .map(|(_, link)| link.id.clone()),
                );
                log::warn!(
                    "Optimizer stopped after {iterations} iterations with {} links out of bounds",
                    skipped.len() - before
                );
                break;
            }
            iterations += 1;
            let split = self.split_long_links(&mut network)?;
            let merged = self
                .simplifier
                .merge_short_links(&mut network, self.min_length, &mut skipped)?;
            log::info!("Optimizer iteration {iterations}: {split} links split, {merged} merges");
        }

        let skipped: Vec<String> = skipped
            .into_iter()
            .filter(|id| network.link_index(id).is_some())
            .collect();
        if !skipped.is_empty() {
            log::warn!("{} links left outside the length bounds", skipped.len());
        }

        Ok(OptimizedNetwork {
            network,
            skipped,
            iterations,
        })
    }

    fn needs_work(&self, network: &Network, skipped: &BTreeSet<String>) -> bool {
        network
            .links()
            .any(|(_, link)| self.out_of_bounds(link) && !skipped.contains(&link.id))
    }

    fn out_of_bounds(&self, link: &Link) -> bool {
        link.length > self.max_length || link.length < self.min_length
    }

    /// Replaces every link longer than the maximum with `ceil(length / max)`
    /// equal pieces joined by interpolated nodes. Returns how many links
    /// were split.
    ///
    /// # Errors
    ///
    /// Returns an error if a piece cannot be inserted
    pub fn split_long_links(&self, network: &mut Network) -> Result<usize, Error> {
        let long: Vec<_> = network
            .links()
            .filter(|(_, link)| link.length > self.max_length)
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &long {
            let Some((from, to)) = network.endpoints(idx) else {
                continue;
            };
            let (Some(start), Some(end)) = (network.node_at(from), network.node_at(to)) else {
                continue;
            };
            let start = Position::new(start.geometry, start.elevation);
            let end = Position::new(end.geometry, end.elevation);
            let Some(link) = network.remove_link_at(idx) else {
                continue;
            };

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pieces = (link.length / self.max_length).ceil() as usize;
            #[allow(clippy::cast_precision_loss)]
            let piece_length = link.length / pieces as f64;

            let mut previous = from;
            for i in 1..=pieces {
                let next = if i == pieces {
                    to
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let position = interpolate(start, end, i as f64 / pieces as f64);
                    network.add_node(Node {
                        id: format!("splitNode_{}_{i}", link.id),
                        geometry: position.point,
                        elevation: position.elevation,
                    })
                };
                network.add_link(
                    previous,
                    next,
                    Link {
                        id: format!("splitLink_{}_{i}", link.id),
                        length: piece_length,
                        ..link.clone()
                    },
                )?;
                previous = next;
            }
            log::debug!("Split link {} into {pieces} pieces", link.id);
        }
        Ok(long.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::model::Mode;

    fn link(id: &str, length: f64) -> Link {
        Link {
            id: id.to_string(),
            length,
            free_speed: 13.9,
            capacity: 1200.0,
            lanes: 1.0,
            lane_width: 3.5,
            modes: [Mode::Car].into_iter().collect(),
            attributes: BTreeMap::from([("surface".to_string(), "asphalt".to_string())]),
        }
    }

    #[test]
    fn test_bounds_validated() {
        assert!(NetworkOptimizer::new(0.0, 100.0).is_err());
        assert!(NetworkOptimizer::new(60.0, 100.0).is_err());
        assert!(NetworkOptimizer::new(50.0, 100.0).is_ok());
    }

    #[test]
    fn test_split_long_link() {
        let mut network = Network::new();
        let a = network.add_node(Node {
            id: "a".into(),
            geometry: geo::Point::new(0.0, 0.0),
            elevation: Some(0.0),
        });
        let b = network.add_node(Node {
            id: "b".into(),
            geometry: geo::Point::new(250.0, 0.0),
            elevation: Some(30.0),
        });
        network.add_link(a, b, link("ab", 250.0)).unwrap();

        let optimizer = NetworkOptimizer::new(10.0, 100.0).unwrap();
        let result = optimizer.optimize(network).unwrap();
        let network = result.network;

        assert_eq!(network.link_count(), 3);
        for i in 1..=3 {
            let piece = network.link(&format!("splitLink_ab_{i}")).unwrap();
            assert_relative_eq!(piece.length, 250.0 / 3.0);
            assert_eq!(piece.attributes["surface"], "asphalt");
            assert_eq!(piece.capacity, 1200.0);
        }
        let node = network.node("splitNode_ab_1").unwrap();
        assert_relative_eq!(node.geometry.x(), 250.0 / 3.0);
        assert_relative_eq!(node.elevation.unwrap(), 10.0);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_length_bounds_hold() {
        let mut network = Network::new();
        let ids = ["a", "b", "c", "d", "e"];
        for (i, id) in ids.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            network.add_node(Node::new(*id, i as f64, 0.0));
        }
        let lengths = [420.0, 3.0, 80.0, 5.0];
        for (i, length) in lengths.iter().enumerate() {
            network
                .add_link_between(ids[i], ids[i + 1], link(&format!("l{i}"), *length))
                .unwrap();
        }
        // Isolated short link with nothing to merge into
        network.add_node(Node::new("x", 10.0, 10.0));
        network.add_node(Node::new("y", 10.0, 11.0));
        network.add_link_between("x", "y", link("lonely", 2.0)).unwrap();

        let optimizer = NetworkOptimizer::new(10.0, 100.0).unwrap();
        let result = optimizer.optimize(network).unwrap();

        for (_, link) in result.network.links() {
            if result.skipped.contains(&link.id) {
                continue;
            }
            assert!(link.length >= 10.0 && link.length <= 100.0, "{} {}", link.id, link.length);
        }
        assert!(result.skipped.contains(&"lonely".to_string()));
        assert!(result.iterations >= 1);
        let total: f64 = result
            .network
            .links()
            .map(|(_, link)| link.length)
            .sum();
        assert_relative_eq!(total, 420.0 + 3.0 + 80.0 + 5.0 + 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_iteration_limit_skips_remaining_violators() {
        let mut network = Network::new();
        network.add_node(Node::new("a", 0.0, 0.0));
        network.add_node(Node::new("b", 95.0, 0.0));
        network.add_node(Node::new("c", 103.0, 0.0));
        network.add_link_between("a", "b", link("l0", 95.0)).unwrap();
        network.add_link_between("b", "c", link("l1", 8.0)).unwrap();

        // the single merge yields a 103 m link that a second pass would split
        let optimizer = NetworkOptimizer::new(10.0, 100.0)
            .unwrap()
            .with_max_iterations(1);
        let result = optimizer.optimize(network).unwrap();

        assert_eq!(result.iterations, 1);
        assert_eq!(result.skipped, vec!["merged_l0_l1".to_string()]);
        for (_, link) in result.network.links() {
            assert!(
                result.skipped.contains(&link.id) || (10.0..=100.0).contains(&link.length),
                "{} {}",
                link.id,
                link.length
            );
        }
    }
}
