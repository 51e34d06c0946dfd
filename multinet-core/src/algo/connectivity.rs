//! Per-mode strong connectivity enforcement

use std::fmt;
use std::str::FromStr;

use hashbrown::{HashMap, HashSet};
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::model::{Mode, Network};

/// How disconnected parts of a mode's subnetwork are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStrategy {
    /// Drop everything outside the largest strongly connected component
    #[default]
    Reduce,
    /// Connect isolated components to the nearest reachable node
    Insert,
    /// Grant extra modes to links bridging the gaps
    AdaptMode,
}

impl ConnectivityStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectivityStrategy::Reduce => "reduce",
            ConnectivityStrategy::Insert => "insert",
            ConnectivityStrategy::AdaptMode => "adapt_mode",
        }
    }

    /// Cleans `modes` one after another, protecting `retained`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedStrategy`] for every strategy but
    /// [`ConnectivityStrategy::Reduce`]
    pub fn apply(
        self,
        cleaner: &mut NetworkCleaner,
        modes: &[Mode],
        retained: &[Mode],
    ) -> Result<CleanReport, Error> {
        match self {
            ConnectivityStrategy::Reduce => {
                let mut report = CleanReport::default();
                for &mode in modes {
                    report.merge(cleaner.clean_mode(mode, retained));
                }
                Ok(report)
            }
            ConnectivityStrategy::Insert | ConnectivityStrategy::AdaptMode => {
                Err(Error::UnsupportedStrategy(self.as_str().to_string()))
            }
        }
    }
}

impl fmt::Display for ConnectivityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectivityStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reduce" => Ok(ConnectivityStrategy::Reduce),
            "insert" => Ok(ConnectivityStrategy::Insert),
            "adapt_mode" => Ok(ConnectivityStrategy::AdaptMode),
            other => Err(Error::InvalidConfig(format!(
                "Unknown connectivity method '{other}'"
            ))),
        }
    }
}

/// Counts of what a cleaning pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Links that lost at least one mode but were kept
    pub stripped_links: usize,
    pub removed_links: usize,
    pub removed_nodes: usize,
}

impl CleanReport {
    pub fn merge(&mut self, other: CleanReport) {
        self.stripped_links += other.stripped_links;
        self.removed_links += other.removed_links;
        self.removed_nodes += other.removed_nodes;
    }
}

/// Owns a network while pruning it to strongly connected mode subnetworks
#[derive(Debug, Clone)]
pub struct NetworkCleaner {
    network: Network,
}

impl NetworkCleaner {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    /// Restricts `targets` to the largest strongly connected component of
    /// the links allowing any target or retained mode.
    ///
    /// Target modes are stripped from links outside that component, links
    /// left without modes are removed and so are orphaned nodes. Retained
    /// modes are never stripped.
    pub fn reduce(&mut self, targets: &[Mode], retained: &[Mode]) -> CleanReport {
        let targets: Vec<Mode> = targets
            .iter()
            .copied()
            .filter(|mode| !retained.contains(mode))
            .collect();
        if targets.is_empty() {
            log::info!("Every target mode is retained, nothing to clean");
            return CleanReport::default();
        }
        let allowed: Vec<Mode> = targets.iter().chain(retained).copied().collect();

        let component = self.largest_component(&allowed);
        let mut report = CleanReport::default();

        for edge in self.network.link_indices() {
            let Some((from, to)) = self.network.endpoints(edge) else {
                continue;
            };
            if component.contains(&from) && component.contains(&to) {
                continue;
            }
            let Some(link) = self.network.link_at_mut(edge) else {
                continue;
            };
            if !link.allows_any(&targets) {
                continue;
            }
            link.modes.retain(|mode| !targets.contains(mode));
            if link.modes.is_empty() {
                self.network.remove_link_at(edge);
                report.removed_links += 1;
            } else {
                report.stripped_links += 1;
            }
        }
        report.removed_nodes = self.network.remove_orphan_nodes();

        if report.removed_links > 0 || report.stripped_links > 0 {
            log::warn!(
                "Unreachable {} links: {} removed, {} stripped, {} nodes dropped",
                targets.iter().map(|mode| mode.as_str()).collect::<Vec<_>>().join(","),
                report.removed_links,
                report.stripped_links,
                report.removed_nodes
            );
        }
        report
    }

    /// Cleans a single mode while never deleting `retained` links
    pub fn clean_mode(&mut self, mode: Mode, retained: &[Mode]) -> CleanReport {
        log::info!("Cleaning {mode} subnetwork");
        self.reduce(&[mode], retained)
    }

    /// Cleans modes in the given order. Modes not yet cleaned stay
    /// protected while an earlier one is processed.
    pub fn clean_modes(&mut self, modes: &[Mode]) -> CleanReport {
        let mut report = CleanReport::default();
        for (idx, &mode) in modes.iter().enumerate() {
            report.merge(self.clean_mode(mode, &modes[idx + 1..]));
        }
        report
    }

    fn largest_component(&self, allowed: &[Mode]) -> HashSet<NodeIndex> {
        let mut subgraph: DiGraph<NodeIndex, ()> = DiGraph::new();
        let mut local: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        for (edge, link) in self.network.links() {
            if !link.allows_any(allowed) {
                continue;
            }
            let Some((from, to)) = self.network.endpoints(edge) else {
                continue;
            };
            let a = *local.entry(from).or_insert_with(|| subgraph.add_node(from));
            let b = *local.entry(to).or_insert_with(|| subgraph.add_node(to));
            subgraph.add_edge(a, b, ());
        }

        // Ties go to the component holding the smallest node id
        tarjan_scc(&subgraph)
            .into_iter()
            .map(|component| {
                let nodes: HashSet<NodeIndex> = component.iter().map(|&i| subgraph[i]).collect();
                let min_id = nodes
                    .iter()
                    .filter_map(|&idx| self.network.node_at(idx))
                    .map(|node| node.id.as_str())
                    .min()
                    .unwrap_or_default()
                    .to_string();
                (nodes, min_id)
            })
            .max_by(|(a, a_id), (b, b_id)| a.len().cmp(&b.len()).then_with(|| b_id.cmp(a_id)))
            .map(|(nodes, _)| nodes)
            .unwrap_or_default()
    }
}
