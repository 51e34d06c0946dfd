//! Reverse-direction counterparts for two-way links

use crate::classification::ModeClassifier;
use crate::model::{ModeSet, RawLink};

/// Builds the reversed link for the modes of `link` that are allowed to
/// travel against the digitized direction.
///
/// A configured mode whose oneway rules match the link's tags stays
/// one-directional. The reversed link carries the remaining modes, the
/// interior nodes in reverse order and the tags of `link` minus the oneway
/// keys of the one-directional modes. Returns `None` when no mode needs a
/// reverse direction.
pub fn reverse_for_oneway(link: &RawLink, classifier: &ModeClassifier) -> Option<RawLink> {
    let (oneway, two_way): (ModeSet, ModeSet) = link
        .modes
        .iter()
        .filter(|&&mode| classifier.modes().any(|configured| configured == mode))
        .partition(|&&mode| classifier.is_oneway(mode, &link.tags));

    if two_way.is_empty() {
        return None;
    }

    let mut tags = link.tags.clone();
    for mode in &oneway {
        for key in classifier.oneway_rules(*mode).keys() {
            tags.remove(key);
        }
    }

    let mut composed = link.composed.clone();
    composed.reverse();

    Some(RawLink {
        id: format!("{}_r", link.id),
        from: link.to,
        to: link.from,
        composed,
        modes: two_way,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ModeRules;
    use crate::model::{Mode, RawNetwork, RawNode};

    fn classifier() -> ModeClassifier {
        ModeClassifier::new(vec![
            ModeRules {
                mode: Mode::Car,
                rules: "{highway=*}".parse().unwrap(),
                oneway: "{oneway=yes}".parse().unwrap(),
            },
            ModeRules {
                mode: Mode::Bike,
                rules: "{highway=*}".parse().unwrap(),
                oneway: "{oneway:bicycle=yes}".parse().unwrap(),
            },
        ])
    }

    fn link(tags: &[(&str, &str)]) -> RawLink {
        let mut network = RawNetwork::new();
        let nodes: Vec<_> = (0..4)
            .map(|i| network.add_node(RawNode::new(i.to_string(), f64::from(i), 0.0)))
            .collect();
        let mut link = RawLink::new("w", nodes[0], nodes[3]).with_tags(tags.iter().copied());
        link.push_composed(nodes[1]);
        link.push_composed(nodes[2]);
        link.modes = [Mode::Car, Mode::Bike].into_iter().collect();
        link
    }

    #[test]
    fn test_partial_oneway_reversal() {
        let link = link(&[("highway", "primary"), ("oneway", "yes")]);
        let reversed = reverse_for_oneway(&link, &classifier()).unwrap();

        assert_eq!(reversed.id, "w_r");
        assert_eq!(reversed.from, link.to);
        assert_eq!(reversed.to, link.from);
        assert_eq!(reversed.modes, [Mode::Bike].into_iter().collect());
        let expected: Vec<_> = link.composed.iter().rev().copied().collect();
        assert_eq!(reversed.composed, expected);
        assert!(!reversed.tags.contains_key("oneway"));
        assert_eq!(reversed.tag("highway"), Some("primary"));
    }

    #[test]
    fn test_two_way_reversal() {
        let link = link(&[("highway", "primary")]);
        let reversed = reverse_for_oneway(&link, &classifier()).unwrap();
        assert_eq!(reversed.modes, link.modes);
        assert_eq!(reversed.tags, link.tags);
    }

    #[test]
    fn test_full_oneway_has_no_reversal() {
        let link = link(&[("oneway", "yes"), ("oneway:bicycle", "yes")]);
        assert!(reverse_for_oneway(&link, &classifier()).is_none());
    }

    #[test]
    fn test_unconfigured_modes_ignored() {
        let mut link = link(&[("oneway", "yes"), ("oneway:bicycle", "yes")]);
        link.modes.insert(Mode::Pt);
        assert!(reverse_for_oneway(&link, &classifier()).is_none());
    }
}
