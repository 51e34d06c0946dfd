//! Mode and oneway classification of raw links

use super::{RuleGroup, RuleSet};
use crate::loading::ConverterConfig;
use crate::model::{Mode, ModeSet, RawLink, Tags};

/// Returns `true` when any group of `rules` is fully satisfied by `tags`
pub fn matches(tags: &Tags, rules: &RuleSet) -> bool {
    rules.matches(tags)
}

/// Classification and oneway rules of one configured mode
#[derive(Debug, Clone)]
pub struct ModeRules {
    pub mode: Mode,
    pub rules: RuleSet,
    pub oneway: RuleSet,
}

/// Applies the configured mode rules to raw links.
///
/// Modes without their own oneway rules fall back to the global oneway
/// indicator when one is set.
#[derive(Debug, Clone, Default)]
pub struct ModeClassifier {
    modes: Vec<ModeRules>,
    oneway_fallback: RuleSet,
}

impl ModeClassifier {
    pub fn new(modes: Vec<ModeRules>) -> Self {
        Self {
            modes,
            oneway_fallback: RuleSet::new(),
        }
    }

    /// Uses `key=value` as the oneway rule of modes that have none
    #[must_use]
    pub fn with_oneway_indicator(mut self, key: &str, value: &str) -> Self {
        if key.trim().is_empty() || value.trim().is_empty() {
            return self;
        }
        self.oneway_fallback = RuleSet::new().with_group(RuleGroup::new().with(key, value));
        self
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        let modes = config
            .modes
            .iter()
            .map(|mode| ModeRules {
                mode: mode.mode,
                rules: mode.rules.clone(),
                oneway: mode.oneway_rules.clone(),
            })
            .collect();
        match config.oneway_pair() {
            Some((key, value)) => Self::new(modes).with_oneway_indicator(key, value),
            None => Self::new(modes),
        }
    }

    /// Modes whose rules match `tags`, with `Other` suppressed when a
    /// specific mode matched as well
    pub fn classify(&self, tags: &Tags) -> ModeSet {
        let mut modes: ModeSet = self
            .modes
            .iter()
            .filter(|rules| rules.rules.matches(tags))
            .map(|rules| rules.mode)
            .collect();
        suppress_other(&mut modes);
        modes
    }

    /// Adds the matched modes to the link's preassigned ones
    pub fn classify_link(&self, link: &mut RawLink) {
        let matched = self.classify(&link.tags);
        link.modes.extend(matched);
        suppress_other(&mut link.modes);
    }

    /// Oneway rules in effect for `mode`
    pub fn oneway_rules(&self, mode: Mode) -> &RuleSet {
        match self.modes.iter().find(|rules| rules.mode == mode) {
            Some(rules) if !rules.oneway.is_empty() => &rules.oneway,
            _ => &self.oneway_fallback,
        }
    }

    /// Whether `mode` may only travel in the digitized direction
    pub fn is_oneway(&self, mode: Mode, tags: &Tags) -> bool {
        self.oneway_rules(mode).matches(tags)
    }

    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        self.modes.iter().map(|rules| rules.mode)
    }
}

fn suppress_other(modes: &mut ModeSet) {
    if modes.len() > 1 {
        modes.remove(&Mode::Other);
    }
}
