//! Rule groups and rule sets

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::ValuePattern;
use crate::Error;
use crate::model::Tags;

/// Single `key=value` condition of a rule group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagCondition {
    /// `*=*`
    Always,
    /// `*=pattern`: some tag value matches the pattern
    AnyValue(ValuePattern),
    /// `key=*`: the tag is present with any value
    HasKey(String),
    /// `key=pattern`
    KeyValue { key: String, pattern: ValuePattern },
}

impl TagCondition {
    pub fn new(key: &str, value: &str) -> Self {
        let key = key.trim();
        let pattern = ValuePattern::parse(value);
        match (key == "*", pattern.is_any()) {
            (true, true) => TagCondition::Always,
            (true, false) => TagCondition::AnyValue(pattern),
            (false, true) => TagCondition::HasKey(key.to_string()),
            (false, false) => TagCondition::KeyValue {
                key: key.to_string(),
                pattern,
            },
        }
    }

    pub fn matches(&self, tags: &Tags) -> bool {
        match self {
            TagCondition::Always => true,
            TagCondition::AnyValue(pattern) => tags.values().any(|value| pattern.matches(value)),
            TagCondition::HasKey(key) => tags.contains_key(key),
            TagCondition::KeyValue { key, pattern } => tags
                .get(key)
                .is_some_and(|value| pattern.matches(value)),
        }
    }

    /// Tag key the condition inspects, `None` for the `*` key
    pub fn key(&self) -> Option<&str> {
        match self {
            TagCondition::Always | TagCondition::AnyValue(_) => None,
            TagCondition::HasKey(key) | TagCondition::KeyValue { key, .. } => Some(key),
        }
    }
}

impl fmt::Display for TagCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagCondition::Always => f.write_str("*=*"),
            TagCondition::AnyValue(pattern) => write!(f, "*={pattern}"),
            TagCondition::HasKey(key) => write!(f, "{key}=*"),
            TagCondition::KeyValue { key, pattern } => write!(f, "{key}={pattern}"),
        }
    }
}

/// Conjunction of tag conditions
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RuleGroup {
    conditions: Vec<TagCondition>,
}

impl RuleGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value`. A repeated key replaces the earlier condition.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(TagCondition::new(key, value));
        self
    }

    pub fn push(&mut self, condition: TagCondition) {
        let slot = condition.key().map_or_else(
            || {
                self.conditions
                    .iter()
                    .position(|existing| existing.key().is_none() && *existing == condition)
            },
            |key| {
                self.conditions
                    .iter()
                    .position(|existing| existing.key() == Some(key))
            },
        );
        match slot {
            Some(idx) => self.conditions[idx] = condition,
            None => self.conditions.push(condition),
        }
    }

    /// An empty group never matches
    pub fn matches(&self, tags: &Tags) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.matches(tags))
    }

    pub fn conditions(&self) -> &[TagCondition] {
        &self.conditions
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().filter_map(TagCondition::key)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.conditions.iter().join(","))
    }
}

/// Disjunction of rule groups, serialized as `{k=v,k=v}; {k=v}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleSet {
    groups: Vec<RuleGroup>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a rule set where every group holds a single `key=value`
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut rules = Self::new();
        for (key, value) in pairs {
            rules.push(RuleGroup::new().with(key, value));
        }
        rules
    }

    /// Identical groups are kept once, empty groups are ignored
    pub fn push(&mut self, group: RuleGroup) {
        if !group.is_empty() && !self.groups.contains(&group) {
            self.groups.push(group);
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: RuleGroup) -> Self {
        self.push(group);
        self
    }

    pub fn matches(&self, tags: &Tags) -> bool {
        self.groups.iter().any(|group| group.matches(tags))
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    /// Distinct tag keys referenced by any group, in first-seen order
    pub fn keys(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(RuleGroup::keys)
            .unique()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl FromStr for RuleSet {
    type Err = Error;

    /// Pairs that do not split into exactly one key and one value are
    /// skipped with a warning.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rules = RuleSet::new();
        for raw_group in s.split(';').map(str::trim).filter(|g| !g.is_empty()) {
            let body = raw_group.replace(['{', '}'], "");
            let mut group = RuleGroup::new();
            for pair in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let parts: Vec<&str> = pair.split('=').collect();
                match parts.as_slice() {
                    [key, value] if !key.trim().is_empty() && !value.trim().is_empty() => {
                        group.push(TagCondition::new(key, value));
                    }
                    _ => log::warn!("Ignoring malformed rule pair '{pair}' in '{raw_group}'"),
                }
            }
            rules.push(group);
        }
        Ok(rules)
    }
}

impl TryFrom<String> for RuleSet {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RuleSet> for String {
    fn from(rules: RuleSet) -> Self {
        rules.to_string()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.groups.iter().join("; "))
    }
}
