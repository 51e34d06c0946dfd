//! Tag based mode classification
//!
//! Rules are OR-of-AND groups of tag conditions, parsed once from the
//! `{k=v,k=v}; {k=v}` syntax used in configuration files.

pub mod classifier;
pub mod pattern;
pub mod rules;

pub use classifier::{ModeClassifier, ModeRules, matches};
pub use pattern::ValuePattern;
pub use rules::{RuleGroup, RuleSet, TagCondition};
