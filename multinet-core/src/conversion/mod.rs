//! Stages turning classified raw links into canonical network elements

pub mod attributes;
pub mod materialize;
pub mod oneway;
pub mod split;
pub mod units;

pub use attributes::{AttributeResolver, ResolvedAttributes};
pub use materialize::materialize;
pub use oneway::reverse_for_oneway;
pub use split::{SplitPolicy, split_link};
pub use units::{AttributeField, Unit, UnitMap};
