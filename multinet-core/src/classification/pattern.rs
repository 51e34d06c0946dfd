//! Glob-style value patterns

use std::fmt;

/// Value side of a tag condition.
///
/// `*sub*` matches values containing `sub`, `*sub` values ending with it,
/// `sub*` values starting with it and a lone `*` anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValuePattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl ValuePattern {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "*" {
            return ValuePattern::Any;
        }
        match (raw.strip_prefix('*'), raw.strip_suffix('*')) {
            (Some(_), Some(_)) => {
                let inner = &raw[1..raw.len() - 1];
                if inner.is_empty() {
                    ValuePattern::Any
                } else {
                    ValuePattern::Contains(inner.to_string())
                }
            }
            (Some(rest), None) => ValuePattern::Suffix(rest.to_string()),
            (None, Some(rest)) => ValuePattern::Prefix(rest.to_string()),
            (None, None) => ValuePattern::Exact(raw.to_string()),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValuePattern::Any => true,
            ValuePattern::Exact(expected) => value == expected,
            ValuePattern::Prefix(prefix) => value.starts_with(prefix.as_str()),
            ValuePattern::Suffix(suffix) => value.ends_with(suffix.as_str()),
            ValuePattern::Contains(part) => value.contains(part.as_str()),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ValuePattern::Any)
    }
}

impl fmt::Display for ValuePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePattern::Any => f.write_str("*"),
            ValuePattern::Exact(value) => f.write_str(value),
            ValuePattern::Prefix(prefix) => write!(f, "{prefix}*"),
            ValuePattern::Suffix(suffix) => write!(f, "*{suffix}"),
            ValuePattern::Contains(part) => write!(f, "*{part}*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_kinds() {
        assert_eq!(ValuePattern::parse("*"), ValuePattern::Any);
        assert_eq!(ValuePattern::parse("**"), ValuePattern::Any);
        assert_eq!(
            ValuePattern::parse(" residential "),
            ValuePattern::Exact("residential".into())
        );
        assert_eq!(
            ValuePattern::parse("*_link"),
            ValuePattern::Suffix("_link".into())
        );
        assert_eq!(
            ValuePattern::parse("cycleway*"),
            ValuePattern::Prefix("cycleway".into())
        );
        assert_eq!(
            ValuePattern::parse("*bus*"),
            ValuePattern::Contains("bus".into())
        );
    }

    #[test]
    fn test_pattern_matching() {
        assert!(ValuePattern::parse("*_link").matches("motorway_link"));
        assert!(!ValuePattern::parse("*_link").matches("motorway"));
        assert!(ValuePattern::parse("primary*").matches("primary_link"));
        assert!(ValuePattern::parse("*bus*").matches("share_busway"));
        assert!(!ValuePattern::parse("motorway").matches("motorway_link"));
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["*", "exact", "pre*", "*suf", "*mid*"] {
            assert_eq!(ValuePattern::parse(raw).to_string(), raw);
        }
    }
}
