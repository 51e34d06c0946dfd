//! Transport modes known to the converter

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Transport mode a link can be classified into.
///
/// `Other` is the catch-all bucket: it is suppressed whenever a more
/// specific mode matches the same link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Car,
    Pt,
    Train,
    Bike,
    Walk,
    Ship,
    Other,
}

/// Ordered set of modes allowed on a link
pub type ModeSet = BTreeSet<Mode>;

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Car,
        Mode::Pt,
        Mode::Train,
        Mode::Bike,
        Mode::Walk,
        Mode::Ship,
        Mode::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Car => "car",
            Mode::Pt => "pt",
            Mode::Train => "train",
            Mode::Bike => "bike",
            Mode::Walk => "walk",
            Mode::Ship => "ship",
            Mode::Other => "other",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == name)
            .ok_or_else(|| Error::UnknownMode(s.trim().to_string()))
    }
}

/// Comma separated encoding used by exports, e.g. `bike,car`
pub fn modes_to_string(modes: &ModeSet) -> String {
    modes.iter().map(|mode| mode.as_str()).join(",")
}

/// Parses `car, bike,pt` into an ordered list, keeping the first occurrence
/// of repeated names.
///
/// # Errors
///
/// Returns [`Error::UnknownMode`] for any name that is not a mode
pub fn parse_mode_list(s: &str) -> Result<Vec<Mode>, Error> {
    let mut modes = Vec::new();
    for name in s.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let mode = name.parse::<Mode>()?;
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    Ok(modes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_names() {
        assert_eq!("car".parse::<Mode>().unwrap(), Mode::Car);
        assert_eq!(" PT ".parse::<Mode>().unwrap(), Mode::Pt);
        assert!(matches!("bus".parse::<Mode>(), Err(Error::UnknownMode(name)) if name == "bus"));
    }

    #[test]
    fn test_mode_list_keeps_order() {
        let modes = parse_mode_list("walk, car,bike,car").unwrap();
        assert_eq!(modes, vec![Mode::Walk, Mode::Car, Mode::Bike]);
        assert!(parse_mode_list("").unwrap().is_empty());
    }

    #[test]
    fn test_modes_to_string() {
        let modes: ModeSet = [Mode::Bike, Mode::Car].into_iter().collect();
        assert_eq!(modes_to_string(&modes), "car,bike");
    }
}
