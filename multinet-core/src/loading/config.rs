//! Converter configuration, stored as TOML

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::algo::connectivity::ConnectivityStrategy;
use crate::classification::RuleSet;
use crate::conversion::SplitPolicy;
use crate::conversion::units::{AttributeField, Unit, UnitMap};
use crate::model::Mode;

/// Input format of the source network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FileType {
    Osm,
    Shp,
    GeoJson,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Osm => "osm",
            FileType::Shp => "shp",
            FileType::GeoJson => "geojson",
        }
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osm" | "pbf" => Ok(FileType::Osm),
            "shp" => Ok(FileType::Shp),
            "geojson" => Ok(FileType::GeoJson),
            _ => Err(Error::UnsupportedFileType(s.trim().to_string())),
        }
    }
}

impl TryFrom<String> for FileType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileType> for String {
    fn from(file_type: FileType) -> Self {
        file_type.as_str().to_string()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification rules and numeric defaults of one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    #[serde(rename = "name")]
    pub mode: Mode,
    /// Meters per second
    pub free_speed: f64,
    pub emission_factor: f64,
    /// Meters
    pub lane_width: f64,
    pub lanes: f64,
    #[serde(default)]
    pub rules: RuleSet,
    #[serde(default)]
    pub oneway_rules: RuleSet,
}

impl ModeConfig {
    /// Stock rules and defaults for `mode`
    pub fn template(mode: Mode) -> Self {
        let (free_speed_kmh, emission_factor, lane_width, lanes, pairs): (
            f64,
            f64,
            f64,
            f64,
            &[(&str, &str)],
        ) = match mode {
            Mode::Car => (130.0, 0.242, 3.5, 2.0, CAR_RULES),
            Mode::Pt => (40.0, 0.142, 3.5, 1.0, PT_RULES),
            Mode::Train => (100.0, 0.542, 5.0, 1.0, &[("route", "train")]),
            Mode::Bike => (20.0, 0.0, 2.0, 1.0, BIKE_RULES),
            Mode::Walk => (5.0, 0.0, 1.0, 1.0, WALK_RULES),
            Mode::Ship => (20.0, 0.142, 10.0, 1.0, &[("route", "ferry")]),
            Mode::Other => (20.0, 0.142, 3.5, 1.0, &[("highway", "*")]),
        };

        let rules = if mode == Mode::Bike {
            bike_rules()
        } else {
            RuleSet::from_pairs(pairs.iter().copied())
        };

        Self {
            mode,
            free_speed: free_speed_kmh / 3.6,
            emission_factor,
            lane_width,
            lanes,
            rules,
            oneway_rules: RuleSet::new(),
        }
    }
}

const CAR_RULES: &[(&str, &str)] = &[
    ("highway", "motorway"),
    ("highway", "trunk"),
    ("highway", "secondary"),
    ("highway", "primary"),
    ("highway", "tertiary"),
    ("highway", "unclassified"),
    ("highway", "road"),
    ("highway", "residential"),
    ("highway", "motorway_link"),
    ("highway", "trunk_link"),
    ("highway", "primary_link"),
    ("highway", "tertiary_link"),
    ("highway", "service"),
    ("highway", "living_street"),
    ("highway", "track"),
];

const PT_RULES: &[(&str, &str)] = &[
    ("route", "bus"),
    ("route", "trolleybus"),
    ("route", "train"),
    ("route", "light_rail"),
    ("route", "subway"),
    ("route", "tram"),
    ("*", "busway"),
];

const WALK_RULES: &[(&str, &str)] = &[
    ("highway", "footway"),
    ("highway", "pedestrian"),
    ("highway", "steps"),
    ("highway", "path"),
    ("highway", "track"),
    ("highway", "service"),
    ("highway", "living_street"),
];

const BIKE_RULES: &[(&str, &str)] = &[
    ("bicycle", "yes"),
    ("highway", "cycleway"),
    ("highway", "tertiary"),
    ("highway", "living_street"),
    ("highway", "service"),
    ("highway", "unclassified"),
    ("highway", "track"),
    ("highway", "residential"),
    ("highway", "path"),
    ("highway", "footway"),
    ("highway", "pedestrian"),
    ("ramp:bicycle", "yes"),
    ("ramp", "yes"),
    ("bicycle", "designated"),
    ("bicycle", "optional_sidepath"),
    ("bicycle", "permissive"),
    ("bicycle", "destination"),
    ("bicycle", "private"),
    ("bicycle", "customers"),
    ("segregated", "*"),
    ("cycleway", "shared_lane"),
    ("cycleway", "shared"),
    ("cycleway", "shared_busway"),
    ("cycleway", "crossing"),
    ("cycleway:left", "*"),
    ("cycleway:right", "*"),
    ("cycleway:both", "*"),
    ("cyclestreet", "yes"),
];

fn bike_rules() -> RuleSet {
    let mut rules = RuleSet::from_pairs(BIKE_RULES.iter().copied());
    for (key, value) in [
        ("cycleway", "lane"),
        ("cycleway:left", "lane"),
        ("cycleway:right", "lane"),
        ("cycleway:both", "lane"),
        ("cycleway:right", "track"),
    ] {
        rules.push(
            crate::classification::RuleGroup::new()
                .with("highway", "*")
                .with(key, value),
        );
    }
    rules
}

/// Connectivity post-processing applied by the converter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    #[serde(default = "default_true")]
    pub strongly_connected: bool,
    /// Modes cleaned one after another, in this order
    #[serde(with = "mode_list")]
    pub modes: Vec<Mode>,
    #[serde(default)]
    pub method: ConnectivityStrategy,
    /// Modes whose links are never removed by the cleaner
    #[serde(default = "default_retain_modes", with = "mode_list")]
    pub retain_modes: Vec<Mode>,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            strongly_connected: true,
            modes: vec![Mode::Car, Mode::Pt, Mode::Bike, Mode::Walk, Mode::Other],
            method: ConnectivityStrategy::Reduce,
            retain_modes: default_retain_modes(),
        }
    }
}

/// Tag fields holding link attributes and the units they are given in.
///
/// A field named `NA` or left empty is never read from tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttrConfig {
    pub speed_field: String,
    pub capacity_field: String,
    pub lanes_field: String,
    pub lane_width_field: String,
    pub length_field: String,
    /// Tags copied verbatim onto canonical links
    #[serde(default)]
    pub reserved: Vec<String>,
    #[serde(default)]
    pub units: UnitMap,
}

impl LinkAttrConfig {
    pub fn field_name(&self, field: AttributeField) -> Option<&str> {
        let name = match field {
            AttributeField::MaxSpeed => &self.speed_field,
            AttributeField::Capacity => &self.capacity_field,
            AttributeField::Lanes => &self.lanes_field,
            AttributeField::LaneWidth => &self.lane_width_field,
            AttributeField::Length => &self.length_field,
        };
        requested(name)
    }
}

impl Default for LinkAttrConfig {
    fn default() -> Self {
        Self {
            speed_field: "speed".to_string(),
            capacity_field: "capacity".to_string(),
            lanes_field: "lanes".to_string(),
            lane_width_field: "width".to_string(),
            length_field: crate::MISSING_ATTRIBUTE.to_string(),
            reserved: vec!["surface".to_string(), "lit".to_string()],
            units: UnitMap::new()
                .with(AttributeField::MaxSpeed, Unit::MeterPerSecond)
                .with(AttributeField::LaneWidth, Unit::Meter)
                .with(AttributeField::Length, Unit::Meter),
        }
    }
}

/// Link length bounds for the topology optimizer, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub min_length: f64,
    pub max_length: f64,
}

impl OptimizerConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `0 < min_length` and
    /// `2 * min_length <= max_length`
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.min_length.is_finite() && self.max_length.is_finite()) || self.min_length <= 0.0
        {
            return Err(Error::InvalidConfig(format!(
                "Optimizer min_length must be positive, got {}",
                self.min_length
            )));
        }
        if 2.0 * self.min_length > self.max_length {
            return Err(Error::InvalidConfig(format!(
                "Optimizer max_length ({}) must be at least twice min_length ({})",
                self.max_length, self.min_length
            )));
        }
        Ok(())
    }
}

/// Complete converter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    pub file_type: FileType,
    #[serde(default = "default_crs")]
    pub input_crs: String,
    #[serde(default = "default_crs")]
    pub output_crs: String,
    pub input_file: PathBuf,
    /// Split at every shape point instead of only at intersections
    #[serde(default = "default_true")]
    pub keep_detailed_link: bool,
    /// Keep links classified only as `other`
    #[serde(default = "default_true")]
    pub keep_undefined_link: bool,
    pub output_network_file: String,
    #[serde(default = "not_requested")]
    pub output_shp_file: String,
    #[serde(default = "not_requested")]
    pub output_geojson_file: String,
    #[serde(default)]
    pub oneway: bool,
    /// Global `key:value` oneway indicator
    #[serde(default = "default_oneway_indicator")]
    pub oneway_indicator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerConfig>,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub link_attributes: LinkAttrConfig,
    #[serde(rename = "mode")]
    pub modes: Vec<ModeConfig>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            file_type: FileType::Osm,
            input_crs: default_crs(),
            output_crs: default_crs(),
            input_file: PathBuf::from("yours/input/network/file"),
            keep_detailed_link: true,
            keep_undefined_link: true,
            output_network_file: "yours/output/network/file".to_string(),
            output_shp_file: not_requested(),
            output_geojson_file: not_requested(),
            oneway: false,
            oneway_indicator: default_oneway_indicator(),
            optimizer: None,
            connectivity: ConnectivityConfig::default(),
            link_attributes: LinkAttrConfig::default(),
            modes: [Mode::Car, Mode::Bike, Mode::Pt, Mode::Walk, Mode::Other]
                .into_iter()
                .map(ModeConfig::template)
                .collect(),
        }
    }
}

impl ConverterConfig {
    /// Parses and validates a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: ConverterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        log::info!("Loading converter configuration: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found
    pub fn validate(&self) -> Result<(), Error> {
        if self.modes.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one [[mode]] block is required".to_string(),
            ));
        }
        for (idx, mode) in self.modes.iter().enumerate() {
            if self.modes[..idx].iter().any(|m| m.mode == mode.mode) {
                return Err(Error::InvalidConfig(format!(
                    "Mode {} is configured more than once",
                    mode.mode
                )));
            }
            let defaults = [
                ("free_speed", mode.free_speed),
                ("emission_factor", mode.emission_factor),
                ("lane_width", mode.lane_width),
                ("lanes", mode.lanes),
            ];
            if let Some((name, value)) = defaults
                .iter()
                .find(|(_, value)| !value.is_finite() || *value < 0.0)
            {
                return Err(Error::InvalidConfig(format!(
                    "Mode {} has invalid {name}: {value}",
                    mode.mode
                )));
            }
        }
        if self.oneway && self.oneway_pair().is_none() {
            return Err(Error::InvalidConfig(format!(
                "Oneway indicator '{}' must look like key:value",
                self.oneway_indicator
            )));
        }
        if let Some(optimizer) = &self.optimizer {
            optimizer.validate()?;
        }
        Ok(())
    }

    pub fn mode(&self, mode: Mode) -> Option<&ModeConfig> {
        self.modes.iter().find(|m| m.mode == mode)
    }

    pub fn split_policy(&self) -> SplitPolicy {
        if self.keep_detailed_link {
            SplitPolicy::Detailed
        } else {
            SplitPolicy::IntersectionOnly
        }
    }

    /// Key and value of the global oneway indicator
    pub fn oneway_pair(&self) -> Option<(&str, &str)> {
        let (key, value) = self.oneway_indicator.split_once(':')?;
        let (key, value) = (key.trim(), value.trim());
        (!key.is_empty() && !value.is_empty()).then_some((key, value))
    }

    /// Whether input coordinates are longitude/latitude degrees
    pub fn is_geographic_input(&self) -> bool {
        is_geographic(&self.input_crs)
    }

    pub fn output_network_path(&self) -> Option<PathBuf> {
        requested(&self.output_network_file).map(PathBuf::from)
    }

    pub fn output_shp_path(&self) -> Option<PathBuf> {
        requested(&self.output_shp_file).map(PathBuf::from)
    }

    pub fn output_geojson_path(&self) -> Option<PathBuf> {
        requested(&self.output_geojson_file).map(PathBuf::from)
    }
}

/// Whether a CRS code denotes WGS84 longitude/latitude
pub fn is_geographic(crs: &str) -> bool {
    matches!(
        crs.trim().to_ascii_uppercase().as_str(),
        "EPSG:4326" | "WGS84" | "WGS 84" | "CRS84" | "OGC:CRS84"
    )
}

fn requested(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != crate::MISSING_ATTRIBUTE).then_some(value)
}

fn default_true() -> bool {
    true
}

fn default_crs() -> String {
    "EPSG:4326".to_string()
}

fn not_requested() -> String {
    crate::MISSING_ATTRIBUTE.to_string()
}

fn default_oneway_indicator() -> String {
    "oneway:yes".to_string()
}

fn default_retain_modes() -> Vec<Mode> {
    vec![Mode::Car]
}

/// Comma separated mode lists such as `car,pt,bike`
mod mode_list {
    use itertools::Itertools;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::model::{Mode, parse_mode_list};

    pub fn serialize<S: Serializer>(modes: &[Mode], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&modes.iter().join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Mode>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_mode_list(&raw).map_err(serde::de::Error::custom)
    }
}
