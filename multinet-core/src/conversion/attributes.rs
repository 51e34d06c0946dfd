//! Numeric link attribute resolution

use hashbrown::HashMap;

use super::units::{AttributeField, UnitMap};
use crate::algo::geometry::{Position, distance};
use crate::loading::{ConverterConfig, LinkAttrConfig, ModeConfig};
use crate::model::{Mode, RawLink, RawNode};
use crate::{Error, MIN_LINK_LENGTH};

/// Resolved numeric attributes of one canonical link, in meters, meters per
/// second and vehicles per hour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedAttributes {
    pub length: f64,
    pub free_speed: f64,
    pub capacity: f64,
    pub lanes: f64,
    pub lane_width: f64,
}

#[derive(Debug, Clone, Copy)]
struct ModeDefaults {
    free_speed: f64,
    lane_width: f64,
    lanes: f64,
}

impl From<&ModeConfig> for ModeDefaults {
    fn from(mode: &ModeConfig) -> Self {
        Self {
            free_speed: mode.free_speed,
            lane_width: mode.lane_width,
            lanes: mode.lanes,
        }
    }
}

/// Resolves link attributes from tags, falling back to per-mode defaults.
///
/// Only values read from tags are unit converted; defaults are already in
/// meters and meters per second.
#[derive(Debug, Clone)]
pub struct AttributeResolver {
    fields: LinkAttrConfig,
    defaults: HashMap<Mode, ModeDefaults>,
    geographic: bool,
}

impl AttributeResolver {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            fields: config.link_attributes.clone(),
            defaults: config
                .modes
                .iter()
                .map(|mode| (mode.mode, ModeDefaults::from(mode)))
                .collect(),
            geographic: config.is_geographic_input(),
        }
    }

    fn units(&self) -> &UnitMap {
        &self.fields.units
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidNumber`] when a configured tag field holds a
    /// value that is not a finite number
    pub fn resolve(
        &self,
        link: &RawLink,
        from: &RawNode,
        to: &RawNode,
    ) -> Result<ResolvedAttributes, Error> {
        let defaults = self.max_defaults(link);

        let length = match self.tag_value(link, AttributeField::Length)? {
            Some(length) => length,
            None => distance(
                Position::new(from.geometry, from.elevation),
                Position::new(to.geometry, to.elevation),
                self.geographic,
            ),
        };
        let length = if length.is_finite() && length > 0.0 {
            length.max(MIN_LINK_LENGTH)
        } else {
            MIN_LINK_LENGTH
        };

        let free_speed = self
            .tag_value(link, AttributeField::MaxSpeed)?
            .unwrap_or(defaults.free_speed);
        let lanes = self
            .tag_value(link, AttributeField::Lanes)?
            .unwrap_or(defaults.lanes);
        let lane_width = self
            .tag_value(link, AttributeField::LaneWidth)?
            .unwrap_or(defaults.lane_width);
        let capacity = match self.tag_value(link, AttributeField::Capacity)? {
            Some(capacity) => capacity,
            None => estimate_capacity(lanes, free_speed),
        };

        Ok(ResolvedAttributes {
            length,
            free_speed,
            capacity,
            lanes,
            lane_width,
        })
    }

    /// Unit converted tag value, `None` when the field is not configured or
    /// the tag is missing or blank
    fn tag_value(&self, link: &RawLink, field: AttributeField) -> Result<Option<f64>, Error> {
        let Some(name) = self.fields.field_name(field) else {
            return Ok(None);
        };
        let Some(raw) = link.tag(name).map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(self.units().convert(field, value))),
            _ => Err(Error::InvalidNumber {
                link_id: link.id.clone(),
                field: name.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// Maximum of each default over the modes allowed on the link.
    /// Modes without a configuration block use their stock template.
    fn max_defaults(&self, link: &RawLink) -> ModeDefaults {
        link.modes
            .iter()
            .map(|mode| {
                self.defaults
                    .get(mode)
                    .copied()
                    .unwrap_or_else(|| ModeDefaults::from(&ModeConfig::template(*mode)))
            })
            .reduce(|acc, next| ModeDefaults {
                free_speed: acc.free_speed.max(next.free_speed),
                lane_width: acc.lane_width.max(next.lane_width),
                lanes: acc.lanes.max(next.lanes),
            })
            .unwrap_or_else(|| ModeDefaults::from(&ModeConfig::template(Mode::Other)))
    }
}

/// Capacity in vehicles per hour when no tag supplies it.
///
/// Calibration carried over from the established converter: below a speed
/// of 60 the capacity grows with lanes and speed, otherwise it is flat.
pub fn estimate_capacity(lanes: f64, free_speed: f64) -> f64 {
    if free_speed < 60.0 {
        lanes * 1000.0 + free_speed * 20.0
    } else {
        2200.0
    }
}
