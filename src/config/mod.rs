//! Configuration Store
//!
//! Holds the parameter set that drives the composition:
//! - [`DeskConfig`]: the five bounded parameters, always valid
//! - [`Parameter`]: names a single field and its bounds
//! - [`ConfigStore`]: applies mutations in order and reports what changed
//!
//! Index parameters (material, support variant) are bounded by the asset
//! catalog, see [`ConfigLimits`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assets::AssetCatalog;
use crate::errors::ConfigError;

pub const LEG_HEIGHT_RANGE_MM: (i32, i32) = (500, 1200);
pub const DESK_WIDTH_RANGE_MM: (i32, i32) = (1200, 2400);
pub const DESK_DEPTH_RANGE_MM: (i32, i32) = (300, 900);

/// Identifies one configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    LegHeight,
    DeskWidth,
    DeskDepth,
    Material,
    SupportVariant,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::LegHeight,
        Parameter::DeskWidth,
        Parameter::DeskDepth,
        Parameter::Material,
        Parameter::SupportVariant,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Parameter::LegHeight => "leg_height_mm",
            Parameter::DeskWidth => "desk_width_mm",
            Parameter::DeskDepth => "desk_depth_mm",
            Parameter::Material => "material_index",
            Parameter::SupportVariant => "support_variant_index",
        }
    }

    /// Parses either the field name or its short alias (`height`, `width`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "leg_height_mm" | "height" => Some(Parameter::LegHeight),
            "desk_width_mm" | "width" => Some(Parameter::DeskWidth),
            "desk_depth_mm" | "depth" => Some(Parameter::DeskDepth),
            "material_index" | "material" => Some(Parameter::Material),
            "support_variant_index" | "support" => Some(Parameter::SupportVariant),
            _ => None,
        }
    }

    /// Inclusive bounds of this parameter under the given limits.
    #[must_use]
    pub fn range(self, limits: &ConfigLimits) -> (i64, i64) {
        let widen = |(min, max): (i32, i32)| (i64::from(min), i64::from(max));
        match self {
            Parameter::LegHeight => widen(LEG_HEIGHT_RANGE_MM),
            Parameter::DeskWidth => widen(DESK_WIDTH_RANGE_MM),
            Parameter::DeskDepth => widen(DESK_DEPTH_RANGE_MM),
            Parameter::Material => (0, limits.material_count as i64 - 1),
            Parameter::SupportVariant => (0, limits.support_count as i64 - 1),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper bounds of the index parameters, taken from the catalog sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigLimits {
    pub material_count: usize,
    pub support_count: usize,
}

impl ConfigLimits {
    #[must_use]
    pub fn from_catalog(catalog: &AssetCatalog) -> Self {
        Self {
            material_count: catalog.materials.len(),
            support_count: catalog.supports.len(),
        }
    }
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self::from_catalog(&AssetCatalog::default())
    }
}

/// The full parameter set of one desk.
///
/// Fields are private so that a `DeskConfig` obtained from this crate always
/// lies within its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    leg_height_mm: i32,
    desk_width_mm: i32,
    desk_depth_mm: i32,
    material_index: usize,
    support_variant_index: usize,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            leg_height_mm: 800,
            desk_width_mm: 1200,
            desk_depth_mm: 600,
            material_index: 0,
            support_variant_index: 0,
        }
    }
}

impl DeskConfig {
    /// Builds a configuration checked against the default catalog limits.
    pub fn new(
        leg_height_mm: i32,
        desk_width_mm: i32,
        desk_depth_mm: i32,
        material_index: usize,
        support_variant_index: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            leg_height_mm,
            desk_width_mm,
            desk_depth_mm,
            material_index,
            support_variant_index,
        };
        config.validate(&ConfigLimits::default())?;
        Ok(config)
    }

    #[inline]
    #[must_use]
    pub fn leg_height_mm(&self) -> i32 {
        self.leg_height_mm
    }

    #[inline]
    #[must_use]
    pub fn desk_width_mm(&self) -> i32 {
        self.desk_width_mm
    }

    #[inline]
    #[must_use]
    pub fn desk_depth_mm(&self) -> i32 {
        self.desk_depth_mm
    }

    #[inline]
    #[must_use]
    pub fn material_index(&self) -> usize {
        self.material_index
    }

    #[inline]
    #[must_use]
    pub fn support_variant_index(&self) -> usize {
        self.support_variant_index
    }

    /// Reads a field as a plain integer.
    #[must_use]
    pub fn get(&self, parameter: Parameter) -> i64 {
        match parameter {
            Parameter::LegHeight => i64::from(self.leg_height_mm),
            Parameter::DeskWidth => i64::from(self.desk_width_mm),
            Parameter::DeskDepth => i64::from(self.desk_depth_mm),
            Parameter::Material => self.material_index as i64,
            Parameter::SupportVariant => self.support_variant_index as i64,
        }
    }

    /// Returns a copy with one field replaced, or the reason it was refused.
    pub fn with(
        self,
        parameter: Parameter,
        value: i64,
        limits: &ConfigLimits,
    ) -> Result<Self, ConfigError> {
        let (min, max) = parameter.range(limits);
        if value < min || value > max {
            return Err(ConfigError::OutOfRange {
                parameter,
                value,
                min,
                max,
            });
        }

        // The range check above guarantees both conversions are lossless.
        let mut next = self;
        match parameter {
            Parameter::LegHeight => next.leg_height_mm = value as i32,
            Parameter::DeskWidth => next.desk_width_mm = value as i32,
            Parameter::DeskDepth => next.desk_depth_mm = value as i32,
            Parameter::Material => next.material_index = value as usize,
            Parameter::SupportVariant => next.support_variant_index = value as usize,
        }
        Ok(next)
    }

    /// Checks every field against its bounds.
    pub fn validate(&self, limits: &ConfigLimits) -> Result<(), ConfigError> {
        for parameter in Parameter::ALL {
            let (min, max) = parameter.range(limits);
            let value = self.get(parameter);
            if value < min || value > max {
                return Err(ConfigError::OutOfRange {
                    parameter,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// A mutation that was accepted and actually changed a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChange {
    pub parameter: Parameter,
    pub previous: i64,
    pub current: i64,
    pub revision: u64,
}

/// Owns the current [`DeskConfig`] for the session.
///
/// Mutations are applied synchronously in the order received. The store is
/// never written from the scene side.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    current: DeskConfig,
    limits: ConfigLimits,
    revision: u64,
}

impl ConfigStore {
    pub fn new(initial: DeskConfig, limits: ConfigLimits) -> Result<Self, ConfigError> {
        initial.validate(&limits)?;
        Ok(Self {
            current: initial,
            limits,
            revision: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> DeskConfig {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn limits(&self) -> &ConfigLimits {
        &self.limits
    }

    /// Number of accepted changes since creation.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Applies one mutation.
    ///
    /// Returns `Ok(None)` when the value is already current; out-of-range
    /// values leave the store untouched.
    pub fn set(
        &mut self,
        parameter: Parameter,
        value: i64,
    ) -> Result<Option<ConfigChange>, ConfigError> {
        let next = self.current.with(parameter, value, &self.limits)?;
        if next == self.current {
            return Ok(None);
        }

        let previous = self.current.get(parameter);
        self.current = next;
        self.revision += 1;

        Ok(Some(ConfigChange {
            parameter,
            previous,
            current: value,
            revision: self.revision,
        }))
    }
}
