//! Asset catalog: the fixed, ordered lists of loadable fragments.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{AssetError, ConfigError};

/// An opaque reference to a loadable fragment (a path or URI).
///
/// Cheap to clone; immutable once resolved from a catalog index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AssetRef(Arc<str>);

impl AssetRef {
    #[must_use]
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment, used for labels.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl From<String> for AssetRef {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<AssetRef> for String {
    fn from(value: AssetRef) -> Self {
        value.0.to_string()
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered catalogs of desk-top materials and support variants, plus the
/// single leg model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCatalog {
    pub materials: Vec<AssetRef>,
    pub supports: Vec<AssetRef>,
    pub leg: AssetRef,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self {
            materials: [
                "/assets/materials/top_ashwood_mat.glb",
                "/assets/materials/top_cedar_mat.glb",
                "/assets/materials/top_plastic_black_mat.glb",
                "/assets/materials/top_plastic_white_mat.glb",
                "/assets/materials/top_walnut_mat.glb",
            ]
            .into_iter()
            .map(AssetRef::new)
            .collect(),
            supports: ["/assets/models/prop_01.glb", "/assets/models/prop_02.glb"]
                .into_iter()
                .map(AssetRef::new)
                .collect(),
            leg: AssetRef::new("/assets/models/leg.glb"),
        }
    }
}

impl AssetCatalog {
    /// Resolves a material index; out-of-range indices fail closed.
    pub fn material(&self, index: usize) -> Result<&AssetRef, AssetError> {
        self.materials.get(index).ok_or(AssetError::UnknownIndex {
            catalog: "materials",
            index,
            len: self.materials.len(),
        })
    }

    /// Resolves a support-variant index; out-of-range indices fail closed.
    pub fn support(&self, index: usize) -> Result<&AssetRef, AssetError> {
        self.supports.get(index).ok_or(AssetError::UnknownIndex {
            catalog: "supports",
            index,
            len: self.supports.len(),
        })
    }

    #[inline]
    #[must_use]
    pub fn leg(&self) -> &AssetRef {
        &self.leg
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.materials.is_empty() {
            return Err(ConfigError::InvalidSettings("material catalog is empty".to_string()));
        }
        if self.supports.is_empty() {
            return Err(ConfigError::InvalidSettings("support catalog is empty".to_string()));
        }
        if self.leg.as_str().is_empty() {
            return Err(ConfigError::InvalidSettings("leg asset reference is empty".to_string()));
        }
        Ok(())
    }
}
