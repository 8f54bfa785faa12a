use std::fmt;

use thiserror::Error;

/// Canonical `<area>:<id>` key of an entity definition.
///
/// Every key in the system is produced by [`EntityReference::new`]; authored
/// strings go through [`EntityReference::parse`], which re-canonicalises via
/// the same constructor. Area names coming from outside the process should be
/// checked with [`EntityReference::validate_area`] first, so that the key
/// reads back through `parse` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityReference {
    area: String,
    id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("entity reference '{raw}' must have the form <area>:<id>")]
    MissingSeparator { raw: String },
    #[error("entity reference '{raw}' has an empty area name")]
    EmptyArea { raw: String },
    #[error("entity reference '{raw}' has an invalid numeric id '{id}'")]
    InvalidId { raw: String, id: String },
    #[error("area name '{area}' must be non-empty, without surrounding whitespace or ':'")]
    InvalidArea { area: String },
}

impl EntityReference {
    pub fn new(area: &str, id: u32) -> Self {
        Self {
            area: area.to_string(),
            id,
        }
    }

    pub fn validate_area(area: &str) -> Result<(), ReferenceError> {
        if area.is_empty() || area.trim() != area || area.contains(':') {
            return Err(ReferenceError::InvalidArea {
                area: area.to_string(),
            });
        }
        Ok(())
    }

    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let Some((area, id)) = raw.trim().split_once(':') else {
            return Err(ReferenceError::MissingSeparator {
                raw: raw.to_string(),
            });
        };
        let area = area.trim();
        if area.is_empty() {
            return Err(ReferenceError::EmptyArea {
                raw: raw.to_string(),
            });
        }
        let id = id.trim();
        let parsed = id.parse::<u32>().map_err(|_| ReferenceError::InvalidId {
            raw: raw.to_string(),
            id: id.to_string(),
        })?;
        Ok(Self::new(area, parsed))
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.area, self.id)
    }
}
