//! Fixed organizational fields stamped on exports

use serde::Deserialize;

use super::error::ValidationError;
use crate::ports::OrganizationProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub organization_name: String,
    /// Commercial and Government Entity code
    pub cage_code: Option<String>,
    /// Unique Entity Identifier
    pub uei: Option<String>,
    pub point_of_contact: Option<String>,
}

impl ExportConfig {
    pub fn organization(&self) -> OrganizationProfile {
        OrganizationProfile {
            organization_name: self.organization_name.trim().to_string(),
            cage_code: self.cage_code.clone(),
            uei: self.uei.clone(),
            point_of_contact: self.point_of_contact.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.organization_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("export.organization_name"));
        }
        Ok(())
    }
}
