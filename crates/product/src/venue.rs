//! Venue value object: where the performance takes place.

use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, ValueObject};

/// Stage + hall location.
///
/// All fields are required together; a product either has a complete venue
/// or none at all (`Option<Venue>` on the aggregate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    stage_id: String,
    stage_name: String,
    hall_id: String,
    hall_name: String,
    hall_address: String,
}

impl Venue {
    pub fn new(
        stage_id: impl Into<String>,
        stage_name: impl Into<String>,
        hall_id: impl Into<String>,
        hall_name: impl Into<String>,
        hall_address: impl Into<String>,
    ) -> DomainResult<Self> {
        let venue = Self {
            stage_id: stage_id.into(),
            stage_name: stage_name.into(),
            hall_id: hall_id.into(),
            hall_name: hall_name.into(),
            hall_address: hall_address.into(),
        };

        for (field, value) in [
            ("stage_id", &venue.stage_id),
            ("stage_name", &venue.stage_name),
            ("hall_id", &venue.hall_id),
            ("hall_name", &venue.hall_name),
            ("hall_address", &venue.hall_address),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "venue {field} cannot be empty"
                )));
            }
        }

        Ok(venue)
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn hall_id(&self) -> &str {
        &self.hall_id
    }

    pub fn hall_name(&self) -> &str {
        &self.hall_name
    }

    pub fn hall_address(&self) -> &str {
        &self.hall_address
    }
}

impl ValueObject for Venue {}
