//! Free-form listing content shown to buyers.

use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, ValueObject};

const MAX_DESCRIPTION_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContent {
    description: String,
    notice: Option<String>,
}

impl ProductContent {
    pub fn new(description: impl Into<String>, notice: Option<String>) -> DomainResult<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::validation(format!(
                "description cannot exceed {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        Ok(Self {
            description,
            notice,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

impl ValueObject for ProductContent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rejects_blank_and_oversized_descriptions() {
        assert!(ProductContent::new("  ", None).is_err());
        assert!(ProductContent::new("a".repeat(2001), None).is_err());
        assert!(ProductContent::new("a".repeat(2000), None).is_ok());
    }
}
