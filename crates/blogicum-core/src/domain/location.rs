use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationErrors};

pub const LOCATION_NAME_MAX: usize = 256;

/// Location entity - where a post was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Location fields editable by staff.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFields {
    pub name: String,
    pub is_published: bool,
}

impl Validate for LocationFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, Some(LOCATION_NAME_MAX));
        errors.into_result()
    }
}
