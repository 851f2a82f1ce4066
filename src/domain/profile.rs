//! Profile value object
//!
//! Validated member profile data. All constraints are checked up front in
//! [`Profile::new`]; replaying events reconstructs profiles without
//! re-validation (events are facts, not requests).

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

const DISPLAY_NAME_MIN: usize = 2;
const DISPLAY_NAME_MAX: usize = 50;
const BIO_MAX: usize = 500;
const MIN_AGE: i32 = 18;

/// Member gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// A member's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub bio: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub interests: Vec<String>,
    pub photos: Vec<String>,
}

impl Profile {
    /// Validate and build a profile.
    pub fn new(
        display_name: impl Into<String>,
        bio: impl Into<String>,
        birth_date: NaiveDate,
        gender: Gender,
    ) -> Result<Self, DomainError> {
        let display_name = display_name.into();
        let bio = bio.into();

        let name_len = display_name.chars().count();
        if name_len < DISPLAY_NAME_MIN {
            return Err(DomainError::DisplayNameTooShort);
        }
        if name_len > DISPLAY_NAME_MAX {
            return Err(DomainError::DisplayNameTooLong);
        }
        if bio.chars().count() > BIO_MAX {
            return Err(DomainError::BioTooLong);
        }
        if age_on(birth_date, Utc::now().date_naive()) < MIN_AGE {
            return Err(DomainError::TooYoung);
        }

        Ok(Self {
            display_name,
            bio,
            birth_date,
            gender,
            interests: Vec::new(),
            photos: Vec::new(),
        })
    }

    /// Current age in whole years.
    pub fn age(&self) -> i32 {
        age_on(self.birth_date, Utc::now().date_naive())
    }
}

/// Calendar-year difference, decremented when the day-of-year hasn't been
/// reached yet.
fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if today.ordinal() < birth_date.ordinal() {
        age -= 1;
    }
    age
}
