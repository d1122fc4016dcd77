//! Merchant ("chef") profile documents (`chefs/{uid}`) and their
//! external bank accounts (`chefs/{uid}/external_accounts/{token}`).

use serde::{Deserialize, Serialize};

use super::foundation::{decode, DocumentPath, Document, ValidationError};

pub const CHEFS: &str = "chefs";
pub const EXTERNAL_ACCOUNTS: &str = "external_accounts";

pub fn chef_path(uid: &str) -> DocumentPath {
    DocumentPath::new(CHEFS, uid)
}

/// Date of birth, stored on the document as `[day, month, year]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct DateOfBirth {
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

impl TryFrom<Vec<u32>> for DateOfBirth {
    type Error = ValidationError;

    fn try_from(parts: Vec<u32>) -> Result<Self, Self::Error> {
        let [day, month, year] = parts[..] else {
            return Err(ValidationError::invalid_format(
                "dob",
                format!("expected [day, month, year], got {} parts", parts.len()),
            ));
        };
        if !(1..=31).contains(&day) {
            return Err(ValidationError::out_of_range("dob.day", 1, 31, day as i64));
        }
        if !(1..=12).contains(&month) {
            return Err(ValidationError::out_of_range("dob.month", 1, 12, month as i64));
        }
        if !(1900..=9999).contains(&year) {
            return Err(ValidationError::out_of_range("dob.year", 1900, 9999, year as i64));
        }
        Ok(Self { day, month, year })
    }
}

impl From<DateOfBirth> for Vec<u32> {
    fn from(dob: DateOfBirth) -> Self {
        vec![dob.day, dob.month, dob.year]
    }
}

/// Identity and address fields a chef submits on signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChefProfile {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub dob: DateOfBirth,
    pub ssn_last_4: String,
    pub city: String,
    pub line1: String,
    pub postal_code: String,
    pub state: String,
    /// Address the chef accepted the terms of service from.
    pub ip: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl ChefProfile {
    pub fn from_document(doc: &Document) -> Result<Self, ValidationError> {
        let profile: ChefProfile = decode("chef profile", doc)?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email_address", &self.email_address),
            ("city", &self.city),
            ("line1", &self.line1),
            ("postal_code", &self.postal_code),
            ("state", &self.state),
            ("ip", &self.ip),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::empty_field(field));
            }
        }
        if self.ssn_last_4.len() != 4 || !self.ssn_last_4.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format("ssn_last_4", "expected 4 digits"));
        }
        Ok(())
    }
}

/// Connected-account id recorded on the chef document.
pub fn require_account_id(doc: &Document) -> Result<String, ValidationError> {
    #[derive(Deserialize)]
    struct AccountRef {
        #[serde(default)]
        account_id: Option<String>,
    }
    let account: AccountRef = decode("chef profile", doc)?;
    account
        .account_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ValidationError::missing_field("account_id"))
}
