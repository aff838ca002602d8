//! Widget bootstrap DTOs.

use crate::domain::VisitorIdentity;
use crate::dtos::MessageDTO;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref PHONE_RE: Regex =
        Regex::new(r"^\+?[0-9][0-9 ().-]{5,19}$").expect("phone pattern is valid");
}

/// Contact form submission that opens (or resumes) a widget session.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct StartSessionDTO {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(regex(path = *PHONE_RE, message = "Phone number is not valid"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub property_ref: Option<String>,
}

impl From<StartSessionDTO> for VisitorIdentity {
    fn from(value: StartSessionDTO) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
        }
    }
}

/// Bootstrap response: the room key the widget socket subscribes to,
/// plus the transcript so a resuming visitor renders history before
/// the socket connects.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionDTO {
    pub conversation_id: i32,
    pub history: Vec<MessageDTO>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> StartSessionDTO {
        StartSessionDTO {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: Some("+351 912 345 678".to_string()),
            property_ref: Some("P1".to_string()),
        }
    }

    #[test]
    fn accepts_valid_submission() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        let mut dto = valid();
        dto.email = "not-an-email".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn rejects_bad_phone() {
        let mut dto = valid();
        dto.phone = Some("call me maybe".to_string());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn phone_is_optional() {
        let mut dto = valid();
        dto.phone = None;
        assert!(dto.validate().is_ok());
    }
}
