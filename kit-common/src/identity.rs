use std::fmt;

use serde::{Deserialize, Serialize};

/// User identity types known to the host SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    Other,
    CustomerId,
    Facebook,
    Twitter,
    Google,
    Microsoft,
    Yahoo,
    Email,
    Alias,
    FacebookCustomAudienceId,
    Other2,
    Other3,
    Other4,
    MobileNumber,
    PhoneNumber2,
    PhoneNumber3,
}

impl IdentityType {
    /// The integration code the identity endpoint expects for this identity type.
    /// Types without a code are not forwarded.
    pub fn server_code(&self) -> Option<&'static str> {
        match self {
            IdentityType::Other => Some("other"),
            IdentityType::CustomerId => Some("customerid"),
            IdentityType::Facebook => Some("facebook"),
            IdentityType::Twitter => Some("twitter"),
            IdentityType::Google => Some("google"),
            IdentityType::Microsoft => Some("microsoft"),
            IdentityType::Yahoo => Some("yahoo"),
            IdentityType::Email => Some("email"),
            IdentityType::Alias => Some("alias"),
            IdentityType::FacebookCustomAudienceId => Some("facebookcustomaudienceid"),
            IdentityType::Other2
            | IdentityType::Other3
            | IdentityType::Other4
            | IdentityType::MobileNumber
            | IdentityType::PhoneNumber2
            | IdentityType::PhoneNumber3 => None,
        }
    }
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
