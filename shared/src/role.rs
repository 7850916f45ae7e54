//! User roles
//!
//! Role strings travel inside JWT claims and request payloads, so the
//! enum serializes to the same SCREAMING_SNAKE names the clients send.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "CUSTOMER")]
    Customer,
    #[serde(rename = "SHG_DIDI")]
    ShgDidi,
    #[serde(rename = "DELIVERY_BOY")]
    DeliveryBoy,
}

impl Role {
    /// Canonical wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
            Role::ShgDidi => "SHG_DIDI",
            Role::DeliveryBoy => "DELIVERY_BOY",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "CUSTOMER" => Ok(Role::Customer),
            "SHG_DIDI" => Ok(Role::ShgDidi),
            "DELIVERY_BOY" => Ok(Role::DeliveryBoy),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Customer, Role::ShgDidi, Role::DeliveryBoy] {
            let parsed: Role = role.as_str().parse().expect("known role must parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("SUPERVISOR".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&Role::ShgDidi).unwrap();
        assert_eq!(json, "\"SHG_DIDI\"");
        let role: Role = serde_json::from_str("\"DELIVERY_BOY\"").unwrap();
        assert_eq!(role, Role::DeliveryBoy);
    }
}
