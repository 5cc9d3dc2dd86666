use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account-level profile row. Carries an optional free-form address that
/// checkout falls back to when no saved address is flagged default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// A shipping address. Saved rows carry their row id; the snapshot derived
/// from a profile does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address_line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Payload for saving a new address row.
#[derive(Debug, Clone, Serialize)]
pub struct NewAddress {
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub is_default: bool,
}

impl Profile {
    /// Projects the profile into an address snapshot, if it carries one.
    pub fn as_address(&self) -> Option<Address> {
        let line = self.address.clone()?;
        Some(Address {
            id: None,
            user_id: Some(self.id),
            name: self.name.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            address_line: Some(line),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            is_default: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(address: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: Some("Asha".to_string()),
            phone: Some("9999000011".to_string()),
            address: address.map(str::to_string),
            city: Some("Pune".to_string()),
            postal_code: Some("411001".to_string()),
        }
    }

    #[test]
    fn profile_with_address_projects_to_snapshot() {
        let p = profile(Some("12 Garden Lane"));
        let addr = p.as_address().expect("has an address");

        assert_eq!(addr.id, None);
        assert_eq!(addr.user_id, Some(p.id));
        assert_eq!(addr.name, "Asha");
        assert_eq!(addr.address_line.as_deref(), Some("12 Garden Lane"));
        assert!(!addr.is_default);
    }

    #[test]
    fn profile_without_address_projects_to_none() {
        assert!(profile(None).as_address().is_none());
    }

    #[test]
    fn address_deserializes_with_missing_default_flag() {
        let addr: Address = serde_json::from_str(
            r#"{"id":"6f7c9c34-9d61-4a5c-a2b5-6f4a39a6c1de","name":"Asha","phone":"9999000011"}"#,
        )
        .expect("deserializes");

        assert!(!addr.is_default);
        assert!(addr.address_line.is_none());
    }
}
