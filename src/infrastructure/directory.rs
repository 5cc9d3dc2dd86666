use serde_json::json;
use uuid::Uuid;

use crate::domain::address::{Address, NewAddress, Profile};
use crate::domain::errors::StorefrontError;
use crate::domain::ports::CustomerDirectory;

use super::client::{Filter, RestClient};

/// `profiles` and `addresses` relations.
pub struct RestCustomerDirectory {
    client: RestClient,
}

impl RestCustomerDirectory {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

impl CustomerDirectory for RestCustomerDirectory {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StorefrontError> {
        let rows: Vec<Profile> = self
            .client
            .select("profiles", &[Filter::Eq("id", user_id.to_string())], None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn addresses(&self, user_id: Uuid) -> Result<Vec<Address>, StorefrontError> {
        self.client
            .select(
                "addresses",
                &[Filter::Eq("user_id", user_id.to_string())],
                None,
            )
            .await
    }

    async fn insert_address(&self, address: NewAddress) -> Result<Address, StorefrontError> {
        let rows: Vec<Address> = self.client.insert("addresses", &[address]).await?;
        rows.into_iter().next().ok_or_else(|| {
            StorefrontError::RemoteRequestFailed("addresses: insert returned no row".to_string())
        })
    }

    async fn update_address(&self, address: Address) -> Result<(), StorefrontError> {
        let id = address.id.ok_or(StorefrontError::NotFound)?;
        let changes = json!({
            "name": address.name,
            "phone": address.phone,
            "address_line": address.address_line,
            "city": address.city,
            "postal_code": address.postal_code,
            "is_default": address.is_default,
        });
        self.client
            .update("addresses", &[Filter::Eq("id", id.to_string())], &changes)
            .await
    }

    async fn clear_default(&self, user_id: Uuid) -> Result<(), StorefrontError> {
        self.client
            .update(
                "addresses",
                &[
                    Filter::Eq("user_id", user_id.to_string()),
                    Filter::Eq("is_default", "true".to_string()),
                ],
                &json!({ "is_default": false }),
            )
            .await
    }
}
