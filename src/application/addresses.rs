use crate::domain::address::{Address, NewAddress, Profile};
use crate::domain::errors::StorefrontError;
use crate::domain::ports::{AuthGateway, CustomerDirectory};

use super::require_user;

/// Saved-address management for the checkout page.
pub struct AddressBookService<A, D> {
    auth: A,
    directory: D,
}

impl<A: AuthGateway, D: CustomerDirectory> AddressBookService<A, D> {
    pub fn new(auth: A, directory: D) -> Self {
        Self { auth, directory }
    }

    /// The delivery options offered at checkout: the saved addresses, with
    /// the profile projected in front when no saved address is flagged
    /// default.
    pub async fn delivery_options(&self) -> Result<Vec<Address>, StorefrontError> {
        let user = require_user(&self.auth).await?;
        let saved = self.directory.addresses(user.id).await?;
        if saved.iter().any(|a| a.is_default) {
            return Ok(saved);
        }

        let profile = self.directory.profile(user.id).await?;
        match profile.as_ref().and_then(Profile::as_address) {
            Some(profile_address) => {
                let mut options = Vec::with_capacity(saved.len() + 1);
                options.push(profile_address);
                options.extend(saved);
                Ok(options)
            }
            None => Ok(saved),
        }
    }

    /// Saves a new address for the signed-in user. Marking it default clears
    /// the flag on every other saved address first, keeping at most one
    /// default.
    pub async fn save(&self, mut address: NewAddress) -> Result<Address, StorefrontError> {
        let user = require_user(&self.auth).await?;
        address.user_id = user.id;
        if address.is_default {
            self.directory.clear_default(user.id).await?;
        }
        self.directory.insert_address(address).await
    }

    /// Rewrites an existing saved address.
    pub async fn update(&self, address: Address) -> Result<(), StorefrontError> {
        let user = require_user(&self.auth).await?;
        if address.is_default {
            self.directory.clear_default(user.id).await?;
        }
        self.directory.update_address(address).await
    }
}
