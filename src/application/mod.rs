pub mod addresses;
pub mod catalog;
pub mod checkout;
pub mod inventory;
pub mod orders;

use crate::domain::errors::StorefrontError;
use crate::domain::ports::{AuthGateway, UserIdentity};

/// The signed-in identity, or `NotAuthenticated` for the UI to redirect on.
pub(crate) async fn require_user<A: AuthGateway>(
    auth: &A,
) -> Result<UserIdentity, StorefrontError> {
    auth.current_user()
        .await?
        .ok_or(StorefrontError::NotAuthenticated)
}
