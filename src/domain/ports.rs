//! Port traits for the hosted collaborators. Application services are
//! generic over these; `src/infrastructure/` carries the REST-backed
//! implementations and the tests carry in-memory ones.

use futures::stream::BoxStream;
use uuid::Uuid;

use super::address::{Address, NewAddress, Profile};
use super::errors::StorefrontError;
use super::order::{OrderChange, OrderDraft, OrderStatus, OrderView};
use super::plant::{CatalogFilter, NewPlant, Page, PageRequest, Plant, PlantUpdate};

/// The signed-in account as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: Option<String>,
}

pub trait AuthGateway: Send + Sync + 'static {
    async fn current_user(&self) -> Result<Option<UserIdentity>, StorefrontError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, StorefrontError>;
    async fn sign_out(&self) -> Result<(), StorefrontError>;
}

/// Profile and saved-address rows for a customer. At most one saved address
/// carries the default flag; `clear_default` drops the flag everywhere
/// before a new default is written.
pub trait CustomerDirectory: Send + Sync + 'static {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StorefrontError>;
    async fn addresses(&self, user_id: Uuid) -> Result<Vec<Address>, StorefrontError>;
    async fn insert_address(&self, address: NewAddress) -> Result<Address, StorefrontError>;
    async fn update_address(&self, address: Address) -> Result<(), StorefrontError>;
    async fn clear_default(&self, user_id: Uuid) -> Result<(), StorefrontError>;
}

pub trait PlantRepository: Send + Sync + 'static {
    async fn list(
        &self,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> Result<Page<Plant>, StorefrontError>;
    async fn list_for_nursery(
        &self,
        nursery_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Plant>, StorefrontError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Plant>, StorefrontError>;
    async fn insert(&self, plant: NewPlant) -> Result<Plant, StorefrontError>;
    async fn update(&self, id: Uuid, changes: PlantUpdate) -> Result<(), StorefrontError>;
    async fn delete(&self, id: Uuid) -> Result<(), StorefrontError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Persists all drafts as a single batch; either every row is written or
    /// the whole call fails.
    async fn insert_batch(&self, drafts: Vec<OrderDraft>) -> Result<Vec<Uuid>, StorefrontError>;
    /// The customer's orders, newest first.
    async fn list_for_customer(&self, customer_id: Uuid)
        -> Result<Vec<OrderView>, StorefrontError>;
    /// Orders addressed to a nursery, newest first.
    async fn list_for_nursery(&self, nursery_id: Uuid) -> Result<Vec<OrderView>, StorefrontError>;
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StorefrontError>;
}

/// Everything the interactive payment flow needs to open.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Amount in minor currency units (paise).
    pub amount_minor: i64,
    /// ISO 4217 code, e.g. "INR".
    pub currency: String,
    pub description: String,
    pub prefill: PaymentPrefill,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentPrefill {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    /// Confirmation token issued by the payment collaborator.
    pub payment_ref: String,
}

/// Opens the interactive payment flow and resolves exactly once on success.
/// This is the sole suspension point of a checkout attempt; the widget owns
/// its own timeout handling.
pub trait PaymentGateway: Send + Sync + 'static {
    async fn collect(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentConfirmation, StorefrontError>;
}

pub trait ImageStore: Send + Sync + 'static {
    /// Uploads the bytes under the given unique key and returns the publicly
    /// resolvable URL.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorefrontError>;
}

/// Live row-change events for the orders relation.
pub trait OrderChanges: Send + Sync + 'static {
    fn subscribe(&self) -> BoxStream<'static, OrderChange>;
}
