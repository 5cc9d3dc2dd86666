use uuid::Uuid;

use crate::domain::errors::StorefrontError;
use crate::domain::plant::{CatalogFilter, Page, PageRequest, Plant};
use crate::domain::ports::PlantRepository;

/// Window size of the browse page.
pub const PLANTS_PER_PAGE: i64 = 10;

/// Customer-facing catalog browsing.
pub struct CatalogService<P> {
    plants: P,
}

impl<P: PlantRepository> CatalogService<P> {
    pub fn new(plants: P) -> Self {
        Self { plants }
    }

    /// One filtered window of the catalog, 1-based.
    pub async fn browse(
        &self,
        filter: &CatalogFilter,
        page: i64,
    ) -> Result<Page<Plant>, StorefrontError> {
        self.plants
            .list(filter, PageRequest::new(page, PLANTS_PER_PAGE).clamped())
            .await
    }

    /// Detail view for a single plant.
    pub async fn plant(&self, id: Uuid) -> Result<Plant, StorefrontError> {
        self.plants
            .find_by_id(id)
            .await?
            .ok_or(StorefrontError::NotFound)
    }
}
