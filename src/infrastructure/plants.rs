use uuid::Uuid;

use crate::domain::errors::StorefrontError;
use crate::domain::plant::{
    Availability, CatalogFilter, NewPlant, Page, PageRequest, Plant, PlantUpdate, PriceBand,
};
use crate::domain::ports::PlantRepository;

use super::client::{Filter, RestClient, Window};

/// `plants` relation.
pub struct RestPlantRepository {
    client: RestClient,
}

impl RestPlantRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn window(page: PageRequest) -> Window {
        Window {
            offset: page.offset(),
            limit: page.per_page,
        }
    }
}

/// Renders the browse filter into column filters.
fn filters_for(filter: &CatalogFilter) -> Vec<Filter> {
    let mut filters = Vec::new();
    if let Some(search) = &filter.search {
        filters.push(Filter::ILike("name", search.clone()));
    }
    if let Some(kind) = &filter.kind {
        filters.push(Filter::Eq("type", kind.clone()));
    }
    match filter.price {
        Some(PriceBand::Low) => filters.push(Filter::Lte("price", "200".to_string())),
        Some(PriceBand::Mid) => {
            filters.push(Filter::Gte("price", "200".to_string()));
            filters.push(Filter::Lte("price", "500".to_string()));
        }
        Some(PriceBand::High) => filters.push(Filter::Gte("price", "500".to_string())),
        None => {}
    }
    match filter.availability {
        Some(Availability::InStock) => filters.push(Filter::Gt("stock", "0".to_string())),
        Some(Availability::OutOfStock) => filters.push(Filter::Eq("stock", "0".to_string())),
        None => {}
    }
    filters
}

impl PlantRepository for RestPlantRepository {
    async fn list(
        &self,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> Result<Page<Plant>, StorefrontError> {
        let (items, total) = self
            .client
            .select_window("plants", &filters_for(filter), None, Self::window(page))
            .await?;
        Ok(Page {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn list_for_nursery(
        &self,
        nursery_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Plant>, StorefrontError> {
        let filters = [Filter::Eq("nursery_id", nursery_id.to_string())];
        let (items, total) = self
            .client
            .select_window("plants", &filters, Some("created_at.desc"), Self::window(page))
            .await?;
        Ok(Page {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Plant>, StorefrontError> {
        let rows: Vec<Plant> = self
            .client
            .select("plants", &[Filter::Eq("id", id.to_string())], None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, plant: NewPlant) -> Result<Plant, StorefrontError> {
        let rows: Vec<Plant> = self.client.insert("plants", &[plant]).await?;
        rows.into_iter().next().ok_or_else(|| {
            StorefrontError::RemoteRequestFailed("plants: insert returned no row".to_string())
        })
    }

    async fn update(&self, id: Uuid, changes: PlantUpdate) -> Result<(), StorefrontError> {
        self.client
            .update("plants", &[Filter::Eq("id", id.to_string())], &changes)
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorefrontError> {
        self.client
            .delete("plants", &[Filter::Eq("id", id.to_string())])
            .await
    }
}
