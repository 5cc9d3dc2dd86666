use uuid::Uuid;

use crate::domain::errors::StorefrontError;
use crate::domain::plant::{NewPlant, Page, PageRequest, Plant, PlantUpdate};
use crate::domain::ports::{AuthGateway, ImageStore, PlantRepository};

use super::require_user;

/// An image file picked in the admin form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Nursery-admin inventory management.
pub struct InventoryService<A, P, I> {
    auth: A,
    plants: P,
    images: I,
}

impl<A: AuthGateway, P: PlantRepository, I: ImageStore> InventoryService<A, P, I> {
    pub fn new(auth: A, plants: P, images: I) -> Self {
        Self {
            auth,
            plants,
            images,
        }
    }

    /// The signed-in nursery's own catalog rows.
    pub async fn stock_list(&self, page: PageRequest) -> Result<Page<Plant>, StorefrontError> {
        let user = require_user(&self.auth).await?;
        self.plants.list_for_nursery(user.id, page.clamped()).await
    }

    /// Inserts a new catalog row for the signed-in nursery, uploading the
    /// image first when one was picked.
    pub async fn add_plant(
        &self,
        mut plant: NewPlant,
        image: Option<ImageUpload>,
    ) -> Result<Plant, StorefrontError> {
        let user = require_user(&self.auth).await?;
        plant.nursery_id = Some(user.id);
        if let Some(image) = image {
            plant.image_url = Some(self.upload(image).await?);
        }
        self.plants.insert(plant).await
    }

    pub async fn update_plant(
        &self,
        id: Uuid,
        mut changes: PlantUpdate,
        image: Option<ImageUpload>,
    ) -> Result<(), StorefrontError> {
        require_user(&self.auth).await?;
        if let Some(image) = image {
            changes.image_url = Some(self.upload(image).await?);
        }
        self.plants.update(id, changes).await
    }

    pub async fn delete_plant(&self, id: Uuid) -> Result<(), StorefrontError> {
        require_user(&self.auth).await?;
        self.plants.delete(id).await
    }

    async fn upload(&self, image: ImageUpload) -> Result<String, StorefrontError> {
        // Unique key so replacement uploads never collide with existing objects.
        let key = format!("{}-{}", Uuid::new_v4(), image.file_name);
        self.images
            .upload(&key, image.bytes, &image.content_type)
            .await
    }
}
