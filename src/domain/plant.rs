use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog row. `kind` mirrors the backend's free-text `type` column
/// (Indoor, Outdoor, Flowering, Succulent, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    #[serde(default)]
    pub nursery_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new catalog row.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlant {
    pub nursery_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub season: Option<String>,
}

/// Partial update; only present fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

/// Catalog price bands as exposed by the browse filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    /// Under 200.
    Low,
    /// 200 to 500.
    Mid,
    /// Above 500.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    InStock,
    OutOfStock,
}

/// Browse-time filtering; every field is optional and all present fields
/// apply together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub kind: Option<String>,
    pub price: Option<PriceBand>,
    pub availability: Option<Availability>,
}

/// 1-based offset-window pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self { page, per_page }
    }

    /// Page clamped to >= 1 and per-page to 1..=100.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// One window of a paginated listing together with the exact total count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.per_page <= 0 {
            return 0;
        }
        (self.total + self.per_page - 1) / self.per_page
    }
}
