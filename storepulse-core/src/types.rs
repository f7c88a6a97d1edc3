//! Core domain types for storepulse
//!
//! These types represent the back-office data model that dashboard metrics
//! are computed from.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Entity** | A source collection metrics are computed over (orders, products, ...) |
//! | **Order** | A customer purchase with a status and a total |
//! | **Product** | A catalog item with a price and a stock level |
//! | **Customer** | A registered shopper |
//! | **Review** | A 1-5 star rating left on a product |
//! | **Campaign** | A marketing campaign with a budget |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Entities
// ============================================

/// A source collection that metrics can be computed over.
///
/// Each entity knows its table, its timestamp column, and which fields may
/// appear in aggregations and predicates. Column names are only ever taken
/// from these lists, never from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Orders,
    Products,
    Customers,
    Reviews,
    Campaigns,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Orders,
        Entity::Products,
        Entity::Customers,
        Entity::Reviews,
        Entity::Campaigns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Orders => "orders",
            Entity::Products => "products",
            Entity::Customers => "customers",
            Entity::Reviews => "reviews",
            Entity::Campaigns => "campaigns",
        }
    }

    /// SQL table holding this entity's rows.
    pub fn table(&self) -> &'static str {
        self.as_str()
    }

    /// Column that time windows are applied to.
    pub fn timestamp_column(&self) -> &'static str {
        "created_at"
    }

    /// Fields that `sum` and `avg` may reduce over.
    pub fn numeric_fields(&self) -> &'static [&'static str] {
        match self {
            Entity::Orders => &["total", "item_count"],
            Entity::Products => &["price", "stock"],
            Entity::Customers => &[],
            Entity::Reviews => &["rating"],
            Entity::Campaigns => &["budget"],
        }
    }

    /// Fields that predicates may filter on.
    pub fn filter_fields(&self) -> &'static [&'static str] {
        match self {
            Entity::Orders => &["status", "customer_id", "currency", "total", "item_count"],
            Entity::Products => &["status", "category", "price", "stock"],
            Entity::Customers => &["country"],
            Entity::Reviews => &["status", "product_id", "rating"],
            Entity::Campaigns => &["status", "budget"],
        }
    }

    pub fn is_numeric_field(&self, field: &str) -> bool {
        self.numeric_fields().contains(&field)
    }

    pub fn is_filter_field(&self, field: &str) -> bool {
        self.filter_fields().contains(&field)
    }
}

impl std::str::FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orders" => Ok(Entity::Orders),
            "products" => Ok(Entity::Products),
            "customers" => Ok(Entity::Customers),
            "reviews" => Ok(Entity::Reviews),
            "campaigns" => Ok(Entity::Campaigns),
            _ => Err(format!("unknown entity: {}", s)),
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Statuses
// ============================================

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            _ => Err(format!("unknown order status: {}", s)),
        }
    }
}

/// Catalog visibility of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Draft,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
            ProductStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            "archived" => Ok(ProductStatus::Archived),
            _ => Err(format!("unknown product status: {}", s)),
        }
    }
}

/// Moderation status of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(format!("unknown review status: {}", s)),
        }
    }
}

/// Run state of a marketing campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Ended,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Ended => "ended",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "ended" => Ok(CampaignStatus::Ended),
            _ => Err(format!("unknown campaign status: {}", s)),
        }
    }
}

// ============================================
// Records
// ============================================

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A customer purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Buyer, if the order was placed by a registered customer
    pub customer_id: Option<String>,
    pub status: OrderStatus,
    /// Grand total in `currency`
    pub total: f64,
    /// ISO 4217 code
    pub currency: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a single-item EUR order with a fresh id.
    pub fn new(status: OrderStatus, total: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            customer_id: None,
            status,
            total,
            currency: "EUR".to_string(),
            item_count: 1,
            created_at,
        }
    }
}

/// A catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub price: f64,
    /// Units on hand
    pub stock: i64,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: &str, price: f64, stock: i64, created_at: DateTime<Utc>) -> Self {
        let id = new_id();
        Self {
            sku: format!("SKU-{}", &id[..8]),
            id,
            name: name.to_string(),
            category: None,
            price,
            stock,
            status: ProductStatus::Active,
            created_at,
        }
    }
}

/// A registered shopper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: &str, email: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            country: None,
            created_at,
        }
    }
}

/// A star rating on a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    /// 1-5
    pub rating: i64,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(product_id: &str, rating: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            product_id: product_id.to_string(),
            rating,
            status: ReviewStatus::Approved,
            created_at,
        }
    }
}

/// A marketing campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub status: CampaignStatus,
    pub budget: f64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(name: &str, status: CampaignStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            status,
            budget: 0.0,
            starts_at: None,
            ends_at: None,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_entity_roundtrip_and_fields() {
        for entity in Entity::ALL {
            assert_eq!(Entity::from_str(entity.as_str()).unwrap(), entity);
            for field in entity.numeric_fields() {
                assert!(
                    entity.is_filter_field(field),
                    "{} should be filterable on {}",
                    entity,
                    field
                );
            }
        }
        assert!(Entity::Orders.is_numeric_field("total"));
        assert!(!Entity::Orders.is_numeric_field("status"));
        assert!(Entity::from_str("invoices").is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            OrderStatus::from_str("cancelled").unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(OrderStatus::Completed.as_str(), "completed");
        assert!(OrderStatus::from_str("lost").is_err());
        assert_eq!(
            CampaignStatus::from_str("active").unwrap(),
            CampaignStatus::Active
        );
        assert_eq!(ReviewStatus::Approved.as_str(), "approved");
        assert_eq!(ProductStatus::from_str("draft").unwrap(), ProductStatus::Draft);
    }

    #[test]
    fn test_product_sku_derived_from_id() {
        let product = Product::new("Mug", 9.5, 3, Utc::now());
        assert!(product.sku.starts_with("SKU-"));
        assert_eq!(&product.sku[4..], &product.id[..8]);
    }
}
