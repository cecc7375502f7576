use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub status: String,
}

/// Category row plus how many products and packages point at it.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub product_count: i64,
    pub package_count: i64,
}

/// Product or package image. `order` is the display position, 0-based.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: i32,
    #[serde(skip)]
    pub owner_id: i32,
    pub filename: String,
    #[serde(rename = "order")]
    pub position: i32,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub stock: i32,
    pub price: i32,
    pub old_price: Option<i32>,
    pub status: String,
    pub slug: String,
    #[serde(skip)]
    pub created: DateTime<Utc>,
}

/// Product with its relations as sent to clients.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i32,
    pub name: String,
    #[serde(skip)]
    pub category_id: i32,
    pub stock: i32,
    pub price: i32,
    pub old_price: Option<i32>,
    pub status: String,
    pub slug: String,
    #[serde(skip)]
    pub created: DateTime<Utc>,
}

/// One product inside a package, with the product and its images.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageItem {
    pub id: i32,
    pub quantity: i32,
    pub product: ProductDetails,
}

/// Row of `package_products` joined to its product id.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PackageItemRow {
    pub id: i32,
    pub package_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetails {
    #[serde(flatten)]
    pub package: Package,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<PackageItem>>,
    pub images: Vec<Image>,
}
