use serde::Serialize;

pub const ORDER_STATUSES: &[&str] = &["pending", "working", "finished"];

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub date: String,
    pub status: String,
}

/// A product or package line of an order. `item_id` is the product or package id.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: i32,
    #[serde(skip)]
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: i32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub products: Vec<OrderLine>,
    pub packages: Vec<OrderLine>,
}
