use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use crate::entities::addresses::Model as Address;
pub use crate::entities::categories::Model as Category;
pub use crate::entities::order_items::Model as OrderItem;
pub use crate::entities::orders::{Model as Order, OrderStatus};
pub use crate::entities::products::Model as Product;
pub use crate::entities::users::{Model as User, UserRole};

/// Lifecycle notifications broadcast by the order engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum OrderEvent {
    CartUpdated {
        order_id: i32,
        user_id: i32,
        total_amount: Decimal,
    },
    Placed {
        order_id: i32,
    },
    Cancelled {
        order_id: i32,
    },
    Delivered {
        order_id: i32,
    },
}

/// Outcome of a successful add-to-cart call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartUpdate {
    pub order_id: i32,
    pub order_item_id: i32,
    pub order_total: Decimal,
}

/// One row of a user's cart listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub order_item_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub qty: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// One row of the admin orders-for-product report. Only placed orders
/// (non-null `order_date`) ever appear here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductOrderRow {
    pub order_id: i32,
    pub product_id: i32,
    pub user_id: i32,
    pub address_id: Option<i32>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub qty: i32,
    pub price: Decimal,
    pub total_amount: Decimal,
}

/// How the shipping address is selected at placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum AddressChoice {
    Address(i32),
    DefaultAddress,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_no: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_no: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewAddress {
    pub country: String,
    pub state: String,
    pub city: String,
    pub pincode: String,
    pub street: String,
    pub is_default: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AddressPatch {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub street: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_count: i32,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_count: Option<i32>,
}
