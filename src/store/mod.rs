use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::models::{
    Address, Category, NewAddress, NewProduct, NewUser, Order, OrderItem, OrderStatus, Product,
    User, UserRole,
};

/// A record store holding users, addresses, the catalog and orders.
///
/// Every mutating operation in the engine runs inside one [`StoreTxn`];
/// dropping a transaction without calling [`StoreTxn::commit`] discards all
/// of its writes, which is what keeps multi-row mutations all-or-nothing.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Txn: StoreTxn;

    async fn begin(&self) -> Result<Self::Txn, StoreError>;
}

#[async_trait]
pub trait StoreTxn: Send {
    // -- users --
    async fn user_by_id(&mut self, user_id: i32) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(
        &mut self,
        new: &NewUser,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError>;
    async fn update_user(&mut self, user: User) -> Result<(), StoreError>;

    // -- addresses --
    async fn address_for_user(
        &mut self,
        address_id: i32,
        user_id: i32,
    ) -> Result<Option<Address>, StoreError>;
    async fn default_address(&mut self, user_id: i32) -> Result<Option<Address>, StoreError>;
    async fn insert_address(
        &mut self,
        user_id: i32,
        new: &NewAddress,
        now: DateTime<Utc>,
    ) -> Result<Address, StoreError>;
    async fn update_address(&mut self, address: Address) -> Result<(), StoreError>;

    // -- catalog --
    async fn product_by_id(&mut self, product_id: i32) -> Result<Option<Product>, StoreError>;
    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError>;
    async fn insert_product(
        &mut self,
        new: &NewProduct,
        created_by: i32,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError>;
    async fn update_product(&mut self, product: Product) -> Result<(), StoreError>;
    async fn category_by_id(&mut self, category_id: i32) -> Result<Option<Category>, StoreError>;
    async fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StoreError>;
    async fn insert_category(
        &mut self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, StoreError>;
    async fn link_product_category(
        &mut self,
        product_id: i32,
        category_id: i32,
    ) -> Result<(), StoreError>;

    /// Atomic floor-checked decrement: subtracts `qty` from the product's
    /// stock only while `stock_count >= qty` still holds, and reports
    /// whether a row was actually updated. This is what closes the window
    /// between the placement pre-check and the write.
    async fn decrement_stock(&mut self, product_id: i32, qty: i32) -> Result<bool, StoreError>;
    async fn restore_stock(&mut self, product_id: i32, qty: i32) -> Result<(), StoreError>;

    // -- orders --
    async fn cart_for_user(&mut self, user_id: i32) -> Result<Option<Order>, StoreError>;
    async fn order_by_id(&mut self, order_id: i32) -> Result<Option<Order>, StoreError>;
    async fn insert_cart(&mut self, user_id: i32, now: DateTime<Utc>) -> Result<Order, StoreError>;
    async fn set_order_total(&mut self, order_id: i32, total: Decimal) -> Result<(), StoreError>;
    async fn mark_placed(
        &mut self,
        order_id: i32,
        address_id: i32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn set_order_status(
        &mut self,
        order_id: i32,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // -- order items --
    async fn items_for_order(&mut self, order_id: i32) -> Result<Vec<OrderItem>, StoreError>;
    async fn item_for_product(
        &mut self,
        order_id: i32,
        product_id: i32,
    ) -> Result<Option<OrderItem>, StoreError>;
    async fn insert_item(
        &mut self,
        order_id: i32,
        product_id: i32,
        qty: i32,
        price: Decimal,
        total: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OrderItem, StoreError>;
    async fn update_item(
        &mut self,
        item_id: i32,
        qty: i32,
        price: Decimal,
        total: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Line items of every order for this product that has an order date,
    /// i.e. was actually placed at some point, paired with the owning order.
    async fn placed_items_for_product(
        &mut self,
        product_id: i32,
    ) -> Result<Vec<(OrderItem, Order)>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}

pub mod database;
pub mod memory;
