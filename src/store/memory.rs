use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::entities::product_categories;
use crate::error::StoreError;
use crate::models::{
    Address, Category, NewAddress, NewProduct, NewUser, Order, OrderItem, OrderStatus, Product,
    User, UserRole,
};
use crate::store::{Store, StoreTxn};

#[derive(Clone, Default)]
struct MemoryState {
    users: HashMap<i32, User>,
    addresses: HashMap<i32, Address>,
    products: HashMap<i32, Product>,
    categories: HashMap<i32, Category>,
    product_categories: HashMap<i32, product_categories::Model>,
    orders: HashMap<i32, Order>,
    order_items: HashMap<i32, OrderItem>,
    next_id: HashMap<&'static str, i32>,
}

impl MemoryState {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let id = self.next_id.entry(table).or_insert(0);
        *id += 1;
        *id
    }
}

/// In-memory backend used by tests and demos. Transactions take the single
/// state lock for their whole lifetime and mutate a scratch copy; commit
/// writes the copy back, dropping the transaction discards it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryTxn {
    guard: OwnedMutexGuard<MemoryState>,
    scratch: MemoryState,
}

#[async_trait]
impl Store for MemoryStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let scratch = guard.clone();
        Ok(MemoryTxn { guard, scratch })
    }
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn user_by_id(&mut self, user_id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.scratch.users.get(&user_id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .scratch
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(
        &mut self,
        new: &NewUser,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let id = self.scratch.next_id("users");
        let user = User {
            id,
            first_name: new.first_name.clone(),
            middle_name: new.middle_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone_no: new.phone_no.clone(),
            role,
            created_at: now,
            updated_at: None,
        };
        self.scratch.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&mut self, user: User) -> Result<(), StoreError> {
        self.scratch.users.insert(user.id, user);
        Ok(())
    }

    async fn address_for_user(
        &mut self,
        address_id: i32,
        user_id: i32,
    ) -> Result<Option<Address>, StoreError> {
        Ok(self
            .scratch
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn default_address(&mut self, user_id: i32) -> Result<Option<Address>, StoreError> {
        Ok(self
            .scratch
            .addresses
            .values()
            .find(|a| a.user_id == user_id && a.is_default)
            .cloned())
    }

    async fn insert_address(
        &mut self,
        user_id: i32,
        new: &NewAddress,
        now: DateTime<Utc>,
    ) -> Result<Address, StoreError> {
        let id = self.scratch.next_id("addresses");
        let address = Address {
            id,
            user_id,
            country: new.country.clone(),
            state: new.state.clone(),
            city: new.city.clone(),
            pincode: new.pincode.clone(),
            street: new.street.clone(),
            is_default: new.is_default,
            created_at: now,
            updated_at: None,
        };
        self.scratch.addresses.insert(id, address.clone());
        Ok(address)
    }

    async fn update_address(&mut self, address: Address) -> Result<(), StoreError> {
        self.scratch.addresses.insert(address.id, address);
        Ok(())
    }

    async fn product_by_id(&mut self, product_id: i32) -> Result<Option<Product>, StoreError> {
        Ok(self.scratch.products.get(&product_id).cloned())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.scratch.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn insert_product(
        &mut self,
        new: &NewProduct,
        created_by: i32,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let id = self.scratch.next_id("products");
        let product = Product {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            stock_count: new.stock_count,
            created_by,
            updated_by: None,
            deleted_by: None,
            created_at: now,
            updated_at: None,
            deleted_at: None,
        };
        self.scratch.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&mut self, product: Product) -> Result<(), StoreError> {
        self.scratch.products.insert(product.id, product);
        Ok(())
    }

    async fn category_by_id(&mut self, category_id: i32) -> Result<Option<Category>, StoreError> {
        Ok(self.scratch.categories.get(&category_id).cloned())
    }

    async fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .scratch
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert_category(
        &mut self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, StoreError> {
        let id = self.scratch.next_id("categories");
        let category = Category {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: None,
        };
        self.scratch.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn link_product_category(
        &mut self,
        product_id: i32,
        category_id: i32,
    ) -> Result<(), StoreError> {
        let id = self.scratch.next_id("product_categories");
        self.scratch.product_categories.insert(
            id,
            product_categories::Model {
                id,
                product_id,
                category_id,
            },
        );
        Ok(())
    }

    async fn decrement_stock(&mut self, product_id: i32, qty: i32) -> Result<bool, StoreError> {
        match self.scratch.products.get_mut(&product_id) {
            Some(product) if product.stock_count >= qty => {
                product.stock_count -= qty;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_stock(&mut self, product_id: i32, qty: i32) -> Result<(), StoreError> {
        if let Some(product) = self.scratch.products.get_mut(&product_id) {
            product.stock_count += qty;
        }
        Ok(())
    }

    async fn cart_for_user(&mut self, user_id: i32) -> Result<Option<Order>, StoreError> {
        Ok(self
            .scratch
            .orders
            .values()
            .find(|o| o.user_id == user_id && o.status == OrderStatus::InCart)
            .cloned())
    }

    async fn order_by_id(&mut self, order_id: i32) -> Result<Option<Order>, StoreError> {
        Ok(self.scratch.orders.get(&order_id).cloned())
    }

    async fn insert_cart(&mut self, user_id: i32, now: DateTime<Utc>) -> Result<Order, StoreError> {
        let id = self.scratch.next_id("orders");
        let order = Order {
            id,
            user_id,
            address_id: None,
            total_amount: Decimal::ZERO,
            order_date: None,
            status: OrderStatus::InCart,
            created_at: now,
            updated_at: None,
        };
        self.scratch.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn set_order_total(&mut self, order_id: i32, total: Decimal) -> Result<(), StoreError> {
        if let Some(order) = self.scratch.orders.get_mut(&order_id) {
            order.total_amount = total;
        }
        Ok(())
    }

    async fn mark_placed(
        &mut self,
        order_id: i32,
        address_id: i32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(order) = self.scratch.orders.get_mut(&order_id) {
            order.status = OrderStatus::Placed;
            order.address_id = Some(address_id);
            order.order_date = Some(now);
            order.updated_at = Some(now);
        }
        Ok(())
    }

    async fn set_order_status(
        &mut self,
        order_id: i32,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(order) = self.scratch.orders.get_mut(&order_id) {
            order.status = status;
            order.updated_at = Some(now);
        }
        Ok(())
    }

    async fn items_for_order(&mut self, order_id: i32) -> Result<Vec<OrderItem>, StoreError> {
        let mut items: Vec<OrderItem> = self
            .scratch
            .order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn item_for_product(
        &mut self,
        order_id: i32,
        product_id: i32,
    ) -> Result<Option<OrderItem>, StoreError> {
        Ok(self
            .scratch
            .order_items
            .values()
            .find(|i| i.order_id == order_id && i.product_id == product_id)
            .cloned())
    }

    async fn insert_item(
        &mut self,
        order_id: i32,
        product_id: i32,
        qty: i32,
        price: Decimal,
        total: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OrderItem, StoreError> {
        let id = self.scratch.next_id("order_items");
        let item = OrderItem {
            id,
            order_id,
            product_id,
            qty,
            price,
            total_amount: total,
            created_at: now,
            updated_at: None,
        };
        self.scratch.order_items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &mut self,
        item_id: i32,
        qty: i32,
        price: Decimal,
        total: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(item) = self.scratch.order_items.get_mut(&item_id) {
            item.qty = qty;
            item.price = price;
            item.total_amount = total;
            item.updated_at = Some(now);
        }
        Ok(())
    }

    async fn placed_items_for_product(
        &mut self,
        product_id: i32,
    ) -> Result<Vec<(OrderItem, Order)>, StoreError> {
        let mut rows: Vec<(OrderItem, Order)> = self
            .scratch
            .order_items
            .values()
            .filter(|i| i.product_id == product_id)
            .filter_map(|i| {
                self.scratch
                    .orders
                    .get(&i.order_id)
                    .filter(|o| o.order_date.is_some())
                    .map(|o| (i.clone(), o.clone()))
            })
            .collect();
        rows.sort_by_key(|(i, _)| i.id);
        Ok(rows)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self { mut guard, scratch } = self;
        *guard = scratch;
        Ok(())
    }
}
