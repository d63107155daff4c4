use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};

use crate::entities::{addresses, categories, order_items, orders, product_categories, products, users};
use crate::error::StoreError;
use crate::models::{
    Address, Category, NewAddress, NewProduct, NewUser, Order, OrderItem, OrderStatus, Product,
    User, UserRole,
};
use crate::store::{Store, StoreTxn};

/// Postgres backend over sea-orm. All trait operations run against a
/// [`DatabaseTransaction`]; the relational engine's row locking inside that
/// transaction is the only concurrency control, per the storage model.
#[derive(Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(database_url).await?;
        Ok(Self { db })
    }

    /// Create the schema if it is not there yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        self.db
            .execute_unprepared(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id SERIAL PRIMARY KEY,
                    first_name TEXT NOT NULL,
                    middle_name TEXT,
                    last_name TEXT,
                    email TEXT NOT NULL UNIQUE,
                    phone_no TEXT NOT NULL,
                    role VARCHAR(20) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ
                );
                CREATE TABLE IF NOT EXISTS addresses (
                    id SERIAL PRIMARY KEY,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    country TEXT NOT NULL,
                    state TEXT NOT NULL,
                    city TEXT NOT NULL,
                    pincode TEXT NOT NULL,
                    street TEXT NOT NULL,
                    is_default BOOLEAN NOT NULL DEFAULT FALSE,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ
                );
                CREATE TABLE IF NOT EXISTS products (
                    id SERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT,
                    price NUMERIC(20, 2) NOT NULL CHECK (price > 0),
                    stock_count INTEGER NOT NULL CHECK (stock_count >= 0),
                    created_by INTEGER NOT NULL,
                    updated_by INTEGER,
                    deleted_by INTEGER,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ,
                    deleted_at TIMESTAMPTZ
                );
                CREATE TABLE IF NOT EXISTS categories (
                    id SERIAL PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ
                );
                CREATE TABLE IF NOT EXISTS product_categories (
                    id SERIAL PRIMARY KEY,
                    product_id INTEGER NOT NULL REFERENCES products(id),
                    category_id INTEGER NOT NULL REFERENCES categories(id)
                );
                CREATE TABLE IF NOT EXISTS orders (
                    id SERIAL PRIMARY KEY,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    address_id INTEGER REFERENCES addresses(id),
                    total_amount NUMERIC(20, 2) NOT NULL DEFAULT 0,
                    order_date TIMESTAMPTZ,
                    status VARCHAR(20) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ
                );
                CREATE TABLE IF NOT EXISTS order_items (
                    id SERIAL PRIMARY KEY,
                    order_id INTEGER NOT NULL REFERENCES orders(id),
                    product_id INTEGER NOT NULL REFERENCES products(id),
                    qty INTEGER NOT NULL,
                    price NUMERIC(10, 2) NOT NULL,
                    total_amount NUMERIC(20, 2) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ
                );
                "#,
            )
            .await?;
        Ok(())
    }
}

pub struct DatabaseTxn {
    txn: DatabaseTransaction,
}

#[async_trait]
impl Store for DatabaseStore {
    type Txn = DatabaseTxn;

    async fn begin(&self) -> Result<DatabaseTxn, StoreError> {
        let txn = self.db.begin().await?;
        Ok(DatabaseTxn { txn })
    }
}

#[async_trait]
impl StoreTxn for DatabaseTxn {
    async fn user_by_id(&mut self, user_id: i32) -> Result<Option<User>, StoreError> {
        Ok(users::Entity::find_by_id(user_id).one(&self.txn).await?)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.txn)
            .await?)
    }

    async fn insert_user(
        &mut self,
        new: &NewUser,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let user = users::ActiveModel {
            first_name: Set(new.first_name.clone()),
            middle_name: Set(new.middle_name.clone()),
            last_name: Set(new.last_name.clone()),
            email: Set(new.email.clone()),
            phone_no: Set(new.phone_no.clone()),
            role: Set(role),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(user)
    }

    async fn update_user(&mut self, user: User) -> Result<(), StoreError> {
        users::ActiveModel {
            id: Unchanged(user.id),
            first_name: Set(user.first_name),
            middle_name: Set(user.middle_name),
            last_name: Set(user.last_name),
            email: Set(user.email),
            phone_no: Set(user.phone_no),
            role: Set(user.role),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn address_for_user(
        &mut self,
        address_id: i32,
        user_id: i32,
    ) -> Result<Option<Address>, StoreError> {
        Ok(addresses::Entity::find_by_id(address_id)
            .filter(addresses::Column::UserId.eq(user_id))
            .one(&self.txn)
            .await?)
    }

    async fn default_address(&mut self, user_id: i32) -> Result<Option<Address>, StoreError> {
        Ok(addresses::Entity::find()
            .filter(addresses::Column::UserId.eq(user_id))
            .filter(addresses::Column::IsDefault.eq(true))
            .one(&self.txn)
            .await?)
    }

    async fn insert_address(
        &mut self,
        user_id: i32,
        new: &NewAddress,
        now: DateTime<Utc>,
    ) -> Result<Address, StoreError> {
        let address = addresses::ActiveModel {
            user_id: Set(user_id),
            country: Set(new.country.clone()),
            state: Set(new.state.clone()),
            city: Set(new.city.clone()),
            pincode: Set(new.pincode.clone()),
            street: Set(new.street.clone()),
            is_default: Set(new.is_default),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(address)
    }

    async fn update_address(&mut self, address: Address) -> Result<(), StoreError> {
        addresses::ActiveModel {
            id: Unchanged(address.id),
            user_id: Set(address.user_id),
            country: Set(address.country),
            state: Set(address.state),
            city: Set(address.city),
            pincode: Set(address.pincode),
            street: Set(address.street),
            is_default: Set(address.is_default),
            created_at: Set(address.created_at),
            updated_at: Set(address.updated_at),
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn product_by_id(&mut self, product_id: i32) -> Result<Option<Product>, StoreError> {
        Ok(products::Entity::find_by_id(product_id).one(&self.txn).await?)
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError> {
        Ok(products::Entity::find()
            .order_by_asc(products::Column::Id)
            .all(&self.txn)
            .await?)
    }

    async fn insert_product(
        &mut self,
        new: &NewProduct,
        created_by: i32,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let product = products::ActiveModel {
            name: Set(new.name.clone()),
            description: Set(new.description.clone()),
            price: Set(new.price),
            stock_count: Set(new.stock_count),
            created_by: Set(created_by),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(product)
    }

    async fn update_product(&mut self, product: Product) -> Result<(), StoreError> {
        products::ActiveModel {
            id: Unchanged(product.id),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            stock_count: Set(product.stock_count),
            created_by: Set(product.created_by),
            updated_by: Set(product.updated_by),
            deleted_by: Set(product.deleted_by),
            created_at: Set(product.created_at),
            updated_at: Set(product.updated_at),
            deleted_at: Set(product.deleted_at),
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn category_by_id(&mut self, category_id: i32) -> Result<Option<Category>, StoreError> {
        Ok(categories::Entity::find_by_id(category_id)
            .one(&self.txn)
            .await?)
    }

    async fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(&self.txn)
            .await?)
    }

    async fn insert_category(
        &mut self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, StoreError> {
        let category = categories::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(category)
    }

    async fn link_product_category(
        &mut self,
        product_id: i32,
        category_id: i32,
    ) -> Result<(), StoreError> {
        product_categories::ActiveModel {
            product_id: Set(product_id),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(())
    }

    async fn decrement_stock(&mut self, product_id: i32, qty: i32) -> Result<bool, StoreError> {
        // Single statement so the floor check and the write cannot be split
        // by a concurrent placement.
        let result = products::Entity::update_many()
            .col_expr(
                products::Column::StockCount,
                Expr::col(products::Column::StockCount).sub(qty),
            )
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::StockCount.gte(qty))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn restore_stock(&mut self, product_id: i32, qty: i32) -> Result<(), StoreError> {
        products::Entity::update_many()
            .col_expr(
                products::Column::StockCount,
                Expr::col(products::Column::StockCount).add(qty),
            )
            .filter(products::Column::Id.eq(product_id))
            .exec(&self.txn)
            .await?;
        Ok(())
    }

    async fn cart_for_user(&mut self, user_id: i32) -> Result<Option<Order>, StoreError> {
        Ok(orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .filter(orders::Column::Status.eq(OrderStatus::InCart))
            .one(&self.txn)
            .await?)
    }

    async fn order_by_id(&mut self, order_id: i32) -> Result<Option<Order>, StoreError> {
        Ok(orders::Entity::find_by_id(order_id).one(&self.txn).await?)
    }

    async fn insert_cart(&mut self, user_id: i32, now: DateTime<Utc>) -> Result<Order, StoreError> {
        let order = orders::ActiveModel {
            user_id: Set(user_id),
            total_amount: Set(Decimal::ZERO),
            status: Set(OrderStatus::InCart),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(order)
    }

    async fn set_order_total(&mut self, order_id: i32, total: Decimal) -> Result<(), StoreError> {
        orders::ActiveModel {
            id: Unchanged(order_id),
            total_amount: Set(total),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn mark_placed(
        &mut self,
        order_id: i32,
        address_id: i32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        orders::ActiveModel {
            id: Unchanged(order_id),
            status: Set(OrderStatus::Placed),
            address_id: Set(Some(address_id)),
            order_date: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn set_order_status(
        &mut self,
        order_id: i32,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        orders::ActiveModel {
            id: Unchanged(order_id),
            status: Set(status),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn items_for_order(&mut self, order_id: i32) -> Result<Vec<OrderItem>, StoreError> {
        Ok(order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order_id))
            .order_by_asc(order_items::Column::Id)
            .all(&self.txn)
            .await?)
    }

    async fn item_for_product(
        &mut self,
        order_id: i32,
        product_id: i32,
    ) -> Result<Option<OrderItem>, StoreError> {
        Ok(order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order_id))
            .filter(order_items::Column::ProductId.eq(product_id))
            .one(&self.txn)
            .await?)
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
        let item = order_items::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(product_id),
            qty: Set(qty),
            price: Set(price),
            total_amount: Set(total),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
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
        order_items::ActiveModel {
            id: Unchanged(item_id),
            qty: Set(qty),
            price: Set(price),
            total_amount: Set(total),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;
        Ok(())
    }

    async fn placed_items_for_product(
        &mut self,
        product_id: i32,
    ) -> Result<Vec<(OrderItem, Order)>, StoreError> {
        let rows = order_items::Entity::find()
            .filter(order_items::Column::ProductId.eq(product_id))
            .find_also_related(orders::Entity)
            .filter(orders::Column::OrderDate.is_not_null())
            .order_by_asc(order_items::Column::Id)
            .all(&self.txn)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(item, order)| order.map(|o| (item, o)))
            .collect())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await?;
        Ok(())
    }
}
