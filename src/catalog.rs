//! Product and category CRUD. Mutation is admin-gated; the ordering core
//! only ever reads products through the store.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::OrderError;
use crate::models::{Category, NewProduct, Product, ProductPatch, UserRole};
use crate::store::{Store, StoreTxn};

pub struct Catalog<S: Store> {
    store: S,
}

impl<S: Store> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, OrderError> {
        if name.trim().is_empty() {
            return Err(OrderError::Validation(
                "Category name cannot be empty.".to_string(),
            ));
        }

        let mut txn = self.store.begin().await?;
        if txn.category_by_name(name).await?.is_some() {
            return Err(OrderError::Duplicate(format!(
                "Category '{name}' already exists."
            )));
        }
        let category = txn.insert_category(name, Utc::now()).await?;
        txn.commit().await?;
        Ok(category)
    }

    /// Create a product with its category links. Price and stock are
    /// validated before anything is written, and every category id must
    /// resolve, otherwise the whole insert is discarded.
    pub async fn create_product(
        &self,
        acting_user_id: i32,
        new: NewProduct,
    ) -> Result<Product, OrderError> {
        validate_price(new.price)?;
        validate_stock(new.stock_count)?;

        let mut txn = self.store.begin().await?;
        ensure_admin(&mut txn, acting_user_id).await?;
        for category_id in &new.category_ids {
            if txn.category_by_id(*category_id).await?.is_none() {
                return Err(OrderError::CategoryNotFound);
            }
        }

        let product = txn.insert_product(&new, acting_user_id, Utc::now()).await?;
        for category_id in &new.category_ids {
            txn.link_product_category(product.id, *category_id).await?;
        }
        txn.commit().await?;

        info!(product_id = product.id, by = acting_user_id, "product created");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        acting_user_id: i32,
        product_id: i32,
        patch: ProductPatch,
    ) -> Result<Product, OrderError> {
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        if let Some(stock_count) = patch.stock_count {
            validate_stock(stock_count)?;
        }

        let mut txn = self.store.begin().await?;
        ensure_admin(&mut txn, acting_user_id).await?;
        let mut product = txn
            .product_by_id(product_id)
            .await?
            .ok_or(OrderError::ProductNotFound)?;

        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock_count) = patch.stock_count {
            product.stock_count = stock_count;
        }
        product.updated_by = Some(acting_user_id);
        product.updated_at = Some(Utc::now());

        txn.update_product(product.clone()).await?;
        txn.commit().await?;
        Ok(product)
    }

    pub async fn get_product(&self, product_id: i32) -> Result<Product, OrderError> {
        let mut txn = self.store.begin().await?;
        txn.product_by_id(product_id)
            .await?
            .ok_or(OrderError::ProductNotFound)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, OrderError> {
        let mut txn = self.store.begin().await?;
        Ok(txn.list_products().await?)
    }
}

async fn ensure_admin<T: StoreTxn>(txn: &mut T, user_id: i32) -> Result<(), OrderError> {
    let user = txn
        .user_by_id(user_id)
        .await?
        .ok_or(OrderError::UserNotFound)?;
    if user.role != UserRole::Admin {
        return Err(OrderError::PermissionDenied);
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), OrderError> {
    if price <= Decimal::ZERO {
        return Err(OrderError::Validation(
            "Price cannot be zero or negative.".to_string(),
        ));
    }
    Ok(())
}

fn validate_stock(stock_count: i32) -> Result<(), OrderError> {
    if stock_count < 0 {
        return Err(OrderError::Validation(
            "Stock count cannot be negative.".to_string(),
        ));
    }
    Ok(())
}
