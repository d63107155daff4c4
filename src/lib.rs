pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod http;
mod models;
pub mod notifications;
pub mod store;

pub use error::{AuthError, OrderError, StoreError};
pub use models::{
    Address, AddressChoice, AddressPatch, CartLine, CartUpdate, Category, NewAddress, NewProduct,
    NewUser, Order, OrderEvent, OrderItem, OrderStatus, Product, ProductOrderRow, ProductPatch,
    User, UserPatch, UserRole,
};

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use store::{Store, StoreTxn};

/// The cart/order core: one draft order per user, price-snapshotting line
/// items, stock reservation at placement and reversal on cancellation.
///
/// Every mutating operation runs inside a single store transaction, so a
/// failure partway through never leaves orders, items and stock counts in an
/// inconsistent relative state.
pub struct OrderEngine<S: Store> {
    store: S,
    event_tx: broadcast::Sender<OrderEvent>,
}

impl<S: Store> OrderEngine<S> {
    pub fn new(store: S) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self { store, event_tx }
    }

    pub fn subscribe(&self) -> BroadcastStream<OrderEvent> {
        BroadcastStream::new(self.event_tx.subscribe())
    }

    pub fn event_sender(&self) -> broadcast::Sender<OrderEvent> {
        self.event_tx.clone()
    }

    /// Ensure the user's cart holds a line with exactly `qty` of the product.
    ///
    /// A repeat add overwrites the quantity, it does not add to it. The unit
    /// price is re-snapshotted from the product at every call, and the line
    /// and order totals are recomputed from it. Stock is only checked here;
    /// nothing is decremented before placement.
    pub async fn add_to_cart(
        &self,
        user_id: i32,
        product_id: i32,
        qty: i32,
    ) -> Result<CartUpdate, OrderError> {
        if qty <= 0 {
            return Err(OrderError::Validation(
                "Entered quantity cannot be negative or 0.".to_string(),
            ));
        }

        let now = Utc::now();
        let mut txn = self.store.begin().await?;

        txn.user_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;
        let product = txn
            .product_by_id(product_id)
            .await?
            .ok_or(OrderError::ProductNotFound)?;
        if product.stock_count < qty {
            return Err(OrderError::OutOfStock);
        }

        let order = match txn.cart_for_user(user_id).await? {
            Some(order) => order,
            None => txn.insert_cart(user_id, now).await?,
        };

        let price = product.price;
        let line_total = price * Decimal::from(qty);
        let item_id = match txn.item_for_product(order.id, product_id).await? {
            Some(item) => {
                txn.update_item(item.id, qty, price, line_total, now).await?;
                item.id
            }
            None => {
                txn.insert_item(order.id, product_id, qty, price, line_total, now)
                    .await?
                    .id
            }
        };

        let order_total: Decimal = txn
            .items_for_order(order.id)
            .await?
            .iter()
            .map(|item| item.total_amount)
            .sum();
        txn.set_order_total(order.id, order_total).await?;
        txn.commit().await?;

        info!(user_id, product_id, qty, order_id = order.id, "cart updated");
        let _ = self.event_tx.send(OrderEvent::CartUpdated {
            order_id: order.id,
            user_id,
            total_amount: order_total,
        });

        Ok(CartUpdate {
            order_id: order.id,
            order_item_id: item_id,
            order_total,
        })
    }

    /// Transition an InCart order to Placed, reserving stock.
    ///
    /// Two passes: first every line is validated against current stock, then
    /// every stock row is decremented. The decrement itself re-checks the
    /// floor, so a placement racing another over the same product fails and
    /// rolls back rather than driving stock negative.
    pub async fn place_order(
        &self,
        order_id: i32,
        choice: AddressChoice,
    ) -> Result<(), OrderError> {
        let now = Utc::now();
        let mut txn = self.store.begin().await?;

        let order = txn
            .order_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        if order.status != OrderStatus::InCart {
            return Err(OrderError::NotInCart);
        }

        let address = match choice {
            AddressChoice::Address(address_id) => txn
                .address_for_user(address_id, order.user_id)
                .await?
                .ok_or(OrderError::AddressNotFound)?,
            AddressChoice::DefaultAddress => txn
                .default_address(order.user_id)
                .await?
                .ok_or(OrderError::NoDefaultAddress)?,
        };

        let items = txn.items_for_order(order_id).await?;
        for item in &items {
            let product = txn
                .product_by_id(item.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound)?;
            if product.stock_count < item.qty {
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id,
                });
            }
        }

        for item in &items {
            if !txn.decrement_stock(item.product_id, item.qty).await? {
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id,
                });
            }
        }

        txn.mark_placed(order_id, address.id, now).await?;
        txn.commit().await?;

        info!(order_id, address_id = address.id, "order placed");
        let _ = self.event_tx.send(OrderEvent::Placed { order_id });
        Ok(())
    }

    /// Cancel an order. An InCart order is cancelled outright; a Placed
    /// order additionally gets every line's quantity added back to its
    /// product's stock. Any other status cannot be cancelled.
    pub async fn cancel_order(&self, order_id: i32) -> Result<(), OrderError> {
        let now = Utc::now();
        let mut txn = self.store.begin().await?;

        let order = txn
            .order_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        match order.status {
            OrderStatus::InCart => {}
            OrderStatus::Placed => {
                let items = txn.items_for_order(order_id).await?;
                for item in &items {
                    txn.restore_stock(item.product_id, item.qty).await?;
                }
            }
            OrderStatus::Cancelled | OrderStatus::Delivered => {
                return Err(OrderError::CannotCancel);
            }
        }

        txn.set_order_status(order_id, OrderStatus::Cancelled, now)
            .await?;
        txn.commit().await?;

        info!(order_id, "order cancelled");
        let _ = self.event_tx.send(OrderEvent::Cancelled { order_id });
        Ok(())
    }

    /// Transition a Placed order to Delivered.
    pub async fn mark_delivered(&self, order_id: i32) -> Result<(), OrderError> {
        let now = Utc::now();
        let mut txn = self.store.begin().await?;

        let order = txn
            .order_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        if order.status != OrderStatus::Placed {
            return Err(OrderError::NotPlaced);
        }

        txn.set_order_status(order_id, OrderStatus::Delivered, now)
            .await?;
        txn.commit().await?;

        info!(order_id, "order delivered");
        let _ = self.event_tx.send(OrderEvent::Delivered { order_id });
        Ok(())
    }

    /// List the lines of the user's active cart. An unknown user, a missing
    /// InCart order and an InCart order with no lines are reported as
    /// distinct failures (the latter two both read as an empty cart).
    pub async fn cart_items(&self, user_id: i32) -> Result<Vec<CartLine>, OrderError> {
        let mut txn = self.store.begin().await?;

        txn.user_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;
        let order = txn
            .cart_for_user(user_id)
            .await?
            .ok_or(OrderError::EmptyCart)?;
        let items = txn.items_for_order(order.id).await?;
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        Ok(items
            .into_iter()
            .map(|item| CartLine {
                order_item_id: item.id,
                order_id: item.order_id,
                product_id: item.product_id,
                qty: item.qty,
                price: item.price,
                subtotal: item.total_amount,
            })
            .collect())
    }

    /// Admin-only report of every placed order containing the product.
    /// Orders that never left the cart have no order date and are skipped.
    pub async fn orders_for_product(
        &self,
        acting_user_id: i32,
        product_id: i32,
    ) -> Result<Vec<ProductOrderRow>, OrderError> {
        let mut txn = self.store.begin().await?;

        txn.product_by_id(product_id)
            .await?
            .ok_or(OrderError::ProductNotFound)?;
        let user = txn
            .user_by_id(acting_user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;
        if user.role != UserRole::Admin {
            return Err(OrderError::PermissionDenied);
        }

        let rows = txn.placed_items_for_product(product_id).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(item, order)| {
                order.order_date.map(|order_date| ProductOrderRow {
                    order_id: order.id,
                    product_id: item.product_id,
                    user_id: order.user_id,
                    address_id: order.address_id,
                    order_date,
                    status: order.status,
                    qty: item.qty,
                    price: item.price,
                    total_amount: item.total_amount,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Accounts;
    use crate::catalog::Catalog;
    use crate::store::memory::MemoryStore;
    use futures::StreamExt;

    struct Fixture {
        engine: OrderEngine<MemoryStore>,
        accounts: Accounts<MemoryStore>,
        catalog: Catalog<MemoryStore>,
        admin_id: i32,
        user_id: i32,
    }

    async fn setup() -> Fixture {
        let store = MemoryStore::new();
        let engine = OrderEngine::new(store.clone());
        let accounts = Accounts::new(store.clone());
        let catalog = Catalog::new(store);

        let admin = accounts
            .create_user(NewUser {
                first_name: "Admin".to_string(),
                middle_name: None,
                last_name: None,
                email: "admin@example.com".to_string(),
                phone_no: "9999999999".to_string(),
            })
            .await
            .unwrap();
        accounts.set_role(admin.id, UserRole::Admin).await.unwrap();

        let user = accounts
            .create_user(NewUser {
                first_name: "Asha".to_string(),
                middle_name: None,
                last_name: Some("Rao".to_string()),
                email: "asha@example.com".to_string(),
                phone_no: "9876543210".to_string(),
            })
            .await
            .unwrap();

        Fixture {
            engine,
            accounts,
            catalog,
            admin_id: admin.id,
            user_id: user.id,
        }
    }

    async fn seed_product(fx: &Fixture, name: &str, price: Decimal, stock: i32) -> Product {
        fx.catalog
            .create_product(
                fx.admin_id,
                NewProduct {
                    name: name.to_string(),
                    description: None,
                    price,
                    stock_count: stock,
                    category_ids: vec![],
                },
            )
            .await
            .unwrap()
    }

    async fn seed_address(fx: &Fixture, is_default: bool) -> Address {
        fx.accounts
            .create_address(
                fx.user_id,
                NewAddress {
                    country: "India".to_string(),
                    state: "Karnataka".to_string(),
                    city: "Bengaluru".to_string(),
                    pincode: "560001".to_string(),
                    street: "12 MG Road".to_string(),
                    is_default,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_to_cart_creates_order_and_item() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 3).await.unwrap();
        assert_eq!(update.order_total, Decimal::new(1500, 2));

        let lines = fx.engine.cart_items(fx.user_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 3);
        assert_eq!(lines[0].price, Decimal::new(500, 2));
        assert_eq!(lines[0].subtotal, Decimal::new(1500, 2));
    }

    #[tokio::test]
    async fn repeat_add_overwrites_quantity() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        let first = fx.engine.add_to_cart(fx.user_id, product.id, 3).await.unwrap();
        let second = fx.engine.add_to_cart(fx.user_id, product.id, 7).await.unwrap();

        // Same order, same item: 7, not 3 + 7.
        assert_eq!(first.order_id, second.order_id);
        assert_eq!(first.order_item_id, second.order_item_id);
        assert_eq!(second.order_total, Decimal::new(3500, 2));

        let lines = fx.engine.cart_items(fx.user_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 7);
    }

    #[tokio::test]
    async fn order_total_tracks_all_lines() {
        let fx = setup().await;
        let rice = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let dal = seed_product(&fx, "Dal", Decimal::new(1200, 2), 10).await;

        fx.engine.add_to_cart(fx.user_id, rice.id, 2).await.unwrap();
        let update = fx.engine.add_to_cart(fx.user_id, dal.id, 1).await.unwrap();

        // 2 * 5.00 + 1 * 12.00
        assert_eq!(update.order_total, Decimal::new(2200, 2));
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected_without_writes() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        for qty in [0, -4] {
            let err = fx.engine.add_to_cart(fx.user_id, product.id, qty).await.unwrap_err();
            assert!(matches!(err, OrderError::Validation(_)));
        }

        // No order came into being.
        assert!(matches!(
            fx.engine.cart_items(fx.user_id).await.unwrap_err(),
            OrderError::EmptyCart
        ));
    }

    #[tokio::test]
    async fn add_to_cart_checks_stock_without_reserving() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 5).await;

        let err = fx.engine.add_to_cart(fx.user_id, product.id, 6).await.unwrap_err();
        assert!(matches!(err, OrderError::OutOfStock));

        fx.engine.add_to_cart(fx.user_id, product.id, 5).await.unwrap();
        // Stock untouched until placement.
        let current = fx.catalog.get_product(product.id).await.unwrap();
        assert_eq!(current.stock_count, 5);
    }

    #[tokio::test]
    async fn unknown_user_and_product_are_distinct_errors() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        assert!(matches!(
            fx.engine.add_to_cart(999, product.id, 1).await.unwrap_err(),
            OrderError::UserNotFound
        ));
        assert!(matches!(
            fx.engine.add_to_cart(fx.user_id, 999, 1).await.unwrap_err(),
            OrderError::ProductNotFound
        ));
    }

    #[tokio::test]
    async fn placement_decrements_stock_and_stamps_order() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let address = seed_address(&fx, false).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 7).await.unwrap();
        fx.engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap();

        let current = fx.catalog.get_product(product.id).await.unwrap();
        assert_eq!(current.stock_count, 3);

        let report = fx
            .engine
            .orders_for_product(fx.admin_id, product.id)
            .await
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].status, OrderStatus::Placed);
        assert_eq!(report[0].address_id, Some(address.id));
        assert_eq!(report[0].total_amount, Decimal::new(3500, 2));
    }

    #[tokio::test]
    async fn placement_uses_default_address_when_chosen() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        let err = fx
            .engine
            .place_order(update.order_id, AddressChoice::DefaultAddress)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NoDefaultAddress));

        let address = seed_address(&fx, true).await;
        fx.engine
            .place_order(update.order_id, AddressChoice::DefaultAddress)
            .await
            .unwrap();

        let report = fx
            .engine
            .orders_for_product(fx.admin_id, product.id)
            .await
            .unwrap();
        assert_eq!(report[0].address_id, Some(address.id));
    }

    #[tokio::test]
    async fn placement_rejects_foreign_address() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        // Address owned by the admin, not the ordering user.
        let foreign = fx
            .accounts
            .create_address(
                fx.admin_id,
                NewAddress {
                    country: "India".to_string(),
                    state: "Karnataka".to_string(),
                    city: "Bengaluru".to_string(),
                    pincode: "560002".to_string(),
                    street: "1 Admin Lane".to_string(),
                    is_default: false,
                },
            )
            .await
            .unwrap();

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        let err = fx
            .engine
            .place_order(update.order_id, AddressChoice::Address(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::AddressNotFound));
    }

    #[tokio::test]
    async fn placement_is_all_or_nothing_over_stock() {
        let fx = setup().await;
        let rice = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let dal = seed_product(&fx, "Dal", Decimal::new(1200, 2), 10).await;
        let address = seed_address(&fx, false).await;

        fx.engine.add_to_cart(fx.user_id, rice.id, 4).await.unwrap();
        let update = fx.engine.add_to_cart(fx.user_id, dal.id, 8).await.unwrap();

        // Stock of dal drops under the carted quantity before placement.
        fx.catalog
            .update_product(
                fx.admin_id,
                dal.id,
                ProductPatch {
                    stock_count: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = fx
            .engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { product_id } if product_id == dal.id));

        // Neither product's stock moved and the order is still a cart.
        assert_eq!(fx.catalog.get_product(rice.id).await.unwrap().stock_count, 10);
        assert_eq!(fx.catalog.get_product(dal.id).await.unwrap().stock_count, 2);
        assert!(fx.engine.cart_items(fx.user_id).await.is_ok());
    }

    #[tokio::test]
    async fn placement_requires_in_cart_status() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let address = seed_address(&fx, false).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        fx.engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap();

        let err = fx
            .engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotInCart));
    }

    #[tokio::test]
    async fn cancelling_a_cart_leaves_stock_alone() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 4).await.unwrap();
        fx.engine.cancel_order(update.order_id).await.unwrap();

        assert_eq!(fx.catalog.get_product(product.id).await.unwrap().stock_count, 10);
        // The cart is gone; a new add opens a fresh order.
        let next = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        assert_ne!(next.order_id, update.order_id);
    }

    #[tokio::test]
    async fn cancelling_a_placed_order_restores_stock() {
        let fx = setup().await;
        let rice = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let dal = seed_product(&fx, "Dal", Decimal::new(1200, 2), 6).await;
        let address = seed_address(&fx, false).await;

        fx.engine.add_to_cart(fx.user_id, rice.id, 7).await.unwrap();
        let update = fx.engine.add_to_cart(fx.user_id, dal.id, 2).await.unwrap();
        fx.engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap();
        assert_eq!(fx.catalog.get_product(rice.id).await.unwrap().stock_count, 3);
        assert_eq!(fx.catalog.get_product(dal.id).await.unwrap().stock_count, 4);

        fx.engine.cancel_order(update.order_id).await.unwrap();
        assert_eq!(fx.catalog.get_product(rice.id).await.unwrap().stock_count, 10);
        assert_eq!(fx.catalog.get_product(dal.id).await.unwrap().stock_count, 6);
    }

    #[tokio::test]
    async fn cancelled_and_delivered_orders_cannot_be_cancelled() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let address = seed_address(&fx, false).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        fx.engine.cancel_order(update.order_id).await.unwrap();
        assert!(matches!(
            fx.engine.cancel_order(update.order_id).await.unwrap_err(),
            OrderError::CannotCancel
        ));

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        fx.engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap();
        fx.engine.mark_delivered(update.order_id).await.unwrap();
        assert!(matches!(
            fx.engine.cancel_order(update.order_id).await.unwrap_err(),
            OrderError::CannotCancel
        ));
    }

    #[tokio::test]
    async fn delivery_requires_a_placed_order() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 1).await.unwrap();
        assert!(matches!(
            fx.engine.mark_delivered(update.order_id).await.unwrap_err(),
            OrderError::NotPlaced
        ));
    }

    #[tokio::test]
    async fn cart_listing_distinguishes_its_failures() {
        let fx = setup().await;

        assert!(matches!(
            fx.engine.cart_items(999).await.unwrap_err(),
            OrderError::UserNotFound
        ));
        assert!(matches!(
            fx.engine.cart_items(fx.user_id).await.unwrap_err(),
            OrderError::EmptyCart
        ));
    }

    #[tokio::test]
    async fn product_report_is_admin_only_and_skips_carts() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let address = seed_address(&fx, false).await;

        let err = fx
            .engine
            .orders_for_product(fx.user_id, product.id)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::PermissionDenied));

        // A carted order has no order date and must not show up.
        fx.engine.add_to_cart(fx.user_id, product.id, 2).await.unwrap();
        let report = fx
            .engine
            .orders_for_product(fx.admin_id, product.id)
            .await
            .unwrap();
        assert!(report.is_empty());

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 3).await.unwrap();
        fx.engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap();
        let report = fx
            .engine
            .orders_for_product(fx.admin_id, product.id)
            .await
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].qty, 3);
    }

    #[tokio::test]
    async fn lifecycle_events_are_broadcast() {
        let fx = setup().await;
        let product = seed_product(&fx, "Rice", Decimal::new(500, 2), 10).await;
        let address = seed_address(&fx, false).await;
        let mut events = fx.engine.subscribe();

        let update = fx.engine.add_to_cart(fx.user_id, product.id, 2).await.unwrap();
        fx.engine
            .place_order(update.order_id, AddressChoice::Address(address.id))
            .await
            .unwrap();
        fx.engine.cancel_order(update.order_id).await.unwrap();

        match events.next().await {
            Some(Ok(OrderEvent::CartUpdated { order_id, user_id, total_amount })) => {
                assert_eq!(order_id, update.order_id);
                assert_eq!(user_id, fx.user_id);
                assert_eq!(total_amount, Decimal::new(1000, 2));
            }
            other => panic!("expected CartUpdated, got {other:?}"),
        }
        assert_eq!(
            events.next().await.unwrap().unwrap(),
            OrderEvent::Placed { order_id: update.order_id }
        );
        assert_eq!(
            events.next().await.unwrap().unwrap(),
            OrderEvent::Cancelled { order_id: update.order_id }
        );
    }
}
