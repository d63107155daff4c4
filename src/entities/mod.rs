pub mod addresses;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod product_categories;
pub mod products;
pub mod users;
