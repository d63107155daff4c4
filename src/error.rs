use thiserror::Error;

/// Failures raised by a storage backend. Anything that is not a plain
/// database error is mapped into [`OrderError`] by the caller before it
/// crosses the service boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// The error taxonomy every core operation returns. Callers branch on the
/// variant; the HTTP layer turns it into a `{success: false, message}` body,
/// so no storage failure ever crosses the boundary unwrapped.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("User not found.")]
    UserNotFound,
    #[error("No order found.")]
    OrderNotFound,
    #[error("Product not found.")]
    ProductNotFound,
    #[error("Please enter a correct address ID.")]
    AddressNotFound,
    #[error("No default address found for the user.")]
    NoDefaultAddress,
    #[error("Category not found.")]
    CategoryNotFound,
    #[error("Your cart is empty.")]
    EmptyCart,

    #[error("Selected product quantity out of stock. Select a lesser quantity.")]
    OutOfStock,
    #[error("Quantity of product {product_id} in your order exceeds available stock. \
             Please select lesser quantity and try again")]
    InsufficientStock { product_id: i32 },
    #[error("Only an order in the cart can be placed.")]
    NotInCart,
    #[error("Order cannot be cancelled.")]
    CannotCancel,
    #[error("Only a placed order can be marked delivered.")]
    NotPlaced,
    #[error("Please enter an address or choose the default address to proceed.")]
    AddressRequired,

    #[error("You do not have permission for this activity.")]
    PermissionDenied,

    #[error("{0}")]
    Duplicate(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Token verification failures from the auth collaborator.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token verification failed.")]
    InvalidToken,
}
